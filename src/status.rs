//! Status line label state machine.
//!
//! Maps the producer's event codes (plus the current tool name) to a
//! human-readable activity label. The mapping is a pure function of the
//! last seen (event code, tool name) pair; unknown codes yield an empty
//! label, and an empty label falls back to the idle string.

/// Label shown when no event code maps to an activity.
pub const IDLE_LABEL: &str = "Loading...";

/// Current producer activity, as reported via stream events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusState {
    /// Last event code received (may be empty).
    pub event_code: String,
    /// Last tool name received (may be empty).
    pub tool: String,
}

impl StatusState {
    pub fn set_tool(&mut self, tool: String) {
        self.tool = tool;
    }

    pub fn set_event_code(&mut self, code: String) {
        self.event_code = code;
    }

    /// Returns the activity label for the current event code.
    ///
    /// Unknown codes (including the empty string) yield an empty label.
    pub fn label(&self) -> String {
        match self.event_code.as_str() {
            "received-text" => "Writing...".to_string(),
            "requires-tool" => "Calling...".to_string(),
            "constructing-tool" => format!("Constructing info for tool {}...", self.tool),
            "block-finished" => "Processing...".to_string(),
            _ => String::new(),
        }
    }

    /// Returns the full status text for display.
    ///
    /// A non-empty label with a tool set gets the tool name appended in
    /// brackets; an empty label falls back to [`IDLE_LABEL`].
    pub fn display(&self) -> String {
        let label = self.label();
        if label.is_empty() {
            IDLE_LABEL.to_string()
        } else if self.tool.is_empty() {
            label
        } else {
            format!("{label} [{}]", self.tool)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: &str, tool: &str) -> StatusState {
        StatusState {
            event_code: code.to_string(),
            tool: tool.to_string(),
        }
    }

    #[test]
    fn test_known_codes_map_exactly() {
        assert_eq!(status("received-text", "").label(), "Writing...");
        assert_eq!(status("requires-tool", "").label(), "Calling...");
        assert_eq!(status("block-finished", "").label(), "Processing...");
        assert_eq!(
            status("constructing-tool", "calc").label(),
            "Constructing info for tool calc..."
        );
    }

    #[test]
    fn test_unknown_codes_yield_empty_label() {
        assert_eq!(status("", "").label(), "");
        assert_eq!(status("bogus", "").label(), "");
        assert_eq!(status("received-text-extra", "").label(), "");
    }

    #[test]
    fn test_empty_label_falls_back_to_idle() {
        assert_eq!(status("", "").display(), IDLE_LABEL);
        assert_eq!(status("bogus", "calc").display(), IDLE_LABEL);
    }

    #[test]
    fn test_tool_annotation_appended_when_set() {
        assert_eq!(status("received-text", "calc").display(), "Writing... [calc]");
        assert_eq!(status("received-text", "").display(), "Writing...");
        assert_eq!(
            status("constructing-tool", "calc").display(),
            "Constructing info for tool calc... [calc]"
        );
    }

    #[test]
    fn test_updates_are_independent() {
        let mut s = StatusState::default();
        s.set_event_code("requires-tool".to_string());
        assert_eq!(s.display(), "Calling...");
        s.set_tool("bash".to_string());
        assert_eq!(s.display(), "Calling... [bash]");
        s.set_event_code("done".to_string());
        assert_eq!(s.display(), IDLE_LABEL);
    }
}
