//! Interactive console models.

use serde::{Deserialize, Serialize};

/// Parameters for creating a console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSpec {
    /// Interpreter or shell to run, e.g. `"bash"` or `"python3.10"`.
    pub executable: String,
    /// Arguments passed to the executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// Directory the console starts in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
}

impl ConsoleSpec {
    /// A bash console with no arguments, the most common case.
    pub fn bash() -> Self {
        Self {
            executable: "bash".to_string(),
            arguments: None,
            working_directory: None,
        }
    }
}

/// A console as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Console {
    /// Server-assigned identifier.
    pub id: u64,
    /// Owning user.
    #[serde(default)]
    pub user: Option<String>,
    /// Interpreter or shell the console runs.
    #[serde(default)]
    pub executable: Option<String>,
    /// Arguments the console was started with.
    #[serde(default)]
    pub arguments: Option<String>,
    /// Working directory.
    #[serde(default)]
    pub working_directory: Option<String>,
    /// Path of the console's interactive frame page.
    #[serde(default)]
    pub console_frame_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_omits_absent_fields() {
        let value = serde_json::to_value(ConsoleSpec::bash()).unwrap();
        assert_eq!(value["executable"], "bash");
        assert!(value.get("arguments").is_none());
        assert!(value.get("working_directory").is_none());
    }

    #[test]
    fn test_console_from_server_payload() {
        let console: Console = serde_json::from_str(
            r#"{"id": 1234, "user": "sam", "executable": "bash",
                "arguments": "", "working_directory": null,
                "console_frame_url": "/user/sam/consoles/1234/frame/"}"#,
        )
        .unwrap();
        assert_eq!(console.id, 1234);
        assert_eq!(console.user.as_deref(), Some("sam"));
        assert!(console.working_directory.is_none());
    }
}
