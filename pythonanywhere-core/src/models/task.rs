//! Scheduled task model.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// How often a scheduled task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskInterval {
    /// Runs once a day at hour:minute.
    Daily,
    /// Runs once an hour at the given minute.
    Hourly,
}

impl Default for TaskInterval {
    fn default() -> Self {
        Self::Daily
    }
}

/// A scheduled task.
///
/// The `id` is assigned by the server on creation and is `None` for a task
/// that has not been submitted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Shell command to run.
    pub command: String,
    /// Free-form description.
    pub description: String,
    /// Hour of day, 0-23. Ignored by the server for hourly tasks.
    pub hour: u8,
    /// Minute of hour, 0-59.
    pub minute: u8,
    /// Whether the task is active.
    pub enabled: bool,
    /// Run interval.
    #[serde(default)]
    pub interval: TaskInterval,
}

impl Task {
    /// Daily task with the common defaults (enabled, daily interval).
    pub fn daily(command: impl Into<String>, description: impl Into<String>, hour: u8, minute: u8) -> Self {
        Self {
            id: None,
            command: command.into(),
            description: description.into(),
            hour,
            minute,
            enabled: true,
            interval: TaskInterval::Daily,
        }
    }

    /// Validates the schedule fields before anything is sent to the server.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.hour > 23 {
            return Err(ClientError::Parse(format!(
                "hour {} out of valid range [0, 23]",
                self.hour
            )));
        }
        if self.minute > 59 {
            return Err(ClientError::Parse(format!(
                "minute {} out of valid range [0, 59]",
                self.minute
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_constructor() {
        let task = Task::daily("echo 1", "d", 7, 0);
        assert!(task.enabled);
        assert_eq!(task.interval, TaskInterval::Daily);
        assert!(task.id.is_none());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut task = Task::daily("echo 1", "d", 24, 0);
        assert!(task.validate().is_err());

        task.hour = 7;
        task.minute = 60;
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_interval_serializes_lowercase() {
        let task = Task::daily("echo 1", "d", 7, 0);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["interval"], "daily");
        // Unsubmitted tasks never serialize a null id.
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_deserializes_server_payload() {
        let task: Task = serde_json::from_str(
            r#"{"id": 42, "command": "echo 1", "description": "d",
                "hour": 7, "minute": 0, "enabled": true, "interval": "daily"}"#,
        )
        .unwrap();
        assert_eq!(task.id, Some(42));
        assert_eq!(task.hour, 7);
    }
}
