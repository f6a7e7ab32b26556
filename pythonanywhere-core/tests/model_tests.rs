//! Integration tests for core model types.

use pythonanywhere_core::{ApiResponse, Region, Task, TaskInterval};

#[test]
fn test_task_list_deserialization() {
    let tasks: Vec<Task> = serde_json::from_str(
        r#"[{"id": 1, "command": "echo 1", "description": "d",
             "hour": 7, "minute": 0, "enabled": true, "interval": "daily"},
            {"id": 2, "command": "echo 2", "description": "e",
             "hour": 0, "minute": 30, "enabled": false, "interval": "hourly"}]"#,
    )
    .unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].interval, TaskInterval::Hourly);
    assert!(!tasks[1].enabled);
}

#[test]
fn test_response_error_flag_matches_constructor() {
    assert!(!ApiResponse::ok_empty(204).error);
    assert!(ApiResponse::fail(403, "forbidden").error);
    assert!(ApiResponse::transport_failure("dns failure").error);
}

#[test]
fn test_region_serde_form_matches_from_str() {
    let region: Region = serde_json::from_str("\"eu\"").unwrap();
    assert_eq!(region, "eu".parse().unwrap());
}
