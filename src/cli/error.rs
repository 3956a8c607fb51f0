// Error handling utilities for consistent error messages and exit codes

use std::process;
use crate::models::NewTag;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

fn validate_id(id_str: &str, what: &str) -> Result<i64, String> {
    id_str.parse::<i64>()
        .map_err(|_| format!("Invalid {} ID: '{}'. {} ID must be a number.", what.to_lowercase(), id_str, what))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid {} ID: {}. {} ID must be positive.", what.to_lowercase(), id, what))
            }
        })
}

/// Validate that a task ID is valid (positive integer)
pub fn validate_task_id(id_str: &str) -> Result<i64, String> {
    validate_id(id_str, "Task")
}

/// Validate that a timer ID is valid (positive integer)
pub fn validate_timer_id(id_str: &str) -> Result<i64, String> {
    validate_id(id_str, "Timer")
}

/// Parse repeated `--tag type:value` arguments
pub fn parse_tag_args(specs: &[String]) -> Result<Vec<NewTag>, String> {
    specs.iter()
        .map(|spec| NewTag::parse(spec).map_err(|e| e.to_string()))
        .collect()
}
