//! Value parsers for CLI arguments

use std::fs;
use std::path::PathBuf;

/// Longest course identifier accepted anywhere in the system
const MAX_COURSE_ID_LEN: usize = 64;

/// Existing, readable regular file
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }
    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

/// 1..=100 migrations
pub fn validate_rollback_steps(steps_str: &str) -> Result<u32, String> {
    let steps: u32 = steps_str.parse().map_err(|_| {
        format!("Rollback steps must be a valid positive number, got: '{}'", steps_str)
    })?;

    match steps {
        0 => Err("Rollback steps must be greater than 0".to_string()),
        1..=100 => Ok(steps),
        _ => Err("Rollback steps cannot exceed 100".to_string()),
    }
}

/// Non-empty identifier without whitespace, at most 64 characters
pub fn validate_course_id(course_str: &str) -> Result<String, String> {
    let course = course_str.trim();

    if course.is_empty() {
        return Err("Course id cannot be empty".to_string());
    }
    if course.chars().any(char::is_whitespace) {
        return Err(format!("Course id cannot contain whitespace: '{}'", course_str));
    }
    if course.len() > MAX_COURSE_ID_LEN {
        return Err(format!(
            "Course id is too long (maximum {} characters)",
            MAX_COURSE_ID_LEN
        ));
    }
    Ok(course.to_string())
}
