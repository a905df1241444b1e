//! Unit tests for error module.

use super::*;

#[test]
fn test_api_error_display() {
    let error = Error::Api {
        status: 400,
        message: "Invalid format: bad ticker".to_string(),
    };

    let display = format!("{}", error);
    assert!(display.contains("400"));
    assert!(display.contains("Invalid format"));
}

#[test]
fn test_not_found_error_display() {
    let error = Error::NotFound("unknown route".to_string());

    let display = format!("{}", error);
    assert!(display.contains("Not found"));
    assert!(display.contains("unknown route"));
}

#[test]
fn test_invalid_request_error_display() {
    let error = Error::InvalidRequest("missing ticker".to_string());

    let display = format!("{}", error);
    assert!(display.contains("Invalid request"));
    assert!(display.contains("missing ticker"));
}

#[test]
fn test_error_debug() {
    let error = Error::Api {
        status: 502,
        message: "Provider error".to_string(),
    };

    let debug = format!("{:?}", error);
    assert!(debug.contains("Api"));
    assert!(debug.contains("502"));
}
