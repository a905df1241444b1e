//! Unit tests for error module.

use super::*;

// ============================================================================
// ErrorResponse Tests
// ============================================================================

#[test]
fn test_error_response_serialization() {
    let response = ErrorResponse {
        error: "Something went wrong".to_string(),
        code: "INTERNAL_ERROR".to_string(),
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"error\":\"Something went wrong\""));
    assert!(json.contains("\"code\":\"INTERNAL_ERROR\""));
}

// ============================================================================
// ApiError Display Tests
// ============================================================================

#[test]
fn test_api_error_format_display() {
    let error = ApiError::Format("invalid option ticker 'XYZ'".to_string());
    assert_eq!(
        format!("{}", error),
        "Invalid format: invalid option ticker 'XYZ'"
    );
}

#[test]
fn test_api_error_range_invalid_display() {
    let error = ApiError::RangeInvalid("start date must be before end date".to_string());
    assert_eq!(
        format!("{}", error),
        "Invalid date range: start date must be before end date"
    );
}

#[test]
fn test_api_error_range_too_large_display() {
    let error = ApiError::RangeTooLarge("maximum range is 30 minutes".to_string());
    assert_eq!(
        format!("{}", error),
        "Date range too large: maximum range is 30 minutes"
    );
}

#[test]
fn test_api_error_no_solution_display() {
    let error = ApiError::NoSolution("time".to_string());
    assert_eq!(format!("{}", error), "No solution found for time");
}

#[test]
fn test_api_error_provider_display() {
    let error = ApiError::Provider("gateway returned 503: maintenance".to_string());
    assert_eq!(
        format!("{}", error),
        "Provider error: gateway returned 503: maintenance"
    );
}

#[test]
fn test_api_error_not_found_display() {
    let error = ApiError::NotFound("unknown route".to_string());
    assert_eq!(format!("{}", error), "Not found: unknown route");
}

#[test]
fn test_api_error_internal_display() {
    let error = ApiError::Internal("state poisoned".to_string());
    assert_eq!(format!("{}", error), "Internal server error: state poisoned");
}

// ============================================================================
// ApiError IntoResponse Tests
// ============================================================================

#[test]
fn test_api_error_format_into_response() {
    let error = ApiError::Format("bad ticker".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_api_error_range_invalid_into_response() {
    let error = ApiError::RangeInvalid("reversed".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_api_error_range_too_large_into_response() {
    let error = ApiError::RangeTooLarge("too many buckets".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_api_error_no_solution_into_response() {
    let error = ApiError::NoSolution("strike".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_api_error_provider_into_response() {
    let error = ApiError::Provider("gateway unreachable".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn test_api_error_not_found_into_response() {
    let error = ApiError::NotFound("unknown route".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_api_error_internal_into_response() {
    let error = ApiError::Internal("unexpected".to_string());
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Conversion Tests
// ============================================================================

#[test]
fn test_provider_error_converts_to_api_error() {
    let provider_err = ProviderError::Status {
        status: 503,
        message: "maintenance".to_string(),
    };
    let error: ApiError = provider_err.into();
    assert!(matches!(error, ApiError::Provider(_)));
    assert_eq!(
        format!("{}", error),
        "Provider error: gateway returned 503: maintenance"
    );
}

// ============================================================================
// ApiError Debug Tests
// ============================================================================

#[test]
fn test_api_error_debug() {
    let error = ApiError::Format("bad flag".to_string());
    let debug = format!("{:?}", error);
    assert!(debug.contains("Format"));
    assert!(debug.contains("bad flag"));
}
