mod common;

use diesel::result::Error as DieselError;
use hso_store::error::ApiError;
use http::StatusCode;
use validator::ValidationErrors;

#[test]
fn test_api_error_to_status_code_mapping() {
    // Database NotFound -> 404 Not Found
    let err = ApiError::Database(DieselError::NotFound);
    let (status, _): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Database other error -> 500 Internal Server Error
    let err = ApiError::Database(DieselError::QueryBuilderError("broken".into()));
    let (status, _): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Validation error -> 400 Bad Request
    let err = ApiError::Validation(ValidationErrors::new());
    let (status, _): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // NotFound -> 404
    let err = ApiError::NotFound("Phone not found".to_string());
    let (status, msg): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg, "Phone not found");

    // Conflict -> 409
    let err = ApiError::Conflict("Phone is no longer available".to_string());
    let (status, _): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::CONFLICT);

    // Upstream -> 502 Bad Gateway
    let err = ApiError::Upstream("Payment service unavailable".to_string());
    let (status, _): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    // Auth error -> 401 Unauthorized
    let err = ApiError::Auth("Invalid email or password".to_string());
    let (status, _): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Database connection error -> 500 Internal Server Error
    let err = ApiError::DatabaseConnection("Pool timeout".to_string());
    let (status, msg): (StatusCode, String) = err.into();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(msg.contains("Database connection error"));
}

#[test]
fn test_api_error_display() {
    let err = ApiError::Auth("Unauthorized access".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Authentication error"));
    assert!(display.contains("Unauthorized access"));

    let err = ApiError::Upstream("gateway timeout".to_string());
    assert!(format!("{}", err).contains("Upstream error"));
}
