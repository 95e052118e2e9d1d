use actix_web::{body::to_bytes, http::StatusCode, ResponseError};
use ground_booking_server::{
    booking::{types::BookingStatus, BookingError},
    error::AppError,
};

#[test]
fn booking_rule_violations_map_to_client_errors() {
    assert_eq!(
        AppError::from(BookingError::NoSlots).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::from(BookingError::AlreadyCompleted).status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        AppError::from(BookingError::InvalidTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Approved,
        })
        .status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        AppError::not_found("booking").status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::Conflict("slots already booked: 18:00-19:00".into()).status_code(),
        StatusCode::CONFLICT
    );
}

#[actix_rt::test]
async fn error_body_is_json_message() {
    let resp = AppError::from(BookingError::AmountMismatch {
        expected: 3000,
        received: 2500,
    })
    .error_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("3000"));
}

#[actix_rt::test]
async fn internal_errors_are_not_leaked() {
    let resp = AppError::from(anyhow::anyhow!("connection string with password")).error_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "internal server error");
}
