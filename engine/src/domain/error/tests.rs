//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::forbidden("nope"), ErrorCode::Forbidden)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::invalid_transition("no"), ErrorCode::InvalidTransition)]
#[case(Error::conflict("taken"), ErrorCode::Conflict)]
#[case(Error::concurrency_conflict("stale"), ErrorCode::ConcurrencyConflict)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] error: Error, #[case] code: ErrorCode) {
    assert_eq!(error.code(), code);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn new_falls_back_to_code_name_for_blank_messages() {
    let error = Error::new(ErrorCode::Conflict, "");
    assert_eq!(error.message(), "Conflict");
}

#[rstest]
fn with_reason_merges_into_object_details() {
    let error = Error::conflict("full")
        .with_details(json!({ "maxParticipants": 2 }))
        .with_reason("challenge_full");

    assert_eq!(error.reason(), Some("challenge_full"));
    assert_eq!(
        error.details(),
        Some(&json!({ "maxParticipants": 2, "reason": "challenge_full" }))
    );
}

#[rstest]
fn with_reason_wraps_non_object_details() {
    let error = Error::conflict("full")
        .with_details(json!(["a"]))
        .with_reason("challenge_full");

    assert_eq!(
        error.details(),
        Some(&json!({ "context": ["a"], "reason": "challenge_full" }))
    );
}

#[rstest]
fn serde_round_trip_preserves_details() {
    let error = Error::not_found("missing").with_reason("goal_not_found");
    let value = serde_json::to_value(&error).expect("serialize error");
    assert_eq!(value["code"], json!("not_found"));

    let restored: Error = serde_json::from_value(value).expect("deserialize error");
    assert_eq!(restored, error);
}

#[rstest]
fn deserialising_blank_message_fails() {
    let result = serde_json::from_value::<Error>(json!({ "code": "conflict", "message": " " }));
    assert!(result.is_err());
}
