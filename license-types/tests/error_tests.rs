use license_types::{FabricError, UnauthorizedReason};

#[test]
fn status_codes_match_taxonomy() {
    assert_eq!(FabricError::Format("x".into()).http_status(), 400);
    assert_eq!(FabricError::Tampered("x".into()).http_status(), 400);
    assert_eq!(FabricError::Expired.http_status(), 401);
    assert_eq!(FabricError::NotYetValid.http_status(), 401);
    assert_eq!(
        FabricError::Unauthorized(UnauthorizedReason::BadSignature).http_status(),
        401
    );
    assert_eq!(
        FabricError::Capacity { max: 2, current: 2 }.http_status(),
        403
    );
    assert_eq!(FabricError::NotFound("node-1".into()).http_status(), 404);
    assert_eq!(FabricError::Config("no key".into()).http_status(), 500);
    assert_eq!(FabricError::Transport("timeout".into()).http_status(), 502);
    assert_eq!(FabricError::Internal("oops".into()).http_status(), 500);
}

#[test]
fn unauthorized_reason_display() {
    assert_eq!(UnauthorizedReason::BadSignature.to_string(), "BAD_SIGNATURE");
    assert_eq!(UnauthorizedReason::Expired.to_string(), "EXPIRED");
    assert_eq!(UnauthorizedReason::NotYetValid.to_string(), "NOT_YET_VALID");
    assert_eq!(UnauthorizedReason::Format.to_string(), "FORMAT");
}
