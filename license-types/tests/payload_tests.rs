use license_types::TokenPayload;

fn sample() -> TokenPayload {
    TokenPayload {
        subject: "Acme Corp".to_string(),
        issued_time_ms: Some(1_000),
        expiry_time_ms: 2_000,
        max_machine_count: 2,
        modules: vec!["core".to_string()],
        description: None,
    }
}

#[test]
fn rejects_empty_subject() {
    let mut payload = sample();
    payload.subject = "   ".to_string();
    assert!(payload.validate().is_err());
}

#[test]
fn rejects_zero_max_machine_count() {
    let mut payload = sample();
    payload.max_machine_count = 0;
    assert!(payload.validate().is_err());
}

#[test]
fn accepts_well_formed_payload() {
    assert!(sample().validate().is_ok());
}

#[test]
fn expiry_boundary_is_inclusive() {
    let payload = sample();
    assert!(!payload.is_expired_at(2_000));
    assert!(payload.is_expired_at(2_001));
}

#[test]
fn not_yet_valid_before_issued_time() {
    let payload = sample();
    assert!(payload.is_not_yet_valid_at(999));
    assert!(!payload.is_not_yet_valid_at(1_000));
}

#[test]
fn missing_issued_time_is_never_not_yet_valid() {
    let mut payload = sample();
    payload.issued_time_ms = None;
    assert!(!payload.is_not_yet_valid_at(0));
}

#[test]
fn wire_field_names_match_normative_names() {
    let json = serde_json::to_value(sample()).unwrap();
    let obj = json.as_object().unwrap();
    assert!(obj.contains_key("subject"));
    assert!(obj.contains_key("issuedTime"));
    assert!(obj.contains_key("expiryTime"));
    assert!(obj.contains_key("maxMachineCount"));
    assert!(obj.contains_key("modules"));
    assert!(!obj.contains_key("description"));
}
