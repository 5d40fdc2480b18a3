mod fixtures;

use license_crypto::{mint, verify, PrivateKey, PublicKey};
use license_types::{FabricError, TokenPayload};

fn sample_payload() -> TokenPayload {
    TokenPayload {
        subject: "Acme Robotics".to_string(),
        issued_time_ms: None,
        expiry_time_ms: 4_102_444_800_000,
        max_machine_count: 5,
        modules: vec!["core".to_string(), "reporting".to_string()],
        description: Some("annual seat license".to_string()),
    }
}

#[test]
fn mint_then_verify_round_trips_the_payload() {
    let private = PrivateKey::from_pem(fixtures::PRIVATE_KEY_PKCS8_PEM).unwrap();
    let public = PublicKey::from_pem(fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();

    let payload = sample_payload();
    let token = mint(&payload, Some(&private), 1_700_000_000_000).unwrap();
    assert!(token.contains('.'));

    let recovered = verify(&token, &public).unwrap();
    assert_eq!(recovered.subject, payload.subject);
    assert_eq!(recovered.issued_time_ms, Some(1_700_000_000_000));
    assert_eq!(recovered.expiry_time_ms, payload.expiry_time_ms);
    assert_eq!(recovered.modules, payload.modules);
}

#[test]
fn mint_defaults_issued_time_only_when_absent() {
    let private = PrivateKey::from_pem(fixtures::PRIVATE_KEY_PKCS8_PEM).unwrap();
    let public = PublicKey::from_pem(fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();

    let mut payload = sample_payload();
    payload.issued_time_ms = Some(1_000);
    let token = mint(&payload, Some(&private), 9_999_999).unwrap();
    let recovered = verify(&token, &public).unwrap();
    assert_eq!(recovered.issued_time_ms, Some(1_000));
}

#[test]
fn pkcs1_keys_parse_and_interop_with_pkcs8_or_spki() {
    let private_pkcs1 = PrivateKey::from_pem(fixtures::PRIVATE_KEY_PKCS1_PEM).unwrap();
    let public_pkcs1 = PublicKey::from_pem(fixtures::PUBLIC_KEY_PKCS1_PEM).unwrap();

    let payload = sample_payload();
    let token = mint(&payload, Some(&private_pkcs1), 1_700_000_000_000).unwrap();
    let recovered = verify(&token, &public_pkcs1).unwrap();
    assert_eq!(recovered.subject, payload.subject);

    let public_spki = PublicKey::from_pem(fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    verify(&token, &public_spki).unwrap();
}

#[test]
fn mint_without_a_private_key_fails_config() {
    let payload = sample_payload();
    let err = mint(&payload, None, 0).unwrap_err();
    assert!(matches!(err, FabricError::Config(_)));
}

#[test]
fn mint_rejects_invalid_payload_before_signing() {
    let private = PrivateKey::from_pem(fixtures::PRIVATE_KEY_PKCS8_PEM).unwrap();
    let mut payload = sample_payload();
    payload.subject = "   ".to_string();
    let err = mint(&payload, Some(&private), 0).unwrap_err();
    assert!(matches!(err, FabricError::Format(_)));
}

#[test]
fn verify_rejects_token_with_no_separator() {
    let public = PublicKey::from_pem(fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    let err = verify("not-a-token-at-all", &public).unwrap_err();
    assert!(matches!(err, FabricError::Format(_)));
}

#[test]
fn verify_rejects_invalid_base64_segments() {
    let public = PublicKey::from_pem(fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    let err = verify("not base64!.also not base64!", &public).unwrap_err();
    assert!(matches!(err, FabricError::Format(_)));
}

#[test]
fn verify_rejects_a_token_signed_by_a_different_key() {
    let private = PrivateKey::from_pem(fixtures::PRIVATE_KEY_PKCS8_PEM).unwrap();
    let other_public = PublicKey::from_pem(fixtures::OTHER_PUBLIC_KEY_PEM).unwrap();

    let token = mint(&sample_payload(), Some(&private), 0).unwrap();
    let err = verify(&token, &other_public).unwrap_err();
    assert!(matches!(err, FabricError::Tampered(_)));
}

#[test]
fn verify_rejects_a_flipped_payload_byte() {
    let private = PrivateKey::from_pem(fixtures::PRIVATE_KEY_PKCS8_PEM).unwrap();
    let public = PublicKey::from_pem(fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();

    let token = mint(&sample_payload(), Some(&private), 0).unwrap();
    let (payload_part, sig_part) = token.split_once('.').unwrap();
    let mut mangled = payload_part.to_string();
    let last = mangled.pop().unwrap();
    let replacement = if last == 'A' { 'B' } else { 'A' };
    mangled.push(replacement);
    let tampered_token = format!("{mangled}.{sig_part}");

    let err = verify(&tampered_token, &public).unwrap_err();
    assert!(matches!(
        err,
        FabricError::Tampered(_) | FabricError::Format(_)
    ));
}

#[test]
fn verify_rejects_malformed_json_payload_with_a_valid_signature() {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL;
    use base64::Engine;
    use rsa::pkcs1v15::SigningKey;
    use rsa::pkcs8::DecodePrivateKey;
    use rsa::signature::Signer;
    use rsa::RsaPrivateKey;
    use sha2::Sha256;

    let public = PublicKey::from_pem(fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();

    // Sign bytes that are not valid JSON at all, to isolate the parse-failure path
    // (mint() always serializes a TokenPayload, so this bypasses it deliberately).
    let raw_key = RsaPrivateKey::from_pkcs8_pem(fixtures::PRIVATE_KEY_PKCS8_PEM).unwrap();
    let garbage = b"not json".to_vec();
    let signing_key = SigningKey::<Sha256>::new(raw_key);
    let signature = signing_key.sign(&garbage);

    let token = format!(
        "{}.{}",
        BASE64_URL.encode(&garbage),
        BASE64_URL.encode(signature.to_bytes())
    );

    let err = verify(&token, &public).unwrap_err();
    assert!(matches!(err, FabricError::Format(_)));
}
