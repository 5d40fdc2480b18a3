use license_crypto::{mint, PrivateKey, PublicKey};
use license_types::TokenPayload;

use super::{PRIVATE_KEY_PKCS8_PEM, PUBLIC_KEY_SPKI_PEM};

pub fn keys() -> (PrivateKey, PublicKey) {
    (
        PrivateKey::from_pem(PRIVATE_KEY_PKCS8_PEM).unwrap(),
        PublicKey::from_pem(PUBLIC_KEY_SPKI_PEM).unwrap(),
    )
}

pub fn payload(expiry_offset_ms: i64) -> TokenPayload {
    let now = chrono::Utc::now().timestamp_millis();
    TokenPayload {
        subject: "Acme".to_string(),
        issued_time_ms: None,
        expiry_time_ms: now + expiry_offset_ms,
        max_machine_count: 5,
        modules: vec!["core".to_string()],
        description: None,
    }
}

pub fn code(expiry_offset_ms: i64) -> (String, PublicKey) {
    let (private, public) = keys();
    let now = chrono::Utc::now().timestamp_millis();
    let token = mint(&payload(expiry_offset_ms), Some(&private), now).unwrap();
    (token, public)
}
