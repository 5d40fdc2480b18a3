mod fixtures;

use base64::engine::general_purpose::STANDARD as BASE64_STD;
use base64::Engine;
use license_crypto::{cache_open, cache_seal};
use license_types::FabricError;
use proptest::prelude::*;

#[test]
fn seal_then_open_round_trips_the_plaintext() {
    let plaintext = br#"{"nodeId":"node-1","status":"VALID_ONLINE"}"#;
    let blob = cache_seal(plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    let opened = cache_open(&blob, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    assert_eq!(opened, plaintext);
}

#[test]
fn seal_output_is_not_the_plaintext_in_disguise() {
    let plaintext = b"super secret cached license state";
    let blob = cache_seal(plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    assert!(!blob.contains("super secret"));
}

#[test]
fn seal_is_randomized_across_calls() {
    let plaintext = b"identical payload";
    let first = cache_seal(plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    let second = cache_seal(plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    assert_ne!(first, second);
}

#[test]
fn open_fails_with_the_wrong_passphrase() {
    let plaintext = b"agent state blob";
    let blob = cache_seal(plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    let err = cache_open(&blob, fixtures::OTHER_PUBLIC_KEY_PEM).unwrap_err();
    assert!(matches!(err, FabricError::Tampered(_)));
}

#[test]
fn open_fails_on_truncated_ciphertext() {
    let plaintext = b"agent state blob";
    let blob = cache_seal(plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    let truncated = &blob[..blob.len() - 8];
    let err = cache_open(truncated, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap_err();
    assert!(matches!(err, FabricError::Tampered(_)));
}

#[test]
fn open_fails_on_non_base64_input() {
    let err = cache_open("not valid base64 at all!!", fixtures::PUBLIC_KEY_SPKI_PEM).unwrap_err();
    assert!(matches!(err, FabricError::Tampered(_)));
}

#[test]
fn open_fails_on_a_blob_shorter_than_the_iv() {
    let err = cache_open("YQ==", fixtures::PUBLIC_KEY_SPKI_PEM).unwrap_err();
    assert!(matches!(err, FabricError::Tampered(_)));
}

#[test]
fn round_trips_empty_plaintext() {
    let blob = cache_seal(b"", fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    let opened = cache_open(&blob, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
    assert!(opened.is_empty());
}

proptest! {
    #[test]
    fn seal_then_open_round_trips_arbitrary_plaintext(
        plaintext in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let blob = cache_seal(&plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
        let opened = cache_open(&blob, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
        prop_assert_eq!(opened, plaintext);
    }

    #[test]
    fn any_single_byte_ciphertext_mutation_yields_tampered(
        plaintext in proptest::collection::vec(any::<u8>(), 1..128),
        byte_index in 0usize..2048,
        flip_mask in 1u8..=u8::MAX,
    ) {
        let blob = cache_seal(&plaintext, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap();
        let mut wire = BASE64_STD.decode(&blob).unwrap();
        let index = byte_index % wire.len();
        wire[index] ^= flip_mask;
        let mutated = BASE64_STD.encode(&wire);

        let err = cache_open(&mutated, fixtures::PUBLIC_KEY_SPKI_PEM).unwrap_err();
        prop_assert!(matches!(err, FabricError::Tampered(_)));
    }
}
