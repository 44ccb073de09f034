//! End-to-end artifact verification.
//!
//! Covers on-disk artifacts, key material arriving via each channel,
//! file-handle release, and the interplay of mode and missing material.

use std::fs;
use std::path::PathBuf;

use ed25519_dalek::SigningKey;
use pkcs8::{EncodePublicKey, LineEnding};
use tempfile::TempDir;

use hallmark_core::sign::{sign_data, sign_file};
use hallmark_core::{ArtifactVerifier, KeyError, KeySource, SecurityMode, ValidationResult};

fn generate_keypair() -> SigningKey {
    SigningKey::generate(&mut rand::thread_rng())
}

fn public_key_pem(key: &SigningKey) -> String {
    key.verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

fn write_artifact(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Verifier whose key arrives through the embedded-resource channel.
fn resource_verifier(mode: SecurityMode, key: &SigningKey) -> ArtifactVerifier {
    let source = KeySource::new().with_resource(
        "installer.resources.hallmark_ed25519.pub",
        public_key_pem(key),
    );
    ArtifactVerifier::new(mode, &source).unwrap()
}

#[test]
fn test_file_verification_roundtrip() {
    let signing_key = generate_keypair();
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "update-4.2.0.tar.gz", b"installer image bytes");

    let signature = sign_file(&signing_key, &artifact).unwrap();
    let verifier = resource_verifier(SecurityMode::UseIfPossible, &signing_key);

    let result = verifier.verify_file(Some(&signature), &artifact).unwrap();
    assert_eq!(result, ValidationResult::Valid);
}

#[test]
fn test_file_handle_released_after_success_and_failure() {
    let signing_key = generate_keypair();
    let dir = tempfile::tempdir().unwrap();
    let verifier = resource_verifier(SecurityMode::Strict, &signing_key);

    let artifact = write_artifact(&dir, "a.bin", b"payload");
    let signature = sign_file(&signing_key, &artifact).unwrap();
    assert_eq!(
        verifier.verify_file(Some(&signature), &artifact).unwrap(),
        ValidationResult::Valid
    );
    fs::remove_file(&artifact).unwrap();

    let artifact = write_artifact(&dir, "b.bin", b"tampered payload");
    assert_eq!(
        verifier.verify_file(Some(&signature), &artifact).unwrap(),
        ValidationResult::Invalid
    );
    fs::remove_file(&artifact).unwrap();
}

#[test]
fn test_on_disk_tampering_detected() {
    let signing_key = generate_keypair();
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "update.bin", b"original content");

    let signature = sign_file(&signing_key, &artifact).unwrap();
    fs::write(&artifact, b"originaX content").unwrap();

    let verifier = resource_verifier(SecurityMode::Strict, &signing_key);
    let result = verifier.verify_file(Some(&signature), &artifact).unwrap();
    assert_eq!(result, ValidationResult::Invalid);
}

#[test]
fn test_explicit_key_beats_colliding_key_file() {
    let explicit_key = generate_keypair();
    let on_disk_key = generate_keypair();

    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("hallmark_ed25519.pub");
    fs::write(&key_path, public_key_pem(&on_disk_key)).unwrap();

    let source = KeySource::new()
        .with_key_name(key_path.to_str().unwrap())
        .with_explicit(public_key_pem(&explicit_key));
    let verifier = ArtifactVerifier::new(SecurityMode::Strict, &source).unwrap();
    assert!(verifier.key_available());

    // Signatures from the explicit key verify; the colliding file is unused.
    let data = b"artifact";
    let signature = sign_data(&explicit_key, data);
    assert_eq!(
        verifier.verify(Some(&signature), data).unwrap(),
        ValidationResult::Valid
    );

    let from_disk = sign_data(&on_disk_key, data);
    assert_eq!(
        verifier.verify(Some(&from_disk), data).unwrap(),
        ValidationResult::Invalid
    );
}

#[test]
fn test_corrupt_key_file_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("hallmark_ed25519.pub");
    fs::write(&key_path, "definitely not key material").unwrap();

    let source = KeySource::new().with_key_name(key_path.to_str().unwrap());
    let result = ArtifactVerifier::new(SecurityMode::UseIfPossible, &source);
    assert!(matches!(result, Err(KeyError::InvalidKey { .. })));
}

#[test]
fn test_lenient_fallback_is_callers_choice() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("hallmark_ed25519.pub");
    fs::write(&key_path, "definitely not key material").unwrap();

    let source = KeySource::new().with_key_name(key_path.to_str().unwrap());
    let verifier = ArtifactVerifier::new(SecurityMode::UseIfPossible, &source)
        .unwrap_or_else(|_| ArtifactVerifier::unkeyed(SecurityMode::UseIfPossible));

    assert!(!verifier.key_available());
    assert_eq!(
        verifier.verify(None, b"data").unwrap(),
        ValidationResult::Unchecked
    );
}

#[test]
fn test_no_key_configured_degrades_per_mode() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent.pub");
    let source = KeySource::new().with_key_name(absent.to_str().unwrap());

    let lenient = ArtifactVerifier::new(SecurityMode::UseIfPossible, &source).unwrap();
    assert!(!lenient.key_available());
    assert_eq!(
        lenient.verify(None, b"data").unwrap(),
        ValidationResult::Unchecked
    );

    let strict = ArtifactVerifier::new(SecurityMode::Strict, &source).unwrap();
    assert_eq!(
        strict.verify(None, b"data").unwrap(),
        ValidationResult::Invalid
    );
}

#[test]
fn test_unsafe_mode_end_to_end() {
    let signing_key = generate_keypair();
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "update.bin", b"payload");
    let signature = sign_file(&signing_key, &artifact).unwrap();

    let verifier = resource_verifier(SecurityMode::Unsafe, &signing_key);

    // Nothing required...
    assert!(!verifier.signature_required());
    assert_eq!(
        verifier.verify_file(None, &artifact).unwrap(),
        ValidationResult::Unchecked
    );

    // ...but offered material is still checked for real.
    assert_eq!(
        verifier.verify_file(Some(&signature), &artifact).unwrap(),
        ValidationResult::Valid
    );
    fs::write(&artifact, b"tampered").unwrap();
    assert_eq!(
        verifier.verify_file(Some(&signature), &artifact).unwrap(),
        ValidationResult::Invalid
    );
}

#[test]
fn test_unsigned_artifact_per_mode_with_key() {
    let signing_key = generate_keypair();
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "update.bin", b"payload");

    for (mode, expected) in [
        (SecurityMode::UseIfPossible, ValidationResult::Invalid),
        (SecurityMode::Strict, ValidationResult::Invalid),
        (SecurityMode::Unsafe, ValidationResult::Unchecked),
    ] {
        let verifier = resource_verifier(mode, &signing_key);
        assert_eq!(
            verifier.verify_file(None, &artifact).unwrap(),
            expected,
            "mode {mode}"
        );
    }
}

#[test]
fn test_string_artifact_roundtrip() {
    let signing_key = generate_keypair();
    let notes = "release notes for 4.2.0";
    let signature = sign_data(&signing_key, notes.as_bytes());

    let verifier = resource_verifier(SecurityMode::Strict, &signing_key);
    assert_eq!(
        verifier.verify_str(Some(&signature), notes).unwrap(),
        ValidationResult::Valid
    );
    assert_eq!(
        verifier.verify_str(Some(&signature), "edited notes").unwrap(),
        ValidationResult::Invalid
    );
}

#[test]
fn test_shared_verifier_across_threads() {
    let signing_key = generate_keypair();
    let verifier = resource_verifier(SecurityMode::Strict, &signing_key);

    let data = b"parallel artifact".to_vec();
    let signature = sign_data(&signing_key, &data);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let result = verifier.verify(Some(&signature), &data).unwrap();
                assert_eq!(result, ValidationResult::Valid);
            });
        }
    });
}
