//! Signature generation for release tooling.
//!
//! Produces the base64 transport form the verifier consumes. Key
//! generation is not provided; release pipelines bring their own PKCS#8
//! keys.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey};

/// Sign raw artifact bytes, returning the base64 signature.
pub fn sign_data(signing_key: &SigningKey, data: &[u8]) -> String {
    let signature = signing_key.sign(data);
    BASE64.encode(signature.to_bytes())
}

/// Sign the contents of a file.
pub fn sign_file(signing_key: &SigningKey, path: &Path) -> Result<String> {
    let data =
        fs::read(path).with_context(|| format!("failed to read artifact: {}", path.display()))?;
    Ok(sign_data(signing_key, &data))
}

/// Load a signing key from a PKCS#8 PEM file.
pub fn load_signing_key_pem(path: &Path) -> Result<SigningKey> {
    use pkcs8::DecodePrivateKey;

    let pem = fs::read_to_string(path)
        .with_context(|| format!("failed to read private key: {}", path.display()))?;

    SigningKey::from_pkcs8_pem(&pem)
        .with_context(|| format!("failed to parse private key PEM: {}", path.display()))
}
