//! Trust key material and resolution.
//!
//! A trust key is resolved once, at verifier construction, from the first
//! channel that yields material: an explicit value, an embedded resource,
//! or a file on disk. Resolution is a pure function of the configured
//! source; absence and malformed material are distinct outcomes.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

use crate::error::KeyError;

/// Conventional name for the public key resource or file.
pub const DEFAULT_KEY_NAME: &str = "hallmark_ed25519.pub";

/// Compute a key fingerprint from SPKI-encoded public key bytes.
///
/// Returns `sha256:<lowercase-hex>`.
pub fn compute_key_id(spki_der: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(spki_der))
}

/// Parsed public-key material with a stable fingerprint.
#[derive(Debug, Clone)]
pub struct TrustKey {
    key: VerifyingKey,
    key_id: String,
}

impl TrustKey {
    /// Parse key material from its textual form.
    ///
    /// Accepts SPKI PEM (`-----BEGIN PUBLIC KEY-----`), base64 SPKI DER,
    /// or base64 raw Ed25519 key bytes. Whitespace inside base64 forms is
    /// tolerated.
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        let text = text.trim();

        let key = if text.starts_with("-----") {
            use pkcs8::DecodePublicKey;

            VerifyingKey::from_public_key_pem(text).map_err(|e| KeyError::InvalidKey {
                reason: format!("invalid public key PEM: {}", e),
            })?
        } else {
            let compact: String = text.split_whitespace().collect();
            let bytes = BASE64
                .decode(compact.as_bytes())
                .map_err(|e| KeyError::InvalidKey {
                    reason: format!("invalid base64 public key: {}", e),
                })?;
            decode_key_bytes(&bytes)?
        };

        Self::from_verifying_key(key)
    }

    /// Wrap an already-parsed key, computing its fingerprint.
    pub fn from_verifying_key(key: VerifyingKey) -> Result<Self, KeyError> {
        use pkcs8::EncodePublicKey;

        let doc = key.to_public_key_der().map_err(|e| KeyError::InvalidKey {
            reason: format!("failed to encode public key as SPKI DER: {}", e),
        })?;

        Ok(Self {
            key,
            key_id: compute_key_id(doc.as_bytes()),
        })
    }

    /// The underlying verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }

    /// `sha256:<lowercase-hex>` over the SPKI DER encoding of the key.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Interpret decoded key bytes as raw Ed25519 or SPKI DER by shape.
///
/// Raw Ed25519 keys are exactly 32 bytes; anything else must be SPKI DER.
fn decode_key_bytes(bytes: &[u8]) -> Result<VerifyingKey, KeyError> {
    use pkcs8::DecodePublicKey;

    if let Ok(raw) = <[u8; 32]>::try_from(bytes) {
        return VerifyingKey::from_bytes(&raw).map_err(|e| KeyError::InvalidKey {
            reason: format!("invalid ed25519 key bytes: {}", e),
        });
    }

    VerifyingKey::from_public_key_der(bytes).map_err(|e| KeyError::InvalidKey {
        reason: format!("invalid SPKI public key: {}", e),
    })
}

/// Where a verifier looks for its trust key.
///
/// Channels are tried in a fixed order: the explicit value wins, then the
/// first embedded resource whose name contains the key name
/// (case-insensitive) with non-empty content, then a file of that name on
/// disk.
#[derive(Debug, Clone)]
pub struct KeySource {
    explicit: Option<String>,
    resources: Vec<(String, Vec<u8>)>,
    key_name: String,
}

impl Default for KeySource {
    fn default() -> Self {
        Self {
            explicit: None,
            resources: Vec::new(),
            key_name: DEFAULT_KEY_NAME.to_string(),
        }
    }
}

impl KeySource {
    /// Source with the conventional key name and no channels configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the key value directly. Takes precedence over every other
    /// channel; an empty or whitespace-only value is ignored.
    pub fn with_explicit(mut self, value: impl Into<String>) -> Self {
        self.explicit = Some(value.into());
        self
    }

    /// Register an embedded resource the key may live in.
    ///
    /// Applications typically feed `include_bytes!` content through here.
    pub fn with_resource(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.resources.push((name.into(), content.into()));
        self
    }

    /// Override the conventional resource/file name. For the file channel
    /// this may be a full path.
    pub fn with_key_name(mut self, name: impl Into<String>) -> Self {
        self.key_name = name.into();
        self
    }

    /// Resolve the trust key, or report that none is configured.
    ///
    /// `Ok(None)` means no channel yielded material. Material that was
    /// found but does not parse is an error, never silently dropped, so a
    /// corrupt key cannot masquerade as "no key configured".
    pub fn resolve(&self) -> Result<Option<TrustKey>, KeyError> {
        if let Some(value) = self.explicit.as_deref() {
            if !value.trim().is_empty() {
                let key = TrustKey::parse(value).map_err(|e| {
                    tracing::warn!(error = %e, "explicit trust key is unusable");
                    e
                })?;
                tracing::debug!(key_id = %key.key_id(), "resolved trust key from explicit value");
                return Ok(Some(key));
            }
        }

        if let Some((name, content)) = self.find_resource() {
            let text = String::from_utf8_lossy(content);
            let key = TrustKey::parse(&text).map_err(|e| {
                tracing::warn!(resource = %name, error = %e, "embedded key resource is unusable");
                e
            })?;
            tracing::debug!(
                resource = %name,
                key_id = %key.key_id(),
                "resolved trust key from embedded resource"
            );
            return Ok(Some(key));
        }

        let path = Path::new(&self.key_name);
        if path.is_file() {
            let bytes = fs::read(path).map_err(|source| KeyError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
            // Same lossy decode as the resource channel; `ReadFile` covers
            // I/O failures only.
            let text = String::from_utf8_lossy(&bytes);
            let key = TrustKey::parse(&text).map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "key file is unusable");
                e
            })?;
            tracing::debug!(
                path = %path.display(),
                key_id = %key.key_id(),
                "resolved trust key from file"
            );
            return Ok(Some(key));
        }

        Ok(None)
    }

    fn find_resource(&self) -> Option<(&str, &[u8])> {
        let needle = self.key_name.to_lowercase();
        self.resources
            .iter()
            .find(|(name, content)| !content.is_empty() && name.to_lowercase().contains(&needle))
            .map(|(name, content)| (name.as_str(), content.as_slice()))
    }
}
