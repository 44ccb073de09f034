//! The verification engine.
//!
//! [`ArtifactVerifier`] holds the security mode and the resolved trust key.
//! Both are fixed at construction, so one instance can serve concurrent
//! verification calls from many threads without locking.

use std::fs;
use std::io::Read;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Verifier};

use crate::error::{KeyError, VerifyError};
use crate::key::{KeySource, TrustKey};
use crate::policy::{PolicyDecision, SecurityMode, ValidationResult};

/// Verifies downloaded update artifacts against a published signature.
#[derive(Debug, Clone)]
pub struct ArtifactVerifier {
    mode: SecurityMode,
    key: Option<TrustKey>,
}

impl ArtifactVerifier {
    /// Build a verifier, resolving the trust key from `source`.
    ///
    /// Key-channel failures are propagated so that a corrupt key is never
    /// mistaken for "no key configured". A caller that prefers to run
    /// without a key in that case falls back explicitly:
    ///
    /// ```
    /// use hallmark_core::{ArtifactVerifier, KeySource, SecurityMode};
    ///
    /// let source = KeySource::new();
    /// let verifier = ArtifactVerifier::new(SecurityMode::UseIfPossible, &source)
    ///     .unwrap_or_else(|_| ArtifactVerifier::unkeyed(SecurityMode::UseIfPossible));
    /// assert_eq!(verifier.mode(), SecurityMode::UseIfPossible);
    /// ```
    pub fn new(mode: SecurityMode, source: &KeySource) -> Result<Self, KeyError> {
        let key = source.resolve()?;
        Ok(Self { mode, key })
    }

    /// Build a verifier around an already-parsed key.
    pub fn with_key(mode: SecurityMode, key: TrustKey) -> Self {
        Self {
            mode,
            key: Some(key),
        }
    }

    /// Build a verifier with no trust key.
    pub fn unkeyed(mode: SecurityMode) -> Self {
        Self { mode, key: None }
    }

    /// The configured security mode.
    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    /// The resolved trust key, if any.
    pub fn trust_key(&self) -> Option<&TrustKey> {
        self.key.as_ref()
    }

    /// Whether a usable trust key was resolved.
    pub fn key_available(&self) -> bool {
        self.key.is_some()
    }

    /// Whether callers must supply a signature for verification to pass.
    ///
    /// Callers use this to decide whether to fetch a signature at all.
    pub fn signature_required(&self) -> bool {
        self.mode.requires_signature(self.key_available())
    }

    /// Verify `data` against `signature` under the configured mode.
    ///
    /// The policy gate runs first; when mode and material availability
    /// alone determine the outcome, no cryptography runs and the data is
    /// never touched. A signature that is present but not decodable is
    /// [`VerifyError::MalformedSignature`], never `Invalid`.
    pub fn verify(
        &self,
        signature: Option<&str>,
        data: &[u8],
    ) -> Result<ValidationResult, VerifyError> {
        match self.prepare(signature)? {
            Prepared::Done(result) => Ok(result),
            Prepared::Check { key, signature } => Ok(check(key, &signature, data)),
        }
    }

    /// Verify the full contents of a stream.
    ///
    /// The stream is read to completion only when the policy gate decides
    /// a check will run.
    pub fn verify_reader<R: Read>(
        &self,
        signature: Option<&str>,
        mut reader: R,
    ) -> Result<ValidationResult, VerifyError> {
        match self.prepare(signature)? {
            Prepared::Done(result) => Ok(result),
            Prepared::Check { key, signature } => {
                let mut data = Vec::new();
                reader
                    .read_to_end(&mut data)
                    .map_err(|source| VerifyError::ReadStream { source })?;
                Ok(check(key, &signature, &data))
            }
        }
    }

    /// Verify a file by path.
    ///
    /// The file is opened only when a check will run, and the handle is
    /// released before this returns, whatever the outcome.
    pub fn verify_file(
        &self,
        signature: Option<&str>,
        path: &Path,
    ) -> Result<ValidationResult, VerifyError> {
        match self.prepare(signature)? {
            Prepared::Done(result) => Ok(result),
            Prepared::Check { key, signature } => {
                let data = fs::read(path).map_err(|source| VerifyError::ReadFile {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(check(key, &signature, &data))
            }
        }
    }

    /// Verify a string by its UTF-8 bytes.
    pub fn verify_str(
        &self,
        signature: Option<&str>,
        text: &str,
    ) -> Result<ValidationResult, VerifyError> {
        self.verify(signature, text.as_bytes())
    }

    /// Gate a verification attempt and decode the signature if the check
    /// will run.
    fn prepare(&self, signature: Option<&str>) -> Result<Prepared<'_>, VerifyError> {
        // An empty string is how the transport reports a missing signature.
        let signature = signature.filter(|s| !s.is_empty());

        match self.mode.evaluate(self.key_available(), signature.is_some()) {
            PolicyDecision::Decided(result) => {
                tracing::debug!(
                    mode = %self.mode,
                    result = %result,
                    "verification short-circuited by policy"
                );
                Ok(Prepared::Done(result))
            }
            PolicyDecision::Verify => match (&self.key, signature) {
                (Some(key), Some(signature)) => Ok(Prepared::Check {
                    key,
                    signature: decode_signature(signature)?,
                }),
                // The gate only proceeds when both pieces are present.
                _ => Ok(Prepared::Done(ValidationResult::Invalid)),
            },
        }
    }
}

/// Outcome of the policy gate plus everything the check needs if it runs.
enum Prepared<'a> {
    Done(ValidationResult),
    Check {
        key: &'a TrustKey,
        signature: Signature,
    },
}

/// Decode a base64 signature string into a structurally valid signature.
fn decode_signature(signature: &str) -> Result<Signature, VerifyError> {
    // Feeds may hard-wrap long attribute values.
    let compact: String = signature.split_whitespace().collect();

    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| VerifyError::MalformedSignature {
            reason: format!("invalid base64 signature: {}", e),
        })?;

    Signature::from_slice(&bytes).map_err(|e| VerifyError::MalformedSignature {
        reason: format!("invalid signature bytes: {}", e),
    })
}

/// Run the cryptographic check. All policy ran before this.
fn check(key: &TrustKey, signature: &Signature, data: &[u8]) -> ValidationResult {
    match key.verifying_key().verify(data, signature) {
        Ok(()) => {
            tracing::debug!(key_id = %key.key_id(), "artifact signature verified");
            ValidationResult::Valid
        }
        Err(_) => {
            tracing::debug!(key_id = %key.key_id(), "artifact signature rejected");
            ValidationResult::Invalid
        }
    }
}
