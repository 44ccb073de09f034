//! Error types for key resolution and verification.

use std::io;
use std::path::PathBuf;

/// Key resolution errors.
///
/// Absence of a key is not an error; resolution reports it as `Ok(None)`.
/// These cover material that was found but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// A configured key file exists but could not be read.
    #[error("failed to read key file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key material was found but does not parse as a public key.
    #[error("invalid public key: {reason}")]
    InvalidKey { reason: String },
}

/// Verification errors.
///
/// A failed trust decision is not an error; that is
/// [`ValidationResult::Invalid`]. These cover malformed input and I/O
/// failures while acquiring the artifact data.
///
/// [`ValidationResult::Invalid`]: crate::ValidationResult::Invalid
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The signature string is not valid base64, or the decoded bytes are
    /// not a structurally valid signature.
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },

    /// The artifact file could not be read.
    #[error("failed to read artifact {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The artifact stream failed mid-read.
    #[error("failed to read artifact stream: {source}")]
    ReadStream {
        #[source]
        source: io::Error,
    },
}
