//! Signature verification for downloaded update artifacts.
//!
//! Before an updater trusts a downloaded artifact, it checks the artifact
//! against an Ed25519 signature published alongside it. This crate is that
//! check: a trust key resolved once at construction, a security policy
//! deciding what happens when key or signature is missing, and the
//! cryptographic comparison itself over bytes, streams, files, or strings.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use hallmark_core::{ArtifactVerifier, KeySource, SecurityMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! // The application ships its public key; the feed carries the signature.
//! let source = KeySource::new().with_explicit(
//!     "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEA...\n-----END PUBLIC KEY-----",
//! );
//! let verifier = ArtifactVerifier::new(SecurityMode::UseIfPossible, &source)?;
//!
//! let result = verifier.verify_file(
//!     Some("kQ4K...signature from the update feed..."),
//!     Path::new("downloads/update-4.2.0.tar.gz"),
//! )?;
//!
//! if !result.permits_install() {
//!     anyhow::bail!("update artifact rejected: {result}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Security modes
//!
//! | Mode | Missing key | Key but no signature |
//! |------|-------------|----------------------|
//! | `UseIfPossible` | accept as `Unchecked` | reject as `Invalid` |
//! | `Strict` | reject as `Invalid` | reject as `Invalid` |
//! | `Unsafe` | accept as `Unchecked` | accept as `Unchecked` |
//!
//! With both a key and a signature present, every mode runs the real
//! cryptographic check. `Unsafe` means "don't require them", not "ignore
//! them when offered".
//!
//! # Key resolution
//!
//! [`KeySource`] tries three channels in order and stops at the first that
//! yields material: an explicit key value, an embedded resource table
//! (typically fed from `include_bytes!`), and a key file on disk. A found
//! key that does not parse is a [`KeyError`], distinct from no key being
//! configured at all.
//!
//! # Signing
//!
//! The [`sign`] module produces the matching base64 signatures for release
//! tooling; keys are ordinary Ed25519 PKCS#8 PEM files.

pub mod error;
pub mod key;
pub mod policy;
pub mod sign;
pub mod verifier;

pub use error::{KeyError, VerifyError};
pub use key::{compute_key_id, KeySource, TrustKey, DEFAULT_KEY_NAME};
pub use policy::{ParseSecurityModeError, PolicyDecision, SecurityMode, ValidationResult};
pub use verifier::ArtifactVerifier;
