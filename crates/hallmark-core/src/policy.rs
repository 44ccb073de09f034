//! Security policy for artifact verification.
//!
//! The policy gate decides, from the configured mode and the availability
//! of key and signature alone, whether the cryptographic check runs at all
//! or the outcome is already determined. No cryptography happens here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How strictly signature presence and validity are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Verify when a trust key is available; accept unconditionally otherwise.
    #[default]
    UseIfPossible,

    /// Require both a trust key and a signature; reject if either is missing.
    Strict,

    /// Never block on missing material. Used mainly to record that
    /// verification was skipped; material that is present is still checked.
    Unsafe,
}

impl SecurityMode {
    /// Whether callers must supply a signature for verification to pass.
    ///
    /// Policy query independent of any specific artifact: [`Strict`] always
    /// demands one, [`Unsafe`] never does, and [`UseIfPossible`] demands one
    /// exactly when a trust key is available.
    ///
    /// [`Strict`]: Self::Strict
    /// [`Unsafe`]: Self::Unsafe
    /// [`UseIfPossible`]: Self::UseIfPossible
    pub fn requires_signature(self, key_available: bool) -> bool {
        match self {
            Self::UseIfPossible => key_available,
            Self::Strict => true,
            Self::Unsafe => false,
        }
    }

    /// Decide what a verification attempt does given which material is at
    /// hand.
    ///
    /// Missing material never reaches the cryptographic check; it
    /// short-circuits into the outcome the mode prescribes. `Unsafe`
    /// tolerates absence but does not discard material that is offered:
    /// with both a key and a signature present the check runs under every
    /// mode.
    pub fn evaluate(self, key_present: bool, signature_present: bool) -> PolicyDecision {
        use PolicyDecision::{Decided, Verify};
        use ValidationResult::{Invalid, Unchecked};

        match self {
            Self::UseIfPossible => match (key_present, signature_present) {
                (false, _) => Decided(Unchecked),
                (true, false) => Decided(Invalid),
                (true, true) => Verify,
            },
            Self::Strict => match (key_present, signature_present) {
                (true, true) => Verify,
                _ => Decided(Invalid),
            },
            Self::Unsafe => match (key_present, signature_present) {
                (true, true) => Verify,
                _ => Decided(Unchecked),
            },
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UseIfPossible => "use_if_possible",
            Self::Strict => "strict",
            Self::Unsafe => "unsafe",
        })
    }
}

impl FromStr for SecurityMode {
    type Err = ParseSecurityModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "use_if_possible" => Ok(Self::UseIfPossible),
            "strict" => Ok(Self::Strict),
            "unsafe" => Ok(Self::Unsafe),
            other => Err(ParseSecurityModeError {
                value: other.to_string(),
            }),
        }
    }
}

/// Error for a mode string outside the defined set.
///
/// Mode values come from configuration; an unknown value is a
/// configuration mistake and must fail loudly rather than default.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown security mode {value:?}; expected one of: use_if_possible, strict, unsafe")]
pub struct ParseSecurityModeError {
    /// The rejected input.
    pub value: String,
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    /// Key and signature were present and the cryptographic check passed.
    Valid,

    /// The cryptographic check failed, or the mode demanded material that
    /// was missing.
    Invalid,

    /// The mode permitted skipping verification.
    Unchecked,
}

impl ValidationResult {
    /// Whether an installer may proceed with this artifact.
    ///
    /// `Unchecked` is a deliberate policy outcome, so only `Invalid` blocks.
    pub fn permits_install(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Unchecked => "unchecked",
        })
    }
}

/// What the policy gate tells the verifier to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Both pieces of material are present; run the cryptographic check.
    Verify,

    /// The outcome is already determined by mode and availability.
    Decided(ValidationResult),
}
