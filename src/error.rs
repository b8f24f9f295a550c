//! # Errors
//!
//! Error types shared across the JOSE and key-management modules.
//!
//! A failed signature check is *not* an error: verification returns
//! `Ok(false)` on a cryptographic mismatch and reserves `Err` for
//! structural problems such as malformed segments or unknown algorithms.

use thiserror::Error;

/// Result type for JOSE and key-management operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors arising from JOSE processing and key management.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or unsupported input shape: unknown serialization kind,
    /// missing `keys` member in a JWK Set, absent signature(s) on verify.
    #[error("{0}")]
    Data(String),

    /// The `alg` identifier is not present in the registry. Raised before
    /// any provider call.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Advisory pre-check failure for signing with a too-short key. The
    /// provider's own checks remain authoritative.
    #[error("{length}-bit key is below the {min}-bit minimum for {alg}")]
    InsufficientKeyLength {
        /// Algorithm the key was offered to.
        alg: String,
        /// Advertised key length in bits.
        length: u32,
        /// The algorithm's minimum key length in bits.
        min: u32,
    },

    /// A `KeyChain` descriptor leaf is neither a recognized generation
    /// method nor a nested mapping, or an `initialize` pass met an
    /// unrecognized `type` discriminator.
    #[error("{0}")]
    Descriptor(String),

    /// A provider call failed. Provider errors propagate unchanged.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Data(e.to_string())
    }
}
