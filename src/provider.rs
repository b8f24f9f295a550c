//! # Crypto Provider
//!
//! The [`Provider`] trait is the narrow interface through which all
//! cryptographic primitives are consumed: key import, key-pair generation,
//! signing, and verification. Implementers hold the actual key material;
//! the rest of the crate only ever sees opaque [`KeyHandle`] values and
//! never inspects their bytes.
//!
//! The shape of the interface follows the W3C Web Cryptography API's
//! `SubtleCrypto` surface, reduced to the four operations the signing
//! engine needs.

use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

/// Provides cryptographic primitives over opaque key handles.
///
/// All four operations are asynchronous and may fail with provider-defined
/// errors, which propagate to callers unchanged.
pub trait Provider: Send + Sync {
    /// Import key material in the given format, binding it to the algorithm
    /// described by `params` and restricting it to `usages`.
    fn import_key(
        &self, format: KeyFormat, key_data: &Value, params: &AlgorithmParams, extractable: bool,
        usages: &[KeyUsage],
    ) -> impl Future<Output = anyhow::Result<KeyHandle>> + Send;

    /// Generate an asymmetric key pair for the algorithm described by
    /// `params`.
    fn generate_key_pair(
        &self, params: &AlgorithmParams, extractable: bool, usages: &[KeyUsage],
    ) -> impl Future<Output = anyhow::Result<KeyPairHandle>> + Send;

    /// Sign `data` with the given key, returning the raw signature bytes.
    fn sign(
        &self, params: &AlgorithmParams, key: &KeyHandle, data: &[u8],
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;

    /// Verify `signature` over `data` with the given key. A mismatched
    /// signature is `Ok(false)`, not an error.
    fn verify(
        &self, params: &AlgorithmParams, key: &KeyHandle, signature: &[u8], data: &[u8],
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

/// An opaque reference to key material owned by a [`Provider`].
///
/// Handles are cheap to clone and are passed between provider calls without
/// interpretation. A handle may advertise the length of the underlying key
/// so callers can run advisory strength checks; the provider's own checks
/// remain authoritative.
#[derive(Clone)]
pub struct KeyHandle {
    material: Arc<dyn Any + Send + Sync>,
    length: Option<u32>,
}

impl KeyHandle {
    /// Wrap provider-owned key material in an opaque handle.
    pub fn new(material: impl Any + Send + Sync) -> Self {
        Self { material: Arc::new(material), length: None }
    }

    /// Wrap key material, advertising the key length in bits.
    pub fn with_length(material: impl Any + Send + Sync, length: u32) -> Self {
        Self { material: Arc::new(material), length: Some(length) }
    }

    /// The advertised key length in bits, when the provider disclosed one.
    #[must_use]
    pub const fn length(&self) -> Option<u32> {
        self.length
    }

    /// Recover a reference to the concrete material. Only the provider that
    /// created the handle knows the concrete type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.material).downcast_ref()
    }
}

// Key material must never leak through logs.
impl Debug for KeyHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle").field("length", &self.length).finish_non_exhaustive()
    }
}

/// The two halves of a generated asymmetric key pair.
#[derive(Clone, Debug)]
pub struct KeyPairHandle {
    /// Handle to the public key.
    pub public_key: KeyHandle,

    /// Handle to the private key.
    pub private_key: KeyHandle,
}

/// Format of key material presented to [`Provider::import_key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFormat {
    /// A JSON Web Key object.
    Jwk,

    /// Raw key bytes.
    Raw,
}

/// Operations a key may be used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyUsage {
    /// Compute digital signatures or MACs.
    Sign,

    /// Verify digital signatures or MACs.
    Verify,

    /// Encrypt content. Accepted pending encryption (JWE) support.
    Encrypt,

    /// Decrypt content. Accepted pending encryption (JWE) support.
    Decrypt,
}

impl KeyUsage {
    /// Map a JWK `key_ops` member to a usage, if recognized.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sign" => Some(Self::Sign),
            "verify" => Some(Self::Verify),
            "encrypt" => Some(Self::Encrypt),
            "decrypt" => Some(Self::Decrypt),
            _ => None,
        }
    }
}

/// Primitive parameters bound to an algorithm: the hash function plus the
/// curve or key size the provider needs for key generation, signing, and
/// verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlgorithmParams {
    /// HMAC with a SHA-2 function.
    Hmac {
        /// Hash function.
        hash: Hash,
    },

    /// RSASSA-PKCS1-v1_5 with a SHA-2 function.
    RsassaPkcs1V15 {
        /// Hash function.
        hash: Hash,
        /// Modulus length in bits used at generation time.
        modulus_length: u32,
    },

    /// RSASSA-PSS with a SHA-2 function and MGF1.
    RsaPss {
        /// Hash function, also used for MGF1.
        hash: Hash,
        /// Salt length in bytes.
        salt_length: u32,
        /// Modulus length in bits used at generation time.
        modulus_length: u32,
    },

    /// ECDSA over a NIST P curve.
    Ecdsa {
        /// Named curve.
        curve: EllipticCurve,
        /// Hash function.
        hash: Hash,
    },

    /// The `none` algorithm: no digital signature or MAC performed.
    None,
}

/// SHA-2 hash functions used by the JWA algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hash {
    /// SHA-256.
    Sha256,

    /// SHA-384.
    Sha384,

    /// SHA-512.
    Sha512,
}

/// NIST P curves used by the ECDSA algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EllipticCurve {
    /// P-256 (secp256r1).
    P256,

    /// P-384 (secp384r1).
    P384,

    /// P-521 (secp521r1).
    P521,
}
