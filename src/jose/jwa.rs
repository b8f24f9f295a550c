//! # JSON Web Algorithms (JWA)
//!
//! JWA ([RFC7518]) registers cryptographic algorithms and identifiers for
//! use with JWS, JWE, and JWK. This module implements the digital
//! signature and MAC registry (section 3.1): each entry binds an
//! identifier such as `"ES256"` to the primitive parameters the
//! [`Provider`] needs and delegates the actual cryptography to it.
//!
//! The registry is a plain value constructed once at startup and passed
//! explicitly to the engines that need it, so tests may substitute doubles
//! or trimmed-down registries.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use crate::error::{Error, Result};
use crate::jose::jwk::{Jwk, KeyUse};
use crate::provider::{
    AlgorithmParams, EllipticCurve, Hash, KeyFormat, KeyHandle, KeyUsage, Provider,
};

/// A registered signature/MAC algorithm: an identifier bound to the
/// provider parameters that realize it.
///
/// Entries are immutable once registered.
#[derive(Clone, Debug)]
pub struct Algorithm {
    name: String,
    params: AlgorithmParams,
    min_key_bits: Option<u32>,
}

impl Algorithm {
    /// Define an algorithm. `min_key_bits`, when given, enables the
    /// advisory key-length pre-check on signing.
    #[must_use]
    pub fn new(name: impl Into<String>, params: AlgorithmParams, min_key_bits: Option<u32>) -> Self {
        Self { name: name.into(), params, min_key_bits }
    }

    /// The registered identifier, e.g. `"ES256"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The provider parameters bound to this algorithm.
    #[must_use]
    pub const fn params(&self) -> &AlgorithmParams {
        &self.params
    }

    /// Whether this is the `none` algorithm: no signature or MAC
    /// performed.
    #[must_use]
    pub const fn is_unsecured(&self) -> bool {
        matches!(self.params, AlgorithmParams::None)
    }

    /// Sign `data`, returning the raw signature bytes.
    ///
    /// For `none` this is the empty byte sequence and the provider is not
    /// consulted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InsufficientKeyLength` when the handle advertises a
    /// length below the algorithm's minimum (advisory; the provider's own
    /// checks are authoritative), or the provider's error unchanged.
    pub async fn sign(
        &self, provider: &impl Provider, key: &KeyHandle, data: &[u8],
    ) -> Result<Vec<u8>> {
        if self.is_unsecured() {
            return Ok(Vec::new());
        }
        if let (Some(length), Some(min)) = (key.length(), self.min_key_bits) {
            if length < min {
                return Err(Error::InsufficientKeyLength {
                    alg: self.name.clone(),
                    length,
                    min,
                });
            }
        }

        Ok(provider.sign(&self.params, key, data).await?)
    }

    /// Verify `signature` over `data`.
    ///
    /// A mismatched signature is a normal `Ok(false)`, never an error. For
    /// `none`, only the empty byte sequence verifies.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged when the call itself fails.
    pub async fn verify(
        &self, provider: &impl Provider, key: &KeyHandle, signature: &[u8], data: &[u8],
    ) -> Result<bool> {
        if self.is_unsecured() {
            return Ok(signature.is_empty());
        }

        Ok(provider.verify(&self.params, key, signature, data).await?)
    }

    /// Import a JWK through the provider, returning the JWK with its key
    /// handle bound.
    ///
    /// JWK `key_ops` map directly to provider usages; absent `key_ops`,
    /// `use:"sig"` implies `verify`. A `use:"enc"` key is accepted as a
    /// pass-through no-op rather than an error: it is returned unbound,
    /// pending encryption support.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the JWK cannot be rendered for the
    /// provider, or the provider's import error unchanged.
    pub async fn import_key(&self, provider: &impl Provider, jwk: &Jwk) -> Result<Jwk> {
        if jwk.use_ == Some(KeyUse::Encryption) {
            return Ok(jwk.clone());
        }

        let usages = match &jwk.key_ops {
            Some(ops) => ops.iter().filter_map(|op| KeyUsage::from_name(op)).collect(),
            None if jwk.use_ == Some(KeyUse::Signature) => vec![KeyUsage::Verify],
            None => Vec::new(),
        };

        let key_data = serde_json::to_value(jwk)?;
        let handle =
            provider.import_key(KeyFormat::Jwk, &key_data, &self.params, true, &usages).await?;

        let mut bound = jwk.clone();
        bound.bind(handle);
        Ok(bound)
    }
}

/// The algorithm registry: identifier to capability, defined at process
/// start and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct AlgorithmRegistry {
    entries: Vec<Algorithm>,
}

impl AlgorithmRegistry {
    /// The RFC 7518 section 3.1 registry: `HS256/384/512`, `RS256/384/512`,
    /// `ES256/384/512`, `PS256/384/512`, and `none`.
    ///
    /// `none` is resolvable but verification engines must require an
    /// explicit per-call opt-in before accepting it, never a
    /// registry-wide default.
    #[must_use]
    pub fn standard() -> Self {
        let hs = |name, hash, bits| {
            Algorithm::new(name, AlgorithmParams::Hmac { hash }, Some(bits))
        };
        let rs = |name, hash| {
            Algorithm::new(
                name,
                AlgorithmParams::RsassaPkcs1V15 { hash, modulus_length: 2048 },
                Some(2048),
            )
        };
        let es = |name, curve, hash| {
            Algorithm::new(name, AlgorithmParams::Ecdsa { curve, hash }, None)
        };
        let ps = |name, hash, salt_length| {
            Algorithm::new(
                name,
                AlgorithmParams::RsaPss { hash, salt_length, modulus_length: 2048 },
                Some(2048),
            )
        };

        Self {
            entries: vec![
                hs("HS256", Hash::Sha256, 256),
                hs("HS384", Hash::Sha384, 384),
                hs("HS512", Hash::Sha512, 512),
                rs("RS256", Hash::Sha256),
                rs("RS384", Hash::Sha384),
                rs("RS512", Hash::Sha512),
                es("ES256", EllipticCurve::P256, Hash::Sha256),
                es("ES384", EllipticCurve::P384, Hash::Sha384),
                es("ES512", EllipticCurve::P521, Hash::Sha512),
                ps("PS256", Hash::Sha256, 32),
                ps("PS384", Hash::Sha384, 48),
                ps("PS512", Hash::Sha512, 64),
                Algorithm::new("none", AlgorithmParams::None, None),
            ],
        }
    }

    /// Register an additional algorithm, replacing any entry with the same
    /// identifier.
    pub fn register(&mut self, algorithm: Algorithm) {
        self.entries.retain(|a| !a.name.eq_ignore_ascii_case(&algorithm.name));
        self.entries.push(algorithm);
    }

    /// Look up an algorithm by identifier. Matching is case-insensitive:
    /// `"es256"` resolves the same entry as `"ES256"`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedAlgorithm` for an unregistered
    /// identifier.
    pub fn resolve(&self, name: &str) -> Result<&Algorithm> {
        self.entries
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnsupportedAlgorithm(name.to_string()))
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
