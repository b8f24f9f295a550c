//! # JSON Web Key (JWK)
//!
//! A JWK ([RFC7517]) is a JSON representation of a cryptographic key; a
//! JWK Set is a collection of them. Importing a JWK binds an opaque
//! provider key handle to it; the JWK's own members remain the public,
//! serializable form of the key.
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::jose::jwa::AlgorithmRegistry;
use crate::provider::{KeyHandle, Provider};

/// A JSON Web Key.
///
/// Recognized common members are typed; algorithm-specific members
/// (`crv`/`x`/`y`/`d` for EC, `n`/`e`/`d`/`p`/`q`/… for RSA, `k` for
/// octet keys) live in [`Jwk::additional`] and pass through serialization
/// untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Jwk {
    /// Key type, e.g. `"RSA"` or `"EC"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kty: Option<KeyType>,

    /// Intended use of the key.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<KeyUse>,

    /// Operations the key is intended for, e.g. `["verify"]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,

    /// Algorithm the key is intended to be used with, e.g. `"RS256"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key identifier.
    /// For example, "_Qq0UL2Fq651Q0Fjd6TvnYE-faHiOpRlPVQcY_-tA4A".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// URI of an X.509 certificate or certificate chain for the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,

    /// X.509 certificate chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,

    /// SHA-1 thumbprint of the DER encoding of the X.509 certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,

    /// Algorithm-specific key material and any unrecognized members.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub additional: Map<String, Value>,

    // Back-reference to the provider key handle, bound on import. Never
    // serialized.
    #[serde(skip)]
    key: Option<KeyHandle>,
}

impl Jwk {
    /// The provider key handle bound by a successful import.
    #[must_use]
    pub const fn key_handle(&self) -> Option<&KeyHandle> {
        self.key.as_ref()
    }

    pub(crate) fn bind(&mut self, handle: KeyHandle) {
        self.key = Some(handle);
    }

    /// The algorithm identifier this key maps to: the `alg` member when
    /// present, otherwise inferred from `kty` (and `crv` for EC keys).
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when neither `alg` nor a usable `kty` is
    /// present, or an EC key names an unrecognized curve.
    pub fn algorithm_name(&self) -> Result<String> {
        if let Some(alg) = &self.alg {
            return Ok(alg.clone());
        }

        match self.kty {
            Some(KeyType::Rsa) => Ok("RS256".to_string()),
            Some(KeyType::Oct) => Ok("HS256".to_string()),
            Some(KeyType::Ec) => {
                match self.additional.get("crv").and_then(Value::as_str) {
                    Some("P-256") => Ok("ES256".to_string()),
                    Some("P-384") => Ok("ES384".to_string()),
                    Some("P-521") => Ok("ES512".to_string()),
                    Some(crv) => Err(Error::Data(format!("unrecognized EC curve: {crv}"))),
                    None => Err(Error::Data("EC key is missing 'crv'".to_string())),
                }
            }
            None => Err(Error::Data("JWK has neither 'alg' nor 'kty'".to_string())),
        }
    }

    /// Import the key through the provider, resolving the algorithm via
    /// the registry, and return it with the key handle bound.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedAlgorithm` for an unregistered `alg`,
    /// `Error::Data` for a malformed key, or the provider's error
    /// unchanged.
    pub async fn import(
        registry: &AlgorithmRegistry, provider: &impl Provider, jwk: Jwk,
    ) -> Result<Self> {
        tracing::debug!("jwk::import");

        let name = jwk.algorithm_name()?;
        let algorithm = registry.resolve(&name)?;
        algorithm.import_key(provider, &jwk).await
    }
}

// The bound key handle has no bearing on key equality.
impl PartialEq for Jwk {
    fn eq(&self, other: &Self) -> bool {
        self.kty == other.kty
            && self.use_ == other.use_
            && self.key_ops == other.key_ops
            && self.alg == other.alg
            && self.kid == other.kid
            && self.x5u == other.x5u
            && self.x5c == other.x5c
            && self.x5t == other.x5t
            && self.additional == other.additional
    }
}

impl Eq for Jwk {}

/// Cryptographic key type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// RSA key pair
    #[default]
    #[serde(rename = "RSA")]
    Rsa,

    /// Elliptic curve key pair
    #[serde(rename = "EC")]
    Ec,

    /// Octet string
    #[serde(rename = "oct")]
    Oct,
}

/// The intended usage of the key.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyUse {
    /// Public key is to be used for signature verification
    #[default]
    #[serde(rename = "sig")]
    Signature,

    /// Public key is to be used for encryption
    #[serde(rename = "enc")]
    Encryption,
}

/// A JWK Set: an ordered collection of JWKs ([RFC7517] section 5).
///
/// [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct JwkSet {
    /// The keys, in document order.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Import every key of a JWK Set document concurrently.
    ///
    /// The import is atomic: a document without a `keys` member rejects
    /// outright, and any single entry's failure fails the whole set. A
    /// present-but-empty `keys` list is legal and yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when `keys` is absent or malformed, or the
    /// first failed entry's error.
    pub async fn import(
        registry: &AlgorithmRegistry, provider: &impl Provider, document: &Value,
    ) -> Result<Self> {
        tracing::debug!("jwkset::import");

        let Some(keys) = document.get("keys") else {
            return Err(Error::Data("cannot import JWK Set: 'keys' member is missing".to_string()));
        };
        let entries: Vec<Jwk> = serde_json::from_value(keys.clone())?;

        let importing = entries.into_iter().map(|jwk| Jwk::import(registry, provider, jwk));
        let keys = try_join_all(importing).await?;

        Ok(Self { keys })
    }
}
