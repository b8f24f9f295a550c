//! RSA and elliptic-curve key pairs.
//!
//! A key pair couples two provider handles with the serializable form used
//! in key trees: a `type` discriminator plus, when known, the public and
//! private JWK representations. The handles themselves never serialize.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::jose::jwk::Jwk;
use crate::provider::{AlgorithmParams, EllipticCurve, Hash, KeyHandle, KeyUsage, Provider};

/// Key-pair type discriminator carried in serialized trees.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyPairType {
    /// An RSA key pair.
    #[serde(rename = "RSA")]
    Rsa,

    /// An elliptic-curve key pair.
    #[serde(rename = "EC")]
    Ec,
}

/// JWK representations of the two halves of a key pair.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct KeyPairJwk {
    /// Public-key JWK.
    #[serde(rename = "pub", skip_serializing_if = "Option::is_none")]
    pub public: Option<Jwk>,

    /// Private-key JWK.
    #[serde(rename = "prv", skip_serializing_if = "Option::is_none")]
    pub private: Option<Jwk>,
}

/// An RSA signing key pair.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RsaKeyPair {
    #[serde(rename = "type", default = "rsa_type")]
    type_: KeyPairType,
    #[serde(skip_serializing_if = "Option::is_none")]
    jwk: Option<KeyPairJwk>,
    #[serde(skip)]
    public_key: Option<KeyHandle>,
    #[serde(skip)]
    private_key: Option<KeyHandle>,
}

const fn rsa_type() -> KeyPairType {
    KeyPairType::Rsa
}

impl RsaKeyPair {
    const MODULUS_LENGTH: u32 = 2048;

    /// Generate a fresh 2048-bit RSASSA-PKCS1-v1_5/SHA-256 key pair.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn generate(provider: &impl Provider) -> Result<Self> {
        let params = AlgorithmParams::RsassaPkcs1V15 {
            hash: Hash::Sha256,
            modulus_length: Self::MODULUS_LENGTH,
        };
        let pair = provider
            .generate_key_pair(&params, false, &[KeyUsage::Sign, KeyUsage::Verify])
            .await?;

        Ok(Self {
            type_: KeyPairType::Rsa,
            jwk: None,
            public_key: Some(pair.public_key),
            private_key: Some(pair.private_key),
        })
    }

    /// The discriminator, always [`KeyPairType::Rsa`].
    #[must_use]
    pub const fn kind(&self) -> KeyPairType {
        self.type_
    }

    /// The JWK representations, when the pair was materialized from them.
    #[must_use]
    pub const fn jwk(&self) -> Option<&KeyPairJwk> {
        self.jwk.as_ref()
    }

    /// Handle to the public key.
    #[must_use]
    pub const fn public_key(&self) -> Option<&KeyHandle> {
        self.public_key.as_ref()
    }

    /// Handle to the private key.
    #[must_use]
    pub const fn private_key(&self) -> Option<&KeyHandle> {
        self.private_key.as_ref()
    }
}

/// An elliptic-curve signing key pair.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EcKeyPair {
    #[serde(rename = "type", default = "ec_type")]
    type_: KeyPairType,
    #[serde(skip_serializing_if = "Option::is_none")]
    jwk: Option<KeyPairJwk>,
    #[serde(skip)]
    public_key: Option<KeyHandle>,
    #[serde(skip)]
    private_key: Option<KeyHandle>,
}

const fn ec_type() -> KeyPairType {
    KeyPairType::Ec
}

impl EcKeyPair {
    /// Generate a fresh ECDSA P-256/SHA-256 key pair.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn generate(provider: &impl Provider) -> Result<Self> {
        let params = AlgorithmParams::Ecdsa { curve: EllipticCurve::P256, hash: Hash::Sha256 };
        let pair = provider
            .generate_key_pair(&params, false, &[KeyUsage::Sign, KeyUsage::Verify])
            .await?;

        Ok(Self {
            type_: KeyPairType::Ec,
            jwk: None,
            public_key: Some(pair.public_key),
            private_key: Some(pair.private_key),
        })
    }

    /// The discriminator, always [`KeyPairType::Ec`].
    #[must_use]
    pub const fn kind(&self) -> KeyPairType {
        self.type_
    }

    /// The JWK representations, when the pair was materialized from them.
    #[must_use]
    pub const fn jwk(&self) -> Option<&KeyPairJwk> {
        self.jwk.as_ref()
    }

    /// Handle to the public key.
    #[must_use]
    pub const fn public_key(&self) -> Option<&KeyHandle> {
        self.public_key.as_ref()
    }

    /// Handle to the private key.
    #[must_use]
    pub const fn private_key(&self) -> Option<&KeyHandle> {
        self.private_key.as_ref()
    }
}
