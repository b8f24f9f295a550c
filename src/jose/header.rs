//! # JOSE Header
//!
//! The JOSE header ([RFC7515] section 4) describes the cryptographic
//! operations applied to a message. The recognized members are typed;
//! anything else passes through untouched, as required for forward
//! compatibility.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JOSE header: a pure data holder with no validation beyond field
/// typing.
///
/// A header used to compute a signing input must not be mutated
/// afterwards: doing so invalidates the signature.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Media type of the complete JWS, per
    /// [IANA.MediaTypes](http://www.iana.org/assignments/media-types).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Media type of the secured content (the payload).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,

    /// Algorithm identifier as per the IANA "JSON Web Signature and
    /// Encryption Algorithms" registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// URI of a JWK Set containing the key used to sign the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jku: Option<String>,

    /// Identifier of the key used to sign the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// URI of an X.509 certificate or certificate chain corresponding to
    /// the signing key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,

    /// X.509 certificate chain, each entry a base64-encoded DER
    /// certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,

    /// SHA-1 thumbprint of the DER encoding of the X.509 certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,

    /// Extensions that must be understood and processed by the receiver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crit: Option<Vec<String>>,

    /// Content encryption algorithm. Present on JWE headers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enc: Option<String>,

    /// Compression algorithm applied to the plaintext (JWE).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,

    /// Unrecognized members, preserved but not interpreted.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub additional: Map<String, Value>,
}

impl Header {
    /// Whether the header is JWS-shaped: `enc` is absent.
    #[must_use]
    pub const fn is_jws(&self) -> bool {
        self.enc.is_none()
    }

    /// Whether the header is JWE-shaped: `enc` is present.
    #[must_use]
    pub const fn is_jwe(&self) -> bool {
        self.enc.is_some()
    }
}
