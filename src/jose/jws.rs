//! # JSON Web Signature (JWS)
//!
//! JWS ([RFC7515]) represents content secured with digital signatures
//! using JSON-based data structures. This module builds the signing input,
//! produces and parses the compact, general JSON, and flattened JSON
//! serializations, and orchestrates verification across one or many
//! signatures. The cryptography itself is resolved through the
//! [`AlgorithmRegistry`] and performed by the [`Provider`].
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515

use std::future::Future;
use std::str::FromStr;

use base64ct::{Base64UrlUnpadded, Encoding};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::jose::header::Header;
use crate::jose::jwa::AlgorithmRegistry;
use crate::provider::{KeyHandle, Provider};

/// The defined JWS serializations.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Serialization {
    /// The dot-separated three-part string form. Exactly one signature,
    /// no unprotected header.
    #[default]
    Compact,

    /// The general JSON form: N ≥ 1 signatures over a shared payload.
    Json,

    /// The flattened JSON form: the single-signature special case of the
    /// general form, inlined.
    Flattened,
}

impl FromStr for Serialization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "flattened" => Ok(Self::Flattened),
            _ => Err(Error::Data(format!("unsupported serialization: {s}"))),
        }
    }
}

/// One requested signature: the protected/unprotected header split plus
/// the signing key.
#[derive(Clone, Debug)]
pub struct SignatureRequest {
    /// The protected header, covered by the signature.
    pub protected: Header,

    /// The unprotected header, carried alongside the signature in the
    /// JSON serializations. Not permitted in compact form.
    pub header: Option<Map<String, Value>>,

    /// Handle to the signing key.
    pub key: KeyHandle,
}

/// One signature over the shared payload, as carried on the wire.
///
/// The protected header is kept as the received/produced base64url segment
/// so verification recomputes the signing input byte-for-byte rather than
/// from a re-serialization.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Signature {
    /// base64url-encoded protected header.
    pub protected: String,

    /// Unprotected header, as a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Map<String, Value>>,

    /// base64url-encoded signature bytes.
    pub signature: String,
}

impl Signature {
    /// Decode the protected header segment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the segment is not base64url or does not
    /// hold a JSON header.
    pub fn protected_header(&self) -> Result<Header> {
        let decoded = Base64UrlUnpadded::decode_vec(&self.protected)
            .map_err(|e| Error::Data(format!("cannot decode protected header: {e}")))?;
        serde_json::from_slice(&decoded)
            .map_err(|e| Error::Data(format!("cannot deserialize protected header: {e}")))
    }

    // The algorithm identifier for this signature: protected header first,
    // unprotected fallback.
    fn algorithm_name(&self, protected: &Header) -> Result<String> {
        if let Some(alg) = &protected.alg {
            return Ok(alg.clone());
        }
        self.header
            .as_ref()
            .and_then(|h| h.get("alg"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| Error::Data("signature is missing 'alg'".to_string()))
    }
}

// General JSON serialization.
#[derive(Deserialize, Serialize)]
struct General {
    payload: String,
    signatures: Vec<Signature>,
}

// Flattened JSON serialization.
#[derive(Deserialize, Serialize)]
struct Flattened {
    payload: String,
    protected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<Map<String, Value>>,
    signature: String,
}

/// A signed message: the payload segment plus one or more signatures over
/// it.
#[derive(Clone, Debug)]
pub struct Jws {
    payload: String,
    signatures: Vec<Signature>,
    serialization: Serialization,
    verified: bool,
}

/// Sign `payload` once per request and assemble the requested
/// serialization.
///
/// Sibling signatures are produced concurrently; any failure fails the
/// whole operation. Serialization constraints (compact and flattened
/// carry exactly one signature, compact carries no unprotected header)
/// are checked before any cryptographic work.
///
/// # Errors
///
/// Returns `Error::Data` on a constraint violation,
/// `Error::UnsupportedAlgorithm` when a header names an unregistered
/// algorithm, or the provider's signing error unchanged.
pub async fn sign(
    registry: &AlgorithmRegistry, provider: &impl Provider, serialization: Serialization,
    payload: &[u8], requests: &[SignatureRequest],
) -> Result<Jws> {
    tracing::debug!("jws::sign");

    if requests.is_empty() {
        return Err(Error::Data("at least one signature must be requested".to_string()));
    }
    match serialization {
        Serialization::Compact => {
            if requests.len() != 1 {
                return Err(Error::Data(
                    "compact serialization carries exactly one signature".to_string(),
                ));
            }
            if requests[0].header.is_some() {
                return Err(Error::Data(
                    "compact serialization cannot carry an unprotected header".to_string(),
                ));
            }
        }
        Serialization::Flattened => {
            if requests.len() != 1 {
                return Err(Error::Data(
                    "flattened serialization carries exactly one signature".to_string(),
                ));
            }
        }
        Serialization::Json => {}
    }

    let payload_b64 = Base64UrlUnpadded::encode_string(payload);

    let signing = requests.iter().map(|request| {
        let payload_b64 = &payload_b64;
        async move {
            let Some(alg) = request.protected.alg.as_deref() else {
                return Err(Error::Data("protected header is missing 'alg'".to_string()));
            };
            let algorithm = registry.resolve(alg)?;

            let protected = Base64UrlUnpadded::encode_string(&serde_json::to_vec(
                &request.protected,
            )?);
            let signing_input = format!("{protected}.{payload_b64}");

            let signature =
                algorithm.sign(provider, &request.key, signing_input.as_bytes()).await?;

            Ok(Signature {
                protected,
                header: request.header.clone(),
                signature: Base64UrlUnpadded::encode_string(&signature),
            })
        }
    });
    let signatures = try_join_all(signing).await?;

    Ok(Jws { payload: payload_b64, signatures, serialization, verified: false })
}

impl Jws {
    /// Parse the compact serialization:
    /// `BASE64URL(UTF8(header)) "." BASE64URL(payload) "." BASE64URL(signature)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` unless the token has exactly three segments.
    pub fn from_compact(token: &str) -> Result<Self> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(Error::Data(format!(
                "invalid compact JWS: expected 3 segments, found {}",
                segments.len()
            )));
        }

        Ok(Self {
            payload: segments[1].to_string(),
            signatures: vec![Signature {
                protected: segments[0].to_string(),
                header: None,
                signature: segments[2].to_string(),
            }],
            serialization: Serialization::Compact,
            verified: false,
        })
    }

    /// Parse a JSON serialization, accepting the general and flattened
    /// forms.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the document matches neither form.
    pub fn from_json(text: &str) -> Result<Self> {
        if let Ok(general) = serde_json::from_str::<General>(text) {
            return Ok(Self {
                payload: general.payload,
                signatures: general.signatures,
                serialization: Serialization::Json,
                verified: false,
            });
        }
        if let Ok(flattened) = serde_json::from_str::<Flattened>(text) {
            return Ok(Self {
                payload: flattened.payload,
                signatures: vec![Signature {
                    protected: flattened.protected,
                    header: flattened.header,
                    signature: flattened.signature,
                }],
                serialization: Serialization::Flattened,
                verified: false,
            });
        }

        Err(Error::Data("document is not a JWS JSON serialization".to_string()))
    }

    /// Render the compact serialization. Only a message with exactly one
    /// signature and no unprotected header has one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the message shape does not fit the form.
    pub fn to_compact(&self) -> Result<String> {
        let [signature] = self.signatures.as_slice() else {
            return Err(Error::Data(
                "compact serialization carries exactly one signature".to_string(),
            ));
        };
        if signature.header.is_some() {
            return Err(Error::Data(
                "compact serialization cannot carry an unprotected header".to_string(),
            ));
        }

        Ok(format!("{}.{}.{}", signature.protected, self.payload, signature.signature))
    }

    /// Render the general JSON serialization.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the message cannot be serialized.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&General {
            payload: self.payload.clone(),
            signatures: self.signatures.clone(),
        })?)
    }

    /// Render the flattened JSON serialization. Only a single-signature
    /// message has one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the message holds more than one
    /// signature.
    pub fn to_flattened(&self) -> Result<String> {
        let [signature] = self.signatures.as_slice() else {
            return Err(Error::Data(
                "flattened serialization carries exactly one signature".to_string(),
            ));
        };

        Ok(serde_json::to_string(&Flattened {
            payload: self.payload.clone(),
            protected: signature.protected.clone(),
            header: signature.header.clone(),
            signature: signature.signature.clone(),
        })?)
    }

    /// Render the serialization the message was signed as or parsed from.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the message shape does not fit that
    /// form.
    pub fn render(&self) -> Result<String> {
        match self.serialization {
            Serialization::Compact => self.to_compact(),
            Serialization::Json => self.to_json(),
            Serialization::Flattened => self.to_flattened(),
        }
    }

    /// The decoded payload bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the payload segment is not base64url.
    pub fn payload(&self) -> Result<Vec<u8>> {
        Base64UrlUnpadded::decode_vec(&self.payload)
            .map_err(|e| Error::Data(format!("cannot decode payload: {e}")))
    }

    /// The signatures carried by the message.
    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Whether a previous [`Jws::verify`] call succeeded, so callers can
    /// branch without re-verifying.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.verified
    }

    /// Verify every signature with a shared key.
    ///
    /// Each signature's algorithm is resolved from its own header and its
    /// signing input recomputed from the received segments; signatures are
    /// checked concurrently and all must verify. On success the message is
    /// marked verified; a cryptographic mismatch is `Ok(false)` and leaves
    /// the message untouched. `alg:"none"` entries are rejected; see
    /// [`Jws::verify_unsecured`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Data` when the message carries no signatures or a
    /// segment is malformed, `Error::UnsupportedAlgorithm` for an
    /// unregistered `alg`, or the provider's error unchanged.
    pub async fn verify(
        &mut self, registry: &AlgorithmRegistry, provider: &impl Provider, key: &KeyHandle,
    ) -> Result<bool> {
        let resolve = |_: Header| {
            let key = key.clone();
            async move { Ok::<_, anyhow::Error>(key) }
        };
        self.verify_inner(registry, provider, resolve, false).await
    }

    /// Verify with a shared key, additionally accepting `alg:"none"`
    /// signatures (whose signature must be the empty byte sequence).
    ///
    /// The opt-in is per call by design: a registry- or message-wide
    /// default would open a signature-stripping downgrade.
    ///
    /// # Errors
    ///
    /// As [`Jws::verify`].
    pub async fn verify_unsecured(
        &mut self, registry: &AlgorithmRegistry, provider: &impl Provider, key: &KeyHandle,
    ) -> Result<bool> {
        let resolve = |_: Header| {
            let key = key.clone();
            async move { Ok::<_, anyhow::Error>(key) }
        };
        self.verify_inner(registry, provider, resolve, true).await
    }

    /// Verify every signature, resolving each signature's key from its
    /// decoded protected header. This suits the general form, where
    /// signatures may carry different `kid`s and algorithms.
    ///
    /// # Errors
    ///
    /// As [`Jws::verify`]; a resolver failure propagates as a provider
    /// error.
    pub async fn verify_with<P, F, Fut>(
        &mut self, registry: &AlgorithmRegistry, provider: &P, resolve: F,
    ) -> Result<bool>
    where
        P: Provider,
        F: Fn(Header) -> Fut + Sync,
        Fut: Future<Output = anyhow::Result<KeyHandle>> + Send,
    {
        self.verify_inner(registry, provider, resolve, false).await
    }

    async fn verify_inner<P, F, Fut>(
        &mut self, registry: &AlgorithmRegistry, provider: &P, resolve: F, allow_unsecured: bool,
    ) -> Result<bool>
    where
        P: Provider,
        F: Fn(Header) -> Fut + Sync,
        Fut: Future<Output = anyhow::Result<KeyHandle>> + Send,
    {
        tracing::debug!("jws::verify");

        if self.signatures.is_empty() {
            return Err(Error::Data("JWS carries no signatures".to_string()));
        }

        let payload = &self.payload;
        let resolve = &resolve;
        let checks = self.signatures.iter().map(|entry| async move {
            let protected = entry.protected_header()?;
            let algorithm = registry.resolve(&entry.algorithm_name(&protected)?)?;
            if algorithm.is_unsecured() && !allow_unsecured {
                return Err(Error::Data(
                    "unsecured JWS requires explicit opt-in".to_string(),
                ));
            }

            let signature = Base64UrlUnpadded::decode_vec(&entry.signature)
                .map_err(|e| Error::Data(format!("cannot decode signature: {e}")))?;
            let key = resolve(protected).await?;

            let signing_input = format!("{}.{payload}", entry.protected);
            algorithm.verify(provider, &key, &signature, signing_input.as_bytes()).await
        });
        let results = try_join_all(checks).await?;

        let verified = results.into_iter().all(|ok| ok);
        if verified {
            self.verified = true;
        }
        Ok(verified)
    }
}
