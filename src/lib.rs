//! # Data Signing
//!
//! This crate implements the signing half of JSON Object Signing and
//! Encryption (JOSE): an algorithm registry (JWA), signed message
//! serialization and verification (JWS), key representation and bulk import
//! (JWK/JWK Set), and a hierarchical key-material container (`KeyChain`)
//! that generates typed collections of asymmetric key pairs from a
//! declarative descriptor.
//!
//! Cryptographic primitives are not implemented here. They are consumed
//! through the [`Provider`] capability, an asynchronous interface over
//! opaque, non-exportable key handles, so the same engine runs against a
//! platform keystore, an HSM, or an in-memory software implementation.
//!
//! JWE (encryption) is out of scope.

pub mod error;
pub mod jose;
pub mod keys;
pub mod provider;

pub use crate::error::{Error, Result};
pub use crate::jose::header::Header;
pub use crate::jose::jwa::{Algorithm, AlgorithmRegistry};
pub use crate::jose::jwk::{Jwk, JwkSet};
pub use crate::jose::jws::{Jws, Serialization, SignatureRequest};
pub use crate::keys::keychain::{KeyChain, KeyEntry};
pub use crate::keys::keypair::{EcKeyPair, RsaKeyPair};
pub use crate::provider::{KeyHandle, Provider};
