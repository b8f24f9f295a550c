//! # JSON Object Signing and Encryption (JOSE)
//!
//! The signing half of the JOSE standards family: algorithms ([`jwa`]),
//! signed messages ([`jws`]), keys ([`jwk`]), and the shared header
//! ([`header`]). Encryption (JWE) is not implemented.

pub mod header;
pub mod jwa;
pub mod jwk;
pub mod jws;
