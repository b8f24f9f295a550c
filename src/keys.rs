//! # Key Management
//!
//! Typed wrappers around provider-generated key pairs and the
//! [`KeyChain`](keychain::KeyChain) container that materializes whole trees
//! of them from a declarative descriptor.

pub mod keychain;
pub mod keypair;
