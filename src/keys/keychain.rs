//! # KeyChain
//!
//! A hierarchical container of key pairs built from a declarative
//! descriptor. The descriptor is a nested JSON mapping whose leaves name a
//! generation method; [`KeyChain::generate`] materializes an isomorphic
//! tree of typed key pairs, generating siblings concurrently. The
//! descriptor itself is never modified.
//!
//! ```json
//! {
//!   "token": { "signing": "RSAKeyPair" },
//!   "id": "ECKeyPair"
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::keys::keypair::{EcKeyPair, RsaKeyPair};
use crate::provider::Provider;

/// One node of a key tree: a named sub-tree or a typed key pair.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum KeyEntry {
    /// A sub-tree of named entries.
    Branch(BTreeMap<String, KeyEntry>),

    /// An RSA key pair.
    Rsa(RsaKeyPair),

    /// An elliptic-curve key pair.
    Ec(EcKeyPair),
}

impl KeyEntry {
    /// Look up a child entry. `None` for leaves and unknown names.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Branch(entries) => entries.get(name),
            Self::Rsa(_) | Self::Ec(_) => None,
        }
    }

    /// Whether this entry is a sub-tree.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }

    /// The entry as an RSA key pair, when it is one.
    #[must_use]
    pub const fn as_rsa(&self) -> Option<&RsaKeyPair> {
        match self {
            Self::Rsa(pair) => Some(pair),
            _ => None,
        }
    }

    /// The entry as an elliptic-curve key pair, when it is one.
    #[must_use]
    pub const fn as_ec(&self) -> Option<&EcKeyPair> {
        match self {
            Self::Ec(pair) => Some(pair),
            _ => None,
        }
    }
}

/// A tree of named key pairs.
///
/// Branches serialize as objects, leaves as their type-tagged forms, so a
/// generated chain survives `serialize → initialize` with its shape intact.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct KeyChain {
    entries: BTreeMap<String, KeyEntry>,
}

impl KeyChain {
    /// Generate a key tree isomorphic to `descriptor`.
    ///
    /// Descriptor leaves name a generation method. The recognized methods
    /// are `"RSAKeyPair"` and `"ECKeyPair"`; any other leaf fails the whole
    /// generation. Arrays are a reserved shorthand and are rejected.
    /// Sibling entries are generated concurrently, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Descriptor` for a malformed or unrecognized
    /// descriptor node, or the provider's generation error unchanged.
    pub async fn generate(provider: &impl Provider, descriptor: &Value) -> Result<Self> {
        tracing::debug!("keychain::generate");

        let Some(mapping) = descriptor.as_object() else {
            return Err(Error::Descriptor("descriptor must be a JSON object".to_string()));
        };
        Ok(Self { entries: generate_branch(provider, mapping).await? })
    }

    /// Rebuild a key tree from an already-materialized JSON tree, as
    /// produced by serializing a generated chain.
    ///
    /// An object with a `type` member is cast to the named key-pair type;
    /// an object without one is a branch. Idempotent over its own output.
    ///
    /// # Errors
    ///
    /// Returns `Error::Descriptor` for a non-object node or an unrecognized
    /// `type`, and `Error::Data` when a key-pair node does not fit its
    /// schema.
    pub fn initialize(tree: &Value) -> Result<Self> {
        let Some(mapping) = tree.as_object() else {
            return Err(Error::Descriptor("key tree must be a JSON object".to_string()));
        };
        Ok(Self { entries: initialize_branch(mapping)? })
    }

    /// Look up a top-level entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&KeyEntry> {
        self.entries.get(name)
    }

    /// The top-level entries.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, KeyEntry> {
        &self.entries
    }

    /// Whether the chain holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Recursion through sub-mappings requires the boxed form.
fn generate_branch<'a, P: Provider>(
    provider: &'a P, mapping: &'a Map<String, Value>,
) -> Pin<Box<dyn Future<Output = Result<BTreeMap<String, KeyEntry>>> + Send + 'a>> {
    Box::pin(async move {
        let generating = mapping.iter().map(|(name, node)| async move {
            let entry = match node {
                Value::String(method) => generate_leaf(provider, method).await?,
                Value::Object(sub) => KeyEntry::Branch(generate_branch(provider, sub).await?),
                Value::Array(_) => {
                    return Err(Error::Descriptor(
                        "array shorthand is not supported".to_string(),
                    ));
                }
                other => {
                    return Err(Error::Descriptor(format!("invalid descriptor leaf: {other}")));
                }
            };
            Ok((name.clone(), entry))
        });
        Ok(try_join_all(generating).await?.into_iter().collect())
    })
}

async fn generate_leaf(provider: &impl Provider, method: &str) -> Result<KeyEntry> {
    match method {
        "RSAKeyPair" => Ok(KeyEntry::Rsa(RsaKeyPair::generate(provider).await?)),
        "ECKeyPair" => Ok(KeyEntry::Ec(EcKeyPair::generate(provider).await?)),
        _ => Err(Error::Descriptor(format!("unknown generation method: {method}"))),
    }
}

fn initialize_branch(mapping: &Map<String, Value>) -> Result<BTreeMap<String, KeyEntry>> {
    mapping.iter().map(|(name, node)| Ok((name.clone(), initialize_node(node)?))).collect()
}

fn initialize_node(node: &Value) -> Result<KeyEntry> {
    let Some(object) = node.as_object() else {
        return Err(Error::Descriptor(format!("invalid key tree leaf: {node}")));
    };

    match object.get("type") {
        Some(Value::String(kind)) if kind == "RSA" => {
            Ok(KeyEntry::Rsa(serde_json::from_value(node.clone())?))
        }
        Some(Value::String(kind)) if kind == "EC" => {
            Ok(KeyEntry::Ec(serde_json::from_value(node.clone())?))
        }
        Some(other) => Err(Error::Descriptor(format!("unknown key-pair type: {other}"))),
        None => Ok(KeyEntry::Branch(initialize_branch(object)?)),
    }
}
