//! Shared test fixtures: a software crypto provider backed by in-memory
//! key material.

use std::sync::Once;

use anyhow::{anyhow, bail, Context};
use base64ct::{Base64UrlUnpadded, Encoding};
use datasig::provider::{
    AlgorithmParams, EllipticCurve, Hash, KeyFormat, KeyHandle, KeyPairHandle, KeyUsage, Provider,
};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use serde_json::Value;
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

// initalise tracing once for all tests
static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// # Panics
///
/// Panics if the tracing subscriber cannot be set.
pub fn init_tracer() {
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::ERROR).finish();
        tracing::subscriber::set_global_default(subscriber).expect("subscriber set");
    });
}

/// Key material held behind the handles this provider issues.
enum Material {
    Hmac(Vec<u8>),
    RsaPrivate(RsaPrivateKey),
    RsaPublic(RsaPublicKey),
    P256Private(p256::ecdsa::SigningKey),
    P256Public(p256::ecdsa::VerifyingKey),
    P384Private(p384::ecdsa::SigningKey),
    P384Public(p384::ecdsa::VerifyingKey),
}

/// A software provider for tests. Keys live in process memory; handles wrap
/// the parsed key objects directly.
pub struct Keystore;

impl Provider for Keystore {
    async fn import_key(
        &self, format: KeyFormat, key_data: &Value, params: &AlgorithmParams, _extractable: bool,
        _usages: &[KeyUsage],
    ) -> anyhow::Result<KeyHandle> {
        if format != KeyFormat::Jwk {
            bail!("only JWK import is supported");
        }

        match params {
            AlgorithmParams::Hmac { .. } => {
                let k = member(key_data, "k")?;
                let bits = u32::try_from(k.len())? * 8;
                Ok(KeyHandle::with_length(Material::Hmac(k), bits))
            }
            AlgorithmParams::RsassaPkcs1V15 { .. } | AlgorithmParams::RsaPss { .. } => {
                import_rsa(key_data)
            }
            AlgorithmParams::Ecdsa { curve, .. } => import_ec(key_data, *curve),
            AlgorithmParams::None => bail!("nothing to import for 'none'"),
        }
    }

    async fn generate_key_pair(
        &self, params: &AlgorithmParams, _extractable: bool, _usages: &[KeyUsage],
    ) -> anyhow::Result<KeyPairHandle> {
        match params {
            AlgorithmParams::RsassaPkcs1V15 { modulus_length, .. }
            | AlgorithmParams::RsaPss { modulus_length, .. } => {
                let private = RsaPrivateKey::new(&mut OsRng, *modulus_length as usize)?;
                let public = RsaPublicKey::from(&private);
                Ok(KeyPairHandle {
                    public_key: KeyHandle::with_length(Material::RsaPublic(public), *modulus_length),
                    private_key: KeyHandle::with_length(
                        Material::RsaPrivate(private),
                        *modulus_length,
                    ),
                })
            }
            AlgorithmParams::Ecdsa { curve: EllipticCurve::P256, .. } => {
                let private = p256::ecdsa::SigningKey::random(&mut OsRng);
                let public = p256::ecdsa::VerifyingKey::from(&private);
                Ok(KeyPairHandle {
                    public_key: KeyHandle::with_length(Material::P256Public(public), 256),
                    private_key: KeyHandle::with_length(Material::P256Private(private), 256),
                })
            }
            AlgorithmParams::Ecdsa { curve: EllipticCurve::P384, .. } => {
                let private = p384::ecdsa::SigningKey::random(&mut OsRng);
                let public = p384::ecdsa::VerifyingKey::from(&private);
                Ok(KeyPairHandle {
                    public_key: KeyHandle::with_length(Material::P384Public(public), 384),
                    private_key: KeyHandle::with_length(Material::P384Private(private), 384),
                })
            }
            _ => bail!("unsupported key-pair parameters: {params:?}"),
        }
    }

    async fn sign(
        &self, params: &AlgorithmParams, key: &KeyHandle, data: &[u8],
    ) -> anyhow::Result<Vec<u8>> {
        let material = material(key)?;

        match (params, material) {
            (AlgorithmParams::Hmac { hash }, Material::Hmac(k)) => hmac_tag(*hash, k, data),
            (AlgorithmParams::RsassaPkcs1V15 { hash, .. }, Material::RsaPrivate(private)) => {
                Ok(private.sign(pkcs1v15(*hash), &digest(*hash, data))?)
            }
            (
                AlgorithmParams::RsaPss { hash, salt_length, .. },
                Material::RsaPrivate(private),
            ) => Ok(private.sign_with_rng(
                &mut OsRng,
                pss(*hash, *salt_length),
                &digest(*hash, data),
            )?),
            (AlgorithmParams::Ecdsa { .. }, Material::P256Private(private)) => {
                use p256::ecdsa::signature::Signer;
                let signature: p256::ecdsa::Signature = private.sign(data);
                Ok(signature.to_bytes().to_vec())
            }
            (AlgorithmParams::Ecdsa { .. }, Material::P384Private(private)) => {
                use p384::ecdsa::signature::Signer;
                let signature: p384::ecdsa::Signature = private.sign(data);
                Ok(signature.to_bytes().to_vec())
            }
            _ => bail!("key does not match signing parameters"),
        }
    }

    async fn verify(
        &self, params: &AlgorithmParams, key: &KeyHandle, signature: &[u8], data: &[u8],
    ) -> anyhow::Result<bool> {
        let material = material(key)?;

        match (params, material) {
            (AlgorithmParams::Hmac { hash }, Material::Hmac(k)) => {
                Ok(hmac_tag(*hash, k, data)? == signature)
            }
            (AlgorithmParams::RsassaPkcs1V15 { hash, .. }, Material::RsaPublic(public)) => {
                Ok(public.verify(pkcs1v15(*hash), &digest(*hash, data), signature).is_ok())
            }
            (AlgorithmParams::RsassaPkcs1V15 { hash, .. }, Material::RsaPrivate(private)) => {
                let public = RsaPublicKey::from(private);
                Ok(public.verify(pkcs1v15(*hash), &digest(*hash, data), signature).is_ok())
            }
            (AlgorithmParams::RsaPss { hash, salt_length, .. }, Material::RsaPublic(public)) => {
                Ok(public
                    .verify(pss(*hash, *salt_length), &digest(*hash, data), signature)
                    .is_ok())
            }
            (AlgorithmParams::RsaPss { hash, salt_length, .. }, Material::RsaPrivate(private)) => {
                let public = RsaPublicKey::from(private);
                Ok(public
                    .verify(pss(*hash, *salt_length), &digest(*hash, data), signature)
                    .is_ok())
            }
            (AlgorithmParams::Ecdsa { .. }, Material::P256Public(public)) => {
                use p256::ecdsa::signature::Verifier;
                let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
                    return Ok(false);
                };
                Ok(public.verify(data, &signature).is_ok())
            }
            (AlgorithmParams::Ecdsa { .. }, Material::P256Private(private)) => {
                use p256::ecdsa::signature::Verifier;
                let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
                    return Ok(false);
                };
                Ok(p256::ecdsa::VerifyingKey::from(private).verify(data, &signature).is_ok())
            }
            (AlgorithmParams::Ecdsa { .. }, Material::P384Public(public)) => {
                use p384::ecdsa::signature::Verifier;
                let Ok(signature) = p384::ecdsa::Signature::from_slice(signature) else {
                    return Ok(false);
                };
                Ok(public.verify(data, &signature).is_ok())
            }
            (AlgorithmParams::Ecdsa { .. }, Material::P384Private(private)) => {
                use p384::ecdsa::signature::Verifier;
                let Ok(signature) = p384::ecdsa::Signature::from_slice(signature) else {
                    return Ok(false);
                };
                Ok(p384::ecdsa::VerifyingKey::from(private).verify(data, &signature).is_ok())
            }
            _ => bail!("key does not match verification parameters"),
        }
    }
}

fn material(key: &KeyHandle) -> anyhow::Result<&Material> {
    key.downcast_ref::<Material>().ok_or_else(|| anyhow!("foreign key handle"))
}

fn member(jwk: &Value, name: &str) -> anyhow::Result<Vec<u8>> {
    let encoded = jwk
        .get(name)
        .and_then(Value::as_str)
        .with_context(|| format!("JWK is missing '{name}'"))?;
    Base64UrlUnpadded::decode_vec(encoded).map_err(|e| anyhow!("cannot decode '{name}': {e}"))
}

fn import_rsa(jwk: &Value) -> anyhow::Result<KeyHandle> {
    let n = BigUint::from_bytes_be(&member(jwk, "n")?);
    let e = BigUint::from_bytes_be(&member(jwk, "e")?);
    let bits = u32::try_from(n.bits())?;

    if jwk.get("d").is_some() {
        let d = BigUint::from_bytes_be(&member(jwk, "d")?);
        let p = BigUint::from_bytes_be(&member(jwk, "p")?);
        let q = BigUint::from_bytes_be(&member(jwk, "q")?);
        let private = RsaPrivateKey::from_components(n, e, d, vec![p, q])?;
        return Ok(KeyHandle::with_length(Material::RsaPrivate(private), bits));
    }

    let public = RsaPublicKey::new(n, e)?;
    Ok(KeyHandle::with_length(Material::RsaPublic(public), bits))
}

fn import_ec(jwk: &Value, curve: EllipticCurve) -> anyhow::Result<KeyHandle> {
    // uncompressed SEC1 point for the public half
    let sec1 = || -> anyhow::Result<Vec<u8>> {
        let mut point = vec![0x04];
        point.extend(member(jwk, "x")?);
        point.extend(member(jwk, "y")?);
        Ok(point)
    };

    match curve {
        EllipticCurve::P256 => {
            if jwk.get("d").is_some() {
                let private = p256::ecdsa::SigningKey::from_slice(&member(jwk, "d")?)?;
                return Ok(KeyHandle::with_length(Material::P256Private(private), 256));
            }
            let public = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1()?)?;
            Ok(KeyHandle::with_length(Material::P256Public(public), 256))
        }
        EllipticCurve::P384 => {
            if jwk.get("d").is_some() {
                let private = p384::ecdsa::SigningKey::from_slice(&member(jwk, "d")?)?;
                return Ok(KeyHandle::with_length(Material::P384Private(private), 384));
            }
            let public = p384::ecdsa::VerifyingKey::from_sec1_bytes(&sec1()?)?;
            Ok(KeyHandle::with_length(Material::P384Public(public), 384))
        }
        EllipticCurve::P521 => bail!("P-521 is not supported by this provider"),
    }
}

fn digest(hash: Hash, data: &[u8]) -> Vec<u8> {
    match hash {
        Hash::Sha256 => Sha256::digest(data).to_vec(),
        Hash::Sha384 => Sha384::digest(data).to_vec(),
        Hash::Sha512 => Sha512::digest(data).to_vec(),
    }
}

fn pkcs1v15(hash: Hash) -> Pkcs1v15Sign {
    match hash {
        Hash::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        Hash::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        Hash::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

fn pss(hash: Hash, salt_length: u32) -> Pss {
    match hash {
        Hash::Sha256 => Pss::new_with_salt::<Sha256>(salt_length as usize),
        Hash::Sha384 => Pss::new_with_salt::<Sha384>(salt_length as usize),
        Hash::Sha512 => Pss::new_with_salt::<Sha512>(salt_length as usize),
    }
}

fn hmac_tag(hash: Hash, key: &[u8], data: &[u8]) -> anyhow::Result<Vec<u8>> {
    Ok(match hash {
        Hash::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key)?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Hash::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key)?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Hash::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key)?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
    })
}
