//! Recoverable secp256k1 signatures over deposit transactions.
//!
//! A [Signature] names the [Format] of the signed payload alongside the 65-byte
//! `r || s || v` signature. Format-specific payload construction is kept in [Format::prehash]
//! so that recovery is identical for every format.

use crate::{Address, DepositTransaction, NAMESPACE};
use bytes::{Buf, BufMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::sha256;
use commonware_utils::{hex, union_unique};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SecretKey, SECP256K1,
};
use sha3::{Digest as _, Keccak256};
use std::fmt;
use thiserror::Error;

/// Length of a recoverable signature (`r || s || v`).
pub const SIGNATURE_LENGTH: usize = 65;

/// Prefix Ethereum wallets apply to personal messages before hashing.
const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Errors that can occur when recovering a signer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("missing signature")]
    MissingSignature,
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("malformed signature")]
    MalformedSignature,
    #[error("unable to recover public key")]
    Recovery,
}

/// Payload a [Signature] commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Ethereum personal message over [DepositTransaction::json_payload].
    Json,
    /// [NAMESPACE]-separated [DepositTransaction::unsigned_payload].
    Raw,
}

impl Format {
    /// Compute the Keccak-256 prehash that is signed for `tx`.
    pub fn prehash(&self, tx: &DepositTransaction) -> [u8; 32] {
        match self {
            Self::Json => {
                let payload = tx.json_payload();
                let mut hasher = Keccak256::new();
                hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
                hasher.update(payload.len().to_string().as_bytes());
                hasher.update(payload.as_bytes());
                hasher.finalize().into()
            }
            Self::Raw => {
                let payload = union_unique(NAMESPACE, &tx.unsigned_payload());
                Keccak256::digest(&payload).into()
            }
        }
    }
}

/// A 65-byte `r || s || v` secp256k1 signature.
///
/// `v` may be either `0`/`1` or the Ethereum-style `27`/`28`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recoverable([u8; SIGNATURE_LENGTH]);

impl Recoverable {
    /// Wrap raw signature bytes (validated during recovery).
    pub const fn new(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Recover the [Address] that produced this signature over `prehash`.
    pub fn recover(&self, prehash: &[u8; 32]) -> Result<Address, Error> {
        let v = self.0[SIGNATURE_LENGTH - 1];
        let id = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            _ => return Err(Error::InvalidRecoveryId(v)),
        };
        let id = RecoveryId::from_i32(id as i32).map_err(|_| Error::InvalidRecoveryId(v))?;
        let signature =
            RecoverableSignature::from_compact(&self.0[..SIGNATURE_LENGTH - 1], id)
                .map_err(|_| Error::MalformedSignature)?;
        let message = Message::from_digest(*prehash);
        let public = SECP256K1
            .recover_ecdsa(&message, &signature)
            .map_err(|_| Error::Recovery)?;
        Ok(address(&public))
    }
}

impl AsRef<[u8]> for Recoverable {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Write for Recoverable {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for Recoverable {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        Ok(Self(<[u8; SIGNATURE_LENGTH]>::read(buf)?))
    }
}

impl FixedSize for Recoverable {
    const SIZE: usize = SIGNATURE_LENGTH;
}

impl fmt::Debug for Recoverable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex(&self.0))
    }
}

/// A signature over a [DepositTransaction] in some [Format].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signature {
    /// Signature over the JSON payload.
    Json(Recoverable),
    /// Signature over the binary payload.
    Raw(Recoverable),
}

impl Signature {
    /// The [Format] this signature commits to.
    pub fn format(&self) -> Format {
        match self {
            Self::Json(_) => Format::Json,
            Self::Raw(_) => Format::Raw,
        }
    }

    /// Recover the [Address] that signed `tx`.
    pub fn recover_address(&self, tx: &DepositTransaction) -> Result<Address, Error> {
        let prehash = self.format().prehash(tx);
        match self {
            Self::Json(signature) | Self::Raw(signature) => signature.recover(&prehash),
        }
    }
}

impl Write for Signature {
    fn write(&self, buf: &mut impl BufMut) {
        match self {
            Self::Json(signature) => {
                0u8.write(buf);
                signature.write(buf);
            }
            Self::Raw(signature) => {
                1u8.write(buf);
                signature.write(buf);
            }
        }
    }
}

impl Read for Signature {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let tag = u8::read(buf)?;
        match tag {
            0 => Ok(Self::Json(Recoverable::read(buf)?)),
            1 => Ok(Self::Raw(Recoverable::read(buf)?)),
            _ => Err(CodecError::InvalidEnum(tag)),
        }
    }
}

impl FixedSize for Signature {
    const SIZE: usize = 1 + SIGNATURE_LENGTH;
}

/// Derive the external-chain [Address] of a public key.
fn address(public: &PublicKey) -> Address {
    let uncompressed = public.serialize_uncompressed();
    let digest: [u8; 32] = Keccak256::digest(&uncompressed[1..]).into();
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::new(bytes)
}

/// A secp256k1 key that signs deposit transactions.
#[derive(Clone)]
pub struct Signer {
    key: SecretKey,
}

impl Signer {
    /// Create a [Signer] from an existing secret key.
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Deterministically derive a [Signer] from a seed (useful for tests and simulations).
    pub fn from_seed(seed: u64) -> Self {
        let mut counter = 0u64;
        loop {
            let mut material = seed.to_be_bytes().to_vec();
            material.extend_from_slice(&counter.to_be_bytes());
            let digest = sha256::hash(&material);
            if let Ok(key) = SecretKey::from_slice(digest.as_ref()) {
                return Self { key };
            }
            counter += 1;
        }
    }

    /// The external-chain [Address] of this key.
    pub fn address(&self) -> Address {
        address(&PublicKey::from_secret_key(SECP256K1, &self.key))
    }

    /// Sign `tx` in the given [Format] (any existing signature is ignored).
    pub fn sign(&self, tx: &DepositTransaction, format: Format) -> Signature {
        let message = Message::from_digest(format.prehash(tx));
        let (id, compact) = SECP256K1
            .sign_ecdsa_recoverable(&message, &self.key)
            .serialize_compact();
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..SIGNATURE_LENGTH - 1].copy_from_slice(&compact);
        let id = id.to_i32() as u8;
        match format {
            Format::Json => {
                // Wallets emit Ethereum-style recovery ids
                bytes[SIGNATURE_LENGTH - 1] = id + 27;
                Signature::Json(Recoverable(bytes))
            }
            Format::Raw => {
                bytes[SIGNATURE_LENGTH - 1] = id;
                Signature::Raw(Recoverable(bytes))
            }
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address())
            .finish()
    }
}
