//! Addresses, deposit proposals, and signed deposit transactions.
//!
//! # Overview
//!
//! A deposit moves value from an external chain onto the replicated ledger. Each approver
//! observes the external chain and submits a [DepositTransaction] attesting to the deposits
//! found at some external block height (a [Proposal]). Once enough approvers (by weight) attest
//! to the same [Proposal], it is executed and the inputs are credited.
//!
//! Every type in this crate has a canonical binary encoding (via [commonware_codec]) so that all
//! validators derive identical digests and signing payloads from identical transactions.
//!
//! # Signatures
//!
//! A [DepositTransaction] may be signed in one of two [signature::Format]s:
//!
//! - [signature::Format::Json]: an Ethereum personal message over the canonical JSON form of
//!   the transaction (what wallets can produce).
//! - [signature::Format::Raw]: a namespaced digest of the canonical binary form.
//!
//! Both recover to an external-chain [Address] using secp256k1 public key recovery.

use bytes::{Buf, BufMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use commonware_utils::{from_hex_formatted, hex};
use std::{fmt, str::FromStr};

mod amount;
pub use amount::Amount;
pub mod deposit;
pub use deposit::{DepositTransaction, Input, Proposal};
pub mod signature;
pub use signature::{Error, Signature, Signer};
mod status;
pub use status::TxStatus;

/// Namespace used to domain-separate [signature::Format::Raw] signatures.
pub const NAMESPACE: &[u8] = b"_BRIDGE_DEPOSIT";

/// Length of an [Address] or [AccountId] in bytes.
const ID_LENGTH: usize = 20;

/// Error returned when parsing an [Address] or [AccountId] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0}")]
pub struct ParseError(String);

macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; ID_LENGTH]);

        impl $name {
            /// Create a new identifier from raw bytes.
            pub const fn new(bytes: [u8; ID_LENGTH]) -> Self {
                Self(bytes)
            }
        }

        impl From<[u8; ID_LENGTH]> for $name {
            fn from(bytes: [u8; ID_LENGTH]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Write for $name {
            fn write(&self, buf: &mut impl BufMut) {
                self.0.write(buf);
            }
        }

        impl Read for $name {
            type Cfg = ();

            fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
                Ok(Self(<[u8; ID_LENGTH]>::read(buf)?))
            }
        }

        impl FixedSize for $name {
            const SIZE: usize = ID_LENGTH;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, hex(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix($prefix).unwrap_or(s);
                let bytes = from_hex_formatted(raw).ok_or_else(|| ParseError(s.to_string()))?;
                let bytes: [u8; ID_LENGTH] =
                    bytes.try_into().map_err(|_| ParseError(s.to_string()))?;
                Ok(Self(bytes))
            }
        }
    };
}

fixed_id!(
    /// An address on the external chain (the last 20 bytes of the Keccak-256 digest of an
    /// uncompressed secp256k1 public key).
    Address,
    "0x"
);

fixed_id!(
    /// An account on the replicated ledger.
    AccountId,
    "acct:"
);

/// Identifier a party uses to name itself when submitting a transaction.
///
/// An [Identifier] must be resolved to an [AccountId] before it can be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    /// An account on the replicated ledger.
    Account(AccountId),
    /// An external-chain address bound to some account.
    Address(Address),
}

impl Write for Identifier {
    fn write(&self, buf: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(buf);
                account.write(buf);
            }
            Self::Address(address) => {
                1u8.write(buf);
                address.write(buf);
            }
        }
    }
}

impl Read for Identifier {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let tag = u8::read(buf)?;
        match tag {
            0 => Ok(Self::Account(AccountId::read(buf)?)),
            1 => Ok(Self::Address(Address::read(buf)?)),
            _ => Err(CodecError::InvalidEnum(tag)),
        }
    }
}

impl FixedSize for Identifier {
    const SIZE: usize = 1 + ID_LENGTH;
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(account) => fmt::Display::fmt(account, f),
            Self::Address(address) => fmt::Display::fmt(address, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};

    #[test]
    fn test_address_parse() {
        let address = Address::from_str("0x00112233445566778899aabbccddeeff00112233").unwrap();
        assert_eq!(address.as_ref()[0], 0x00);
        assert_eq!(address.as_ref()[19], 0x33);
        assert_eq!(
            address.to_string(),
            "0x00112233445566778899aabbccddeeff00112233"
        );

        // Prefix is optional
        let same = Address::from_str("00112233445566778899aabbccddeeff00112233").unwrap();
        assert_eq!(address, same);

        // Wrong length
        assert!(Address::from_str("0x0011").is_err());

        // Not hex
        assert!(Address::from_str("0xzz112233445566778899aabbccddeeff00112233").is_err());
    }

    #[test]
    fn test_account_display() {
        let account = AccountId::new([1u8; ID_LENGTH]);
        let rendered = account.to_string();
        assert!(rendered.starts_with("acct:"));
        assert_eq!(AccountId::from_str(&rendered).unwrap(), account);
    }

    #[test]
    fn test_identifier_codec() {
        let account = Identifier::Account(AccountId::new([7u8; ID_LENGTH]));
        let encoded = account.encode();
        assert_eq!(encoded.len(), Identifier::SIZE);
        assert_eq!(Identifier::decode(encoded).unwrap(), account);

        let address = Identifier::Address(Address::new([9u8; ID_LENGTH]));
        assert_eq!(Identifier::decode(address.encode()).unwrap(), address);

        // Invalid tag
        let mut buf = vec![2u8];
        buf.extend_from_slice(&[0u8; ID_LENGTH]);
        let result = Identifier::decode(&buf[..]);
        assert!(matches!(result, Err(CodecError::InvalidEnum(2))));
    }
}
