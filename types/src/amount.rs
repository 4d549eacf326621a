use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};
use num_bigint::{BigInt, Sign};
use std::fmt;

/// Maximum number of magnitude bytes an [Amount] may hold.
///
/// This is looser than [Amount::is_within_range] so that out-of-range values still decode (and
/// are rejected as malformed by the caller) rather than failing to parse.
const MAX_MAGNITUDE_BYTES: usize = 64;

/// Number of bits an in-range [Amount] may occupy.
const MAX_BITS: u64 = 256;

/// An arbitrary-precision integer value carried by a deposit.
///
/// Values are not range-checked on construction or decoding: a transaction may carry a negative
/// or oversized value, which is detected with [Amount::is_within_range]. The magnitude is bounded
/// by [MAX_MAGNITUDE_BYTES] and every value has exactly one encoding.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigInt);

impl Amount {
    /// Create an [Amount] from an integer, returning `None` if its magnitude does not fit in
    /// [MAX_MAGNITUDE_BYTES] bytes.
    pub fn new(value: BigInt) -> Option<Self> {
        if value.bits() > (MAX_MAGNITUDE_BYTES * 8) as u64 {
            return None;
        }
        Some(Self(value))
    }

    /// Returns true if the value is non-negative and fits in 256 bits.
    pub fn is_within_range(&self) -> bool {
        self.0.sign() != Sign::Minus && self.0.bits() <= MAX_BITS
    }

    /// Returns the underlying integer.
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    /// Big-endian magnitude without leading zeros (empty for zero).
    fn magnitude(&self) -> Vec<u8> {
        if self.0.sign() == Sign::NoSign {
            return Vec::new();
        }
        self.0.magnitude().to_bytes_be()
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigInt::from(value))
    }
}

impl Write for Amount {
    fn write(&self, buf: &mut impl BufMut) {
        let magnitude = self.magnitude();
        let negative = self.0.sign() == Sign::Minus;
        negative.write(buf);
        // Bounded by MAX_MAGNITUDE_BYTES
        debug_assert!(magnitude.len() <= MAX_MAGNITUDE_BYTES);
        (magnitude.len() as u8).write(buf);
        buf.put_slice(&magnitude);
    }
}

impl Read for Amount {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let negative = bool::read(buf)?;
        let len = u8::read(buf)? as usize;
        if len > MAX_MAGNITUDE_BYTES {
            return Err(CodecError::InvalidLength(len));
        }
        if buf.remaining() < len {
            return Err(CodecError::EndOfBuffer);
        }
        let mut magnitude = vec![0u8; len];
        buf.copy_to_slice(&mut magnitude);
        if magnitude.first() == Some(&0) {
            return Err(CodecError::Invalid("Amount", "leading zero"));
        }
        if negative && magnitude.is_empty() {
            return Err(CodecError::Invalid("Amount", "negative zero"));
        }
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(Self(BigInt::from_bytes_be(sign, &magnitude)))
    }
}

impl EncodeSize for Amount {
    fn encode_size(&self) -> usize {
        bool::SIZE + u8::SIZE + self.magnitude().len()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
