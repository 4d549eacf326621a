use bytes::{Buf, BufMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use std::fmt;

/// Status of a deposit transaction that was applied to the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TxStatus {
    /// The approval was recorded but the proposal has not (yet) been executed.
    Pending,
    /// The approval crossed the threshold and the proposal was executed.
    Success,
}

impl TxStatus {
    /// Stable numeric value of the status.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Pending => 1,
        }
    }
}

impl Write for TxStatus {
    fn write(&self, buf: &mut impl BufMut) {
        self.code().write(buf);
    }
}

impl Read for TxStatus {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let code = u8::read(buf)?;
        match code {
            0 => Ok(Self::Success),
            1 => Ok(Self::Pending),
            _ => Err(CodecError::InvalidEnum(code)),
        }
    }
}

impl FixedSize for TxStatus {
    const SIZE: usize = u8::SIZE;
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};

    #[test]
    fn test_codes() {
        assert_eq!(TxStatus::Success.encode().as_ref(), &[0]);
        assert_eq!(TxStatus::Pending.encode().as_ref(), &[1]);
        assert_eq!(TxStatus::decode(&[1u8][..]).unwrap(), TxStatus::Pending);
        assert!(matches!(
            TxStatus::decode(&[2u8][..]),
            Err(CodecError::InvalidEnum(2))
        ));
    }
}
