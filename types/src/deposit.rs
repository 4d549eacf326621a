//! Deposit proposals and the transaction used to approve them.

use crate::{signature, Address, Amount, Identifier, Signature};
use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::sha256::{self, Digest};
use serde_json::{json, Value};

/// Maximum number of [Input]s a [Proposal] may carry.
pub const MAX_INPUTS: usize = 1024;

/// A single deposit observed on the external chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Input {
    /// The external-chain address that made the deposit (and is credited once executed).
    pub from: Address,
    /// The deposited value (absent values are rejected as malformed).
    pub value: Option<Amount>,
}

impl Input {
    /// Create a new [Input] with a value.
    pub fn new(from: Address, value: impl Into<Amount>) -> Self {
        Self {
            from,
            value: Some(value.into()),
        }
    }

    /// Returns true if the value is present and within range.
    pub fn is_well_formed(&self) -> bool {
        self.value.as_ref().is_some_and(Amount::is_within_range)
    }
}

impl Write for Input {
    fn write(&self, buf: &mut impl BufMut) {
        self.from.write(buf);
        self.value.write(buf);
    }
}

impl Read for Input {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let from = Address::read(buf)?;
        let value = Option::<Amount>::read(buf)?;
        Ok(Self { from, value })
    }
}

impl EncodeSize for Input {
    fn encode_size(&self) -> usize {
        Address::SIZE + self.value.encode_size()
    }
}

/// A claim that the listed deposits occurred at some external block height.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Proposal {
    /// Height of the external block being attested.
    pub block_number: u64,
    /// Deposits found in the block, in the order they occurred.
    pub inputs: Vec<Input>,
}

impl Proposal {
    /// Content digest of the proposal.
    ///
    /// Approvals from different approvers accumulate against the same digest, so two
    /// transactions approve the same proposal iff they carry byte-identical proposals.
    pub fn digest(&self) -> Digest {
        sha256::hash(&self.encode())
    }
}

impl Write for Proposal {
    fn write(&self, buf: &mut impl BufMut) {
        self.block_number.write(buf);
        (self.inputs.len() as u32).write(buf);
        for input in &self.inputs {
            input.write(buf);
        }
    }
}

impl Read for Proposal {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let block_number = u64::read(buf)?;
        let len = u32::read(buf)? as usize;
        if len > MAX_INPUTS {
            return Err(CodecError::InvalidLength(len));
        }
        let mut inputs = Vec::with_capacity(len);
        for _ in 0..len {
            inputs.push(Input::read(buf)?);
        }
        Ok(Self {
            block_number,
            inputs,
        })
    }
}

impl EncodeSize for Proposal {
    fn encode_size(&self) -> usize {
        u64::SIZE + u32::SIZE + self.inputs.iter().map(EncodeSize::encode_size).sum::<usize>()
    }
}

/// A signed approval of a [Proposal].
///
/// `proposer` and `signature` are optional on the wire so that a transaction missing either
/// still decodes and can be rejected as malformed (rather than failing to parse).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositTransaction {
    /// Identifier of the submitting approver.
    pub proposer: Option<Identifier>,
    /// The deposits being approved.
    pub proposal: Proposal,
    /// The proposer's expected account nonce.
    pub nonce: u64,
    /// Signature over everything but the signature itself.
    pub signature: Option<Signature>,
}

impl DepositTransaction {
    /// Create an unsigned transaction.
    pub fn new(proposer: Identifier, proposal: Proposal, nonce: u64) -> Self {
        Self {
            proposer: Some(proposer),
            proposal,
            nonce,
            signature: None,
        }
    }

    /// Canonical binary encoding of everything but the signature.
    pub fn unsigned_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            self.proposer.encode_size() + self.proposal.encode_size() + u64::SIZE,
        );
        self.proposer.write(&mut buf);
        self.proposal.write(&mut buf);
        self.nonce.write(&mut buf);
        buf
    }

    /// Canonical JSON encoding of everything but the signature.
    ///
    /// Keys are emitted in sorted order and values are rendered as strings where a wallet would
    /// otherwise lose precision.
    pub fn json_payload(&self) -> String {
        let inputs: Vec<Value> = self
            .proposal
            .inputs
            .iter()
            .map(|input| {
                json!({
                    "fromAddr": input.from.to_string(),
                    "value": input.value.as_ref().map(ToString::to_string),
                })
            })
            .collect();
        json!({
            "blockNumber": self.proposal.block_number,
            "identity": self.proposer.as_ref().map(ToString::to_string),
            "inputs": inputs,
            "nonce": self.nonce,
        })
        .to_string()
    }

    /// Recover the external-chain address that signed the transaction.
    pub fn recover_address(&self) -> Result<Address, signature::Error> {
        let signature = self
            .signature
            .as_ref()
            .ok_or(signature::Error::MissingSignature)?;
        signature.recover_address(self)
    }
}

impl Write for DepositTransaction {
    fn write(&self, buf: &mut impl BufMut) {
        self.proposer.write(buf);
        self.proposal.write(buf);
        self.nonce.write(buf);
        self.signature.write(buf);
    }
}

impl Read for DepositTransaction {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let proposer = Option::<Identifier>::read(buf)?;
        let proposal = Proposal::read(buf)?;
        let nonce = u64::read(buf)?;
        let signature = Option::<Signature>::read(buf)?;
        Ok(Self {
            proposer,
            proposal,
            nonce,
            signature,
        })
    }
}

impl EncodeSize for DepositTransaction {
    fn encode_size(&self) -> usize {
        self.proposer.encode_size()
            + self.proposal.encode_size()
            + u64::SIZE
            + self.signature.encode_size()
    }
}
