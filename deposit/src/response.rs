//! Outcomes of deposit processing.

use crate::Event;
use bridge_ledger::ProposalError;
use bridge_types::TxStatus;
use std::fmt;

/// Tag recording the height at which an approval was recorded.
pub const DEPOSIT_HEIGHT: &str = "deposit.height";

/// Tag recording the height at which a proposal was executed.
pub const EXECUTION_HEIGHT: &str = "deposit_execution.height";

/// Result code of processing a deposit transaction.
///
/// Numeric values are part of committed block metadata and must never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    /// The transaction was accepted.
    Success,
    /// The transaction is missing a field or carries an out-of-range value.
    InvalidFormat,
    /// The proposer does not resolve to an account.
    SenderNotRegistered,
    /// The signature does not recover to an address of the proposer.
    InvalidSignature,
    /// The nonce is ahead of the proposer's next nonce.
    InvalidNonce,
    /// The nonce was already consumed.
    Duplicated,
    /// The proposer may not approve deposits.
    NotApprover,
    /// The proposer already approved this proposal.
    DoubleApproval,
    /// The proposal was already executed.
    AlreadyExecuted,
}

impl Code {
    /// Stable numeric value of the code (`0` means accepted).
    pub const fn value(&self) -> u32 {
        match self {
            Self::Success => 0,
            Self::InvalidFormat => 1,
            Self::SenderNotRegistered => 2,
            Self::InvalidSignature => 3,
            Self::InvalidNonce => 4,
            Self::Duplicated => 5,
            Self::NotApprover => 6,
            Self::DoubleApproval => 7,
            Self::AlreadyExecuted => 8,
        }
    }

    /// Human-readable description of the code.
    pub const fn info(&self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::InvalidFormat => "Invalid deposit transaction format",
            Self::SenderNotRegistered => "Sender of deposit transaction is not registered",
            Self::InvalidSignature => "Invalid deposit transaction signature",
            Self::InvalidNonce => "Invalid deposit transaction nonce",
            Self::Duplicated => "Duplicated deposit transaction",
            Self::NotApprover => "Sender of deposit transaction is not an approver",
            Self::DoubleApproval => "Deposit proposal already approved by sender",
            Self::AlreadyExecuted => "Deposit proposal already executed",
        }
    }

    /// Returns true if a transaction rejected with this code still consumes its nonce when
    /// applied.
    ///
    /// Only business-rule rejections (which are authentic and carry the expected nonce) consume
    /// a nonce. Format, identity, signature, and ordering failures leave it untouched.
    pub const fn consumes_nonce(&self) -> bool {
        matches!(
            self,
            Self::NotApprover | Self::DoubleApproval | Self::AlreadyExecuted
        )
    }
}

impl From<ProposalError> for Code {
    fn from(error: ProposalError) -> Self {
        match error {
            ProposalError::NotApprover => Self::NotApprover,
            ProposalError::DoubleApproval => Self::DoubleApproval,
            ProposalError::AlreadyExecuted => Self::AlreadyExecuted,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.info(), self.value())
    }
}

/// A key-value pair attached to a processed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub key: &'static str,
    pub value: String,
}

impl Tag {
    /// Create a tag recording `height`.
    pub fn height(key: &'static str, height: u64) -> Self {
        Self {
            key,
            value: height.to_string(),
        }
    }
}

/// The outcome of processing a deposit transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Result code.
    pub code: Code,
    /// Metadata to index the transaction by (only populated when applied).
    pub tags: Vec<Tag>,
    /// Status of the applied transaction (only populated when applied successfully).
    pub status: Option<TxStatus>,
    /// What happened while processing the transaction.
    pub events: Vec<Event>,
}

impl Response {
    /// A rejection with `code`.
    pub fn rejected(code: Code, events: Vec<Event>) -> Self {
        Self {
            code,
            tags: Vec::new(),
            status: None,
            events,
        }
    }

    /// An acceptance without side effects (as returned during admission).
    pub fn accepted() -> Self {
        Self {
            code: Code::Success,
            tags: Vec::new(),
            status: None,
            events: Vec::new(),
        }
    }

    /// Returns true if the transaction was accepted.
    pub fn is_ok(&self) -> bool {
        self.code == Code::Success
    }

    /// The value of the tag with `key` (if present).
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}
