use crate::Code;
use bridge_ledger::Digest;
use bridge_types::{AccountId, Address, Identifier};

/// Something that happened while processing a deposit transaction.
///
/// Processing never logs. Callers decide how (and whether) to record events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The transaction was rejected.
    Rejected {
        code: Code,
        proposer: Option<Identifier>,
        nonce: u64,
        /// Address recovered from the signature (if recovery got that far and succeeded).
        recovered: Option<Address>,
    },
    /// The nonce of `account` advanced to `next`.
    NonceAdvanced { account: AccountId, next: u64 },
    /// `account` approved `proposal`, which has now accumulated `weight` of `total`.
    Approved {
        proposal: Digest,
        account: AccountId,
        weight: u64,
        total: u64,
    },
    /// `proposal` was executed at `height`.
    Executed { proposal: Digest, height: u64 },
}
