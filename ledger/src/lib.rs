//! Account, proposal, and status stores consumed by deposit processing.
//!
//! # Overview
//!
//! Deposit processing owns no state of its own. Everything durable (accounts and their nonces,
//! deposit proposals and their approvals, transaction statuses) lives behind the traits in this
//! crate, which the surrounding replicated state machine implements over its committed state.
//!
//! Read access ([View]) is all that is required to decide whether a transaction would be
//! accepted. Mutation ([Store]) is only required when a transaction is applied during consensus.
//!
//! # Determinism
//!
//! Every method must be a pure function of the current state: implementations must not read
//! clocks, iterate over unordered collections, or call out to external services. [Memory] is a
//! reference implementation built entirely from ordered maps.

use bridge_types::{AccountId, Address, Identifier, Proposal, TxStatus};
use thiserror::Error;

pub use commonware_cryptography::sha256::Digest;

pub mod memory;
pub use memory::{Memory, Record};

/// Reasons a proposal ledger refuses an approval.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProposalError {
    #[error("signer is not an approver")]
    NotApprover,
    #[error("signer already approved proposal")]
    DoubleApproval,
    #[error("proposal already executed")]
    AlreadyExecuted,
}

/// Resolves identifiers to accounts and tracks account nonces.
pub trait Accounts {
    /// Resolve an [Identifier] to an account (if registered).
    fn resolve(&self, identifier: &Identifier) -> Option<AccountId>;

    /// Returns true if `address` is authorized to sign for `account`.
    fn has_address(&self, account: &AccountId, address: &Address) -> bool;

    /// The nonce the next transaction from `account` must carry.
    fn next_nonce(&self, account: &AccountId) -> u64;
}

/// Mutable access to [Accounts].
pub trait AccountsMut: Accounts {
    /// Advance the nonce of `account` by exactly one.
    fn increment_nonce(&mut self, account: &AccountId);
}

/// Read access to deposit proposals and the approver set.
pub trait Proposals {
    /// Determine whether `signer` may approve the proposal with content digest `id`.
    ///
    /// Checks are applied in order: [ProposalError::NotApprover],
    /// [ProposalError::DoubleApproval], then [ProposalError::AlreadyExecuted].
    fn check_proposal(&self, id: &Digest, signer: &AccountId) -> Result<(), ProposalError>;

    /// Sum of the weight of all eligible approvers.
    fn approver_weight_sum(&self) -> u64;
}

/// Mutable access to [Proposals].
pub trait ProposalsMut: Proposals {
    /// Record an approval from `signer` (creating the proposal on first sight) and return the
    /// weight accumulated by the proposal.
    ///
    /// `tx_hash` identifies the transaction that carried the approval.
    fn approve(
        &mut self,
        id: &Digest,
        proposal: &Proposal,
        tx_hash: &Digest,
        signer: &AccountId,
    ) -> u64;

    /// Execute the proposal (crediting its inputs) at `height`.
    ///
    /// Returns false (and does nothing) if the proposal is unknown or was already executed.
    fn execute(&mut self, id: &Digest, height: u64) -> bool;
}

/// Read access to the status of applied transactions.
pub trait Statuses {
    /// The status recorded for the transaction with `tx_hash` (if any).
    fn tx_status(&self, tx_hash: &Digest) -> Option<TxStatus>;
}

/// Mutable access to [Statuses].
pub trait StatusesMut: Statuses {
    /// Record the status of the transaction with `tx_hash`.
    fn set_tx_status(&mut self, tx_hash: &Digest, status: TxStatus);
}

/// An immutable view of committed state.
pub trait View: Accounts + Proposals + Statuses {
    /// Height of the last committed block.
    ///
    /// Always below `u64::MAX` (the block being built is at `height() + 1`).
    fn height(&self) -> u64;
}

/// A mutable view of state, used while applying a block.
pub trait Store: View + AccountsMut + ProposalsMut + StatusesMut {}

impl<T: View + AccountsMut + ProposalsMut + StatusesMut> Store for T {}
