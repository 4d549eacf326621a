//! Verify, approve, and execute deposit transactions.
//!
//! # Overview
//!
//! Approvers observe deposits on an external chain and submit a [bridge_types::DepositTransaction]
//! approving a [bridge_types::Proposal] (the deposits of one external block). Once approvers
//! holding strictly more than two-thirds of all approver weight approve the same proposal, it is
//! executed and its inputs are credited.
//!
//! Processing happens in two phases:
//!
//! * [check_tx] decides whether a transaction is worth including in a block. It reads an
//!   immutable [bridge_ledger::View] and never mutates anything.
//! * [deliver_tx] applies a transaction included in a block to a [bridge_ledger::Store]. It must
//!   be deterministic: every replica applying the same transactions to the same state reaches the
//!   same result.
//!
//! Both phases run the same checks in the same order and report the first failure as a [Code]:
//!
//! 1. The transaction is well-formed ([validate_format]).
//! 2. The proposer resolves to a registered account.
//! 3. The signature recovers to an address bound to that account.
//! 4. The nonce equals the account's next nonce.
//! 5. The account may approve the proposal (it is an approver, has not already approved it, and
//!    the proposal was not already executed).
//!
//! # Replay Protection
//!
//! Every account carries a nonce that strictly increases. An accepted transaction consumes its
//! nonce. So does a transaction rejected at the final step: it is authentic and ordered, so
//! replaying it must be impossible.
//!
//! # Example
//!
//! ```rust
//! use bridge_deposit::{deliver_tx, Code};
//! use bridge_ledger::Memory;
//! use bridge_types::{
//!     signature::Format, AccountId, Address, DepositTransaction, Identifier, Input, Proposal,
//!     Signer, TxStatus,
//! };
//! use commonware_cryptography::sha256;
//!
//! // Register a lone approver
//! let signer = Signer::from_seed(0);
//! let account = AccountId::new([1; 20]);
//! let mut state = Memory::new();
//! state.register(account, [signer.address()]).unwrap();
//! state.set_approver(account, 1).unwrap();
//!
//! // Approve a deposit
//! let proposal = Proposal {
//!     block_number: 7,
//!     inputs: vec![Input::new(Address::new([2; 20]), 100u64)],
//! };
//! let mut tx = DepositTransaction::new(Identifier::Address(signer.address()), proposal, 0);
//! tx.signature = Some(signer.sign(&tx, Format::Json));
//!
//! let response = deliver_tx(&mut state, &tx, &sha256::hash(b"tx"));
//! assert_eq!(response.code, Code::Success);
//! assert_eq!(response.status, Some(TxStatus::Success));
//! ```

mod application;
pub use application::{Application, Config};
mod event;
pub use event::Event;
mod processor;
pub use processor::{check_tx, deliver_tx, exceeds_threshold, validate_format};
mod response;
pub use response::{Code, Response, Tag, DEPOSIT_HEIGHT, EXECUTION_HEIGHT};
