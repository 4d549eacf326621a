//! Relay finalized withdraws from the bridge ledger to an external-chain contract.
//!
//! # Overview
//!
//! Withdraws are finalized on the bridge ledger (at some height, in index order) and must be
//! submitted exactly once to a contract on the external chain. The [Relay] walks the ledger one
//! height at a time, submits every withdraw it finds, and persists a [Cursor] after every
//! submission so that a restarted relay neither resubmits nor skips a withdraw.
//!
//! The relay never talks to a network directly: the ledger ([Chain]) and the external contract
//! ([Contract]) are injected by the caller, which owns any signing authority and connection
//! management.
//!
//! # Delivery
//!
//! A withdraw is submitted before the cursor recording its submission is persisted. A crash
//! between the two resubmits that single withdraw on restart, so contracts should reject
//! withdraws they have already processed.

use bridge_types::{Address, ParseError};
use std::{fmt::Display, future::Future};
use thiserror::Error;

mod config;
pub use config::Config;
mod cursor;
pub use cursor::Cursor;
mod metrics;
mod relay;
pub use relay::Relay;

#[cfg(test)]
mod mocks;

/// A withdraw finalized on the bridge ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdraw {
    /// Height of the block that finalized the withdraw.
    pub height: u64,
    /// Position of the withdraw within its block.
    pub index: u32,
    /// Encoded withdraw, passed to the contract verbatim.
    pub payload: Vec<u8>,
}

/// Read access to finalized withdraws on the bridge ledger.
pub trait Chain: Send + Sync + 'static {
    /// Error returned by the ledger.
    type Error: Display + Send;

    /// Height of the latest finalized block.
    fn latest_height(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Withdraws finalized at `height` (empty if there are none).
    fn withdraws(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<Vec<Withdraw>, Self::Error>> + Send;
}

/// Submission of withdraws to the external chain.
pub trait Contract: Send + Sync + 'static {
    /// Error returned by the external chain.
    type Error: Display + Send;

    /// Submit `withdraw` to the contract at `contract`.
    fn submit(
        &mut self,
        contract: &Address,
        withdraw: &Withdraw,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Errors that can occur when relaying withdraws.
#[derive(Debug, Error)]
pub enum Error {
    #[error("chain unavailable: {0}")]
    Chain(String),
    #[error("submission of withdraw {height}:{index} failed: {reason}")]
    Submit {
        height: u64,
        index: u32,
        reason: String,
    },
    #[error("invalid contract address: {0}")]
    InvalidContract(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
