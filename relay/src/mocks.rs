//! Mock ledger and contract clients.

use crate::Withdraw;
use bridge_types::Address;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unavailable")]
pub struct Unavailable;

#[derive(Default)]
struct Ledger {
    latest: u64,
    withdraws: BTreeMap<u64, Vec<Withdraw>>,
    unavailable: bool,
}

/// A ledger whose finalized blocks are set by the test.
#[derive(Clone, Default)]
pub struct Chain {
    ledger: Arc<Mutex<Ledger>>,
}

impl Chain {
    /// Finalize `height` with `count` withdraws (listed in reverse index order).
    pub fn finalize(&self, height: u64, count: u32) {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.latest = ledger.latest.max(height);
        let withdraws = (0..count).rev().map(|index| withdraw(height, index)).collect();
        ledger.withdraws.insert(height, withdraws);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.ledger.lock().unwrap().unavailable = unavailable;
    }
}

impl crate::Chain for Chain {
    type Error = Unavailable;

    async fn latest_height(&self) -> Result<u64, Unavailable> {
        let ledger = self.ledger.lock().unwrap();
        if ledger.unavailable {
            return Err(Unavailable);
        }
        Ok(ledger.latest)
    }

    async fn withdraws(&self, height: u64) -> Result<Vec<Withdraw>, Unavailable> {
        let ledger = self.ledger.lock().unwrap();
        if ledger.unavailable {
            return Err(Unavailable);
        }
        Ok(ledger.withdraws.get(&height).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct Submissions {
    accepted: Vec<(Address, Withdraw)>,
    limit: Option<usize>,
}

/// A contract that records every submission.
#[derive(Clone, Default)]
pub struct Contract {
    submissions: Arc<Mutex<Submissions>>,
}

impl Contract {
    /// Reject every submission once `limit` have been accepted (`None` accepts everything).
    pub fn set_limit(&self, limit: Option<usize>) {
        self.submissions.lock().unwrap().limit = limit;
    }

    /// Accepted submissions, in order.
    pub fn accepted(&self) -> Vec<(Address, Withdraw)> {
        self.submissions.lock().unwrap().accepted.clone()
    }
}

impl crate::Contract for Contract {
    type Error = Unavailable;

    async fn submit(&mut self, contract: &Address, withdraw: &Withdraw) -> Result<(), Unavailable> {
        let mut submissions = self.submissions.lock().unwrap();
        if submissions
            .limit
            .is_some_and(|limit| submissions.accepted.len() >= limit)
        {
            return Err(Unavailable);
        }
        submissions.accepted.push((*contract, withdraw.clone()));
        Ok(())
    }
}

/// The withdraw at (`height`, `index`).
pub fn withdraw(height: u64, index: u32) -> Withdraw {
    Withdraw {
        height,
        index,
        payload: format!("{height}:{index}").into_bytes(),
    }
}
