//! In-memory implementation of the ledger traits.

use crate::{
    Accounts, AccountsMut, Digest, ProposalError, Proposals, ProposalsMut, Statuses,
    StatusesMut, View,
};
use bridge_types::{AccountId, Address, Identifier, Proposal, TxStatus};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur when configuring a [Memory] ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("address {0} already bound to {1}")]
    AddressTaken(Address, AccountId),
    #[error("total approver weight overflows")]
    WeightOverflow,
}

#[derive(Clone, Debug, Default)]
struct Account {
    addresses: BTreeSet<Address>,
    next_nonce: u64,
}

/// A deposit proposal and the approvals it has accumulated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// The proposal being approved.
    pub proposal: Proposal,
    /// Approvers and the transaction each approval arrived in.
    pub approvals: BTreeMap<AccountId, Digest>,
    /// Weight accumulated from `approvals` (at the time of each approval).
    pub weight: u64,
    /// Height at which the proposal was executed (if it has been).
    pub executed: Option<u64>,
}

/// Ledger state held entirely in ordered maps.
///
/// [Memory] is [Clone], so a snapshot taken before applying transactions serves as an isolated
/// admission view that later mutation cannot affect.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    height: u64,
    accounts: BTreeMap<AccountId, Account>,
    addresses: BTreeMap<Address, AccountId>,
    approvers: BTreeMap<AccountId, u64>,
    proposals: BTreeMap<Digest, Record>,
    balances: BTreeMap<Address, BigInt>,
    statuses: BTreeMap<Digest, TxStatus>,
}

impl Memory {
    /// Create an empty ledger at height 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `account` (if new) and authorize `addresses` to sign for it.
    pub fn register(
        &mut self,
        account: AccountId,
        addresses: impl IntoIterator<Item = Address>,
    ) -> Result<(), Error> {
        let addresses: Vec<Address> = addresses.into_iter().collect();
        for address in &addresses {
            if let Some(owner) = self.addresses.get(address) {
                if *owner != account {
                    return Err(Error::AddressTaken(*address, *owner));
                }
            }
        }
        let entry = self.accounts.entry(account).or_default();
        for address in addresses {
            entry.addresses.insert(address);
            self.addresses.insert(address, account);
        }
        Ok(())
    }

    /// Set the approval weight of `account` (a weight of zero removes it as an approver).
    ///
    /// The total weight of all approvers must fit in a `u64`.
    pub fn set_approver(&mut self, account: AccountId, weight: u64) -> Result<(), Error> {
        if weight == 0 {
            self.approvers.remove(&account);
            return Ok(());
        }
        self.approvers
            .iter()
            .filter(|(approver, _)| **approver != account)
            .try_fold(weight, |sum, (_, weight)| sum.checked_add(*weight))
            .ok_or(Error::WeightOverflow)?;
        self.approvers.insert(account, weight);
        Ok(())
    }

    /// Set the nonce the next transaction from `account` must carry.
    pub fn set_next_nonce(&mut self, account: &AccountId, nonce: u64) {
        self.accounts.entry(*account).or_default().next_nonce = nonce;
    }

    /// Set the height of the last committed block.
    pub fn set_height(&mut self, height: u64) {
        self.height = height;
    }

    /// Commit the current block (advancing the height by one).
    pub fn commit(&mut self) {
        self.height += 1;
    }

    /// The record of the proposal with content digest `id`.
    pub fn proposal(&self, id: &Digest) -> Option<&Record> {
        self.proposals.get(id)
    }

    /// The balance credited to `address` by executed proposals.
    pub fn balance(&self, address: &Address) -> BigInt {
        self.balances.get(address).cloned().unwrap_or_default()
    }
}

impl Accounts for Memory {
    fn resolve(&self, identifier: &Identifier) -> Option<AccountId> {
        match identifier {
            Identifier::Account(account) => self.accounts.contains_key(account).then_some(*account),
            Identifier::Address(address) => self.addresses.get(address).copied(),
        }
    }

    fn has_address(&self, account: &AccountId, address: &Address) -> bool {
        self.accounts
            .get(account)
            .is_some_and(|entry| entry.addresses.contains(address))
    }

    fn next_nonce(&self, account: &AccountId) -> u64 {
        self.accounts
            .get(account)
            .map(|entry| entry.next_nonce)
            .unwrap_or_default()
    }
}

impl AccountsMut for Memory {
    fn increment_nonce(&mut self, account: &AccountId) {
        self.accounts.entry(*account).or_default().next_nonce += 1;
    }
}

impl Proposals for Memory {
    fn check_proposal(&self, id: &Digest, signer: &AccountId) -> Result<(), ProposalError> {
        if !self.approvers.contains_key(signer) {
            return Err(ProposalError::NotApprover);
        }
        let Some(record) = self.proposals.get(id) else {
            return Ok(());
        };
        if record.approvals.contains_key(signer) {
            return Err(ProposalError::DoubleApproval);
        }
        if record.executed.is_some() {
            return Err(ProposalError::AlreadyExecuted);
        }
        Ok(())
    }

    fn approver_weight_sum(&self) -> u64 {
        // Bounded by set_approver
        self.approvers.values().sum()
    }
}

impl ProposalsMut for Memory {
    fn approve(
        &mut self,
        id: &Digest,
        proposal: &Proposal,
        tx_hash: &Digest,
        signer: &AccountId,
    ) -> u64 {
        let weight = self.approvers.get(signer).copied().unwrap_or_default();
        let record = self.proposals.entry(*id).or_insert_with(|| Record {
            proposal: proposal.clone(),
            approvals: BTreeMap::new(),
            weight: 0,
            executed: None,
        });
        if !record.approvals.contains_key(signer) {
            record.approvals.insert(*signer, *tx_hash);
            record.weight = record.weight.saturating_add(weight);
        }
        record.weight
    }

    fn execute(&mut self, id: &Digest, height: u64) -> bool {
        let Some(record) = self.proposals.get_mut(id) else {
            return false;
        };
        if record.executed.is_some() {
            return false;
        }
        record.executed = Some(height);
        for input in &record.proposal.inputs {
            let Some(value) = &input.value else {
                continue;
            };
            *self.balances.entry(input.from).or_default() += value.as_bigint();
        }
        true
    }
}

impl Statuses for Memory {
    fn tx_status(&self, tx_hash: &Digest) -> Option<TxStatus> {
        self.statuses.get(tx_hash).copied()
    }
}

impl StatusesMut for Memory {
    fn set_tx_status(&mut self, tx_hash: &Digest, status: TxStatus) {
        self.statuses.insert(*tx_hash, status);
    }
}

impl View for Memory {
    fn height(&self) -> u64 {
        self.height
    }
}
