//! Admission and application of deposit transactions.

use crate::{Code, Event, Response, Tag, DEPOSIT_HEIGHT, EXECUTION_HEIGHT};
use bridge_ledger::{Digest, Store, View};
use bridge_types::{AccountId, Address, DepositTransaction, Input, TxStatus};
use std::cmp::Ordering;

/// Returns true if `tx` is well-formed.
///
/// A well-formed transaction names a proposer, carries a signature, and approves at least one
/// input, each with a present, non-negative, and in-range value. This check reads no state.
pub fn validate_format(tx: &DepositTransaction) -> bool {
    tx.proposer.is_some()
        && tx.signature.is_some()
        && !tx.proposal.inputs.is_empty()
        && tx.proposal.inputs.iter().all(Input::is_well_formed)
}

/// Returns true if `weight` is strictly more than two-thirds of `total`.
pub fn exceeds_threshold(weight: u64, total: u64) -> bool {
    3 * (weight as u128) > 2 * (total as u128)
}

/// A transaction that passed every check.
struct Admitted {
    account: AccountId,
    proposal: Digest,
}

/// A transaction that failed some check.
struct Rejection {
    code: Code,
    /// The proposer's account (if it was resolved before the failure).
    account: Option<AccountId>,
    event: Event,
}

impl Rejection {
    fn new(tx: &DepositTransaction, code: Code, account: Option<AccountId>) -> Self {
        Self::recovered(tx, code, account, None)
    }

    fn recovered(
        tx: &DepositTransaction,
        code: Code,
        account: Option<AccountId>,
        recovered: Option<Address>,
    ) -> Self {
        Self {
            code,
            account,
            event: Event::Rejected {
                code,
                proposer: tx.proposer,
                nonce: tx.nonce,
                recovered,
            },
        }
    }
}

/// Run every check against `state`, stopping at the first failure.
fn admit<S: View>(state: &S, tx: &DepositTransaction) -> Result<Admitted, Rejection> {
    if !validate_format(tx) {
        return Err(Rejection::new(tx, Code::InvalidFormat, None));
    }
    let Some(account) = tx.proposer.as_ref().and_then(|id| state.resolve(id)) else {
        return Err(Rejection::new(tx, Code::SenderNotRegistered, None));
    };

    // A failed recovery and an address not bound to the account are indistinguishable
    let recovered = tx.recover_address().ok();
    if !recovered.is_some_and(|address| state.has_address(&account, &address)) {
        return Err(Rejection::recovered(
            tx,
            Code::InvalidSignature,
            Some(account),
            recovered,
        ));
    }

    match tx.nonce.cmp(&state.next_nonce(&account)) {
        Ordering::Greater => return Err(Rejection::new(tx, Code::InvalidNonce, Some(account))),
        Ordering::Less => return Err(Rejection::new(tx, Code::Duplicated, Some(account))),
        Ordering::Equal => {}
    }

    let proposal = tx.proposal.digest();
    state
        .check_proposal(&proposal, &account)
        .map_err(|err| Rejection::new(tx, err.into(), Some(account)))?;
    Ok(Admitted { account, proposal })
}

/// Determine whether `tx` would be accepted against `state` without modifying it.
///
/// `state` may lag behind (or run ahead of) the state [deliver_tx] is applied to, so acceptance
/// here does not guarantee acceptance when applied.
pub fn check_tx<S: View>(state: &S, tx: &DepositTransaction) -> Response {
    match admit(state, tx) {
        Ok(_) => Response::accepted(),
        Err(rejection) => Response::rejected(rejection.code, vec![rejection.event]),
    }
}

/// Apply `tx` (included in a block as the transaction with `tx_hash`) to `state`.
///
/// All checks run before any mutation. If a check fails, `state` is left untouched except for
/// the nonce advance of rejections that [Code::consumes_nonce]. If every check passes, the
/// proposer's nonce advances, its approval is recorded, and the proposal is executed if its
/// approvals now carry strictly more than two-thirds of all approver weight.
pub fn deliver_tx<S: Store>(state: &mut S, tx: &DepositTransaction, tx_hash: &Digest) -> Response {
    let Admitted { account, proposal } = match admit(state, tx) {
        Ok(admitted) => admitted,
        Err(rejection) => {
            let mut events = vec![rejection.event];
            if rejection.code.consumes_nonce() {
                if let Some(account) = rejection.account {
                    events.push(advance_nonce(state, &account));
                }
            }
            return Response::rejected(rejection.code, events);
        }
    };

    // Record approval
    let mut events = vec![advance_nonce(state, &account)];
    let weight = state.approve(&proposal, &tx.proposal, tx_hash, &account);
    let total = state.approver_weight_sum();
    events.push(Event::Approved {
        proposal,
        account,
        weight,
        total,
    });

    // The approval is included in the block being built
    let height = state.height().saturating_add(1);
    let mut tags = vec![Tag::height(DEPOSIT_HEIGHT, height)];

    // Execute once the threshold is crossed
    let mut status = TxStatus::Pending;
    if exceeds_threshold(weight, total) && state.execute(&proposal, height) {
        status = TxStatus::Success;
        tags.push(Tag::height(EXECUTION_HEIGHT, height));
        events.push(Event::Executed { proposal, height });
    }
    state.set_tx_status(tx_hash, status);

    Response {
        code: Code::Success,
        tags,
        status: Some(status),
        events,
    }
}

fn advance_nonce<S: Store>(state: &mut S, account: &AccountId) -> Event {
    state.increment_nonce(account);
    Event::NonceAdvanced {
        account: *account,
        next: state.next_nonce(account),
    }
}
