//! Entry point for encoded deposit transactions.

use crate::{check_tx, deliver_tx, Code, Event, Response};
use bridge_ledger::{Store, View};
use bridge_types::DepositTransaction;
use commonware_codec::DecodeExt;
use commonware_cryptography::sha256;
use tracing::{debug, info};

/// Configuration for an [Application].
#[derive(Clone, Debug)]
pub struct Config {
    /// Largest encoded transaction accepted (larger transactions are rejected as malformed).
    pub max_transaction_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_transaction_size: 64 * 1024,
        }
    }
}

/// Decodes raw transactions and routes them to [check_tx] or [deliver_tx].
#[derive(Clone, Debug)]
pub struct Application {
    cfg: Config,
}

impl Application {
    /// Create a new [Application].
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    fn decode(&self, raw: &[u8]) -> Option<DepositTransaction> {
        if raw.len() > self.cfg.max_transaction_size {
            debug!(
                size = raw.len(),
                max = self.cfg.max_transaction_size,
                "transaction too large"
            );
            return None;
        }
        match DepositTransaction::decode(raw) {
            Ok(tx) => Some(tx),
            Err(err) => {
                debug!(?err, "failed to decode transaction");
                None
            }
        }
    }

    /// Determine whether the encoded transaction `raw` would be accepted against `state`.
    pub fn check<S: View>(&self, state: &S, raw: &[u8]) -> Response {
        let Some(tx) = self.decode(raw) else {
            return Response::rejected(Code::InvalidFormat, Vec::new());
        };
        let response = check_tx(state, &tx);
        log(&response.events);
        response
    }

    /// Apply the encoded transaction `raw` to `state`.
    ///
    /// The transaction is identified by the SHA-256 digest of `raw`.
    pub fn deliver<S: Store>(&self, state: &mut S, raw: &[u8]) -> Response {
        let Some(tx) = self.decode(raw) else {
            return Response::rejected(Code::InvalidFormat, Vec::new());
        };
        let tx_hash = sha256::hash(raw);
        let response = deliver_tx(state, &tx, &tx_hash);
        log(&response.events);
        response
    }
}

fn log(events: &[Event]) {
    for event in events {
        match event {
            Event::Rejected {
                code,
                proposer,
                nonce,
                recovered,
            } => {
                debug!(%code, ?proposer, nonce, ?recovered, "rejected deposit");
            }
            Event::NonceAdvanced { account, next } => {
                debug!(%account, next, "advanced nonce");
            }
            Event::Approved {
                proposal,
                account,
                weight,
                total,
            } => {
                info!(?proposal, %account, weight, total, "approved deposit");
            }
            Event::Executed { proposal, height } => {
                info!(?proposal, height, "executed deposit");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_ledger::{Accounts, Memory, Statuses};
    use bridge_types::{
        signature::Format, AccountId, Address, Identifier, Input, Proposal, Signer,
    };
    use commonware_codec::Encode;
    use commonware_macros::test_traced;

    fn setup() -> (Memory, Signer, AccountId) {
        let mut state = Memory::new();
        let signer = Signer::from_seed(0);
        let account = AccountId::new([1; 20]);
        state.register(account, [signer.address()]).unwrap();
        state.set_approver(account, 1).unwrap();
        (state, signer, account)
    }

    fn encoded(signer: &Signer, nonce: u64) -> Vec<u8> {
        let proposal = Proposal {
            block_number: 42,
            inputs: vec![Input::new(Address::new([9; 20]), 500u64)],
        };
        let mut tx = DepositTransaction::new(
            Identifier::Address(signer.address()),
            proposal,
            nonce,
        );
        tx.signature = Some(signer.sign(&tx, Format::Json));
        tx.encode().to_vec()
    }

    #[test_traced]
    fn test_deliver_encoded() {
        let (mut state, signer, account) = setup();
        let application = Application::new(Config::default());
        let raw = encoded(&signer, 0);

        assert!(application.check(&state, &raw).is_ok());
        let response = application.deliver(&mut state, &raw);
        assert_eq!(response.code, Code::Success);

        // A lone approver executes immediately
        assert_eq!(
            state.tx_status(&sha256::hash(&raw)),
            Some(bridge_types::TxStatus::Success)
        );
        assert_eq!(state.next_nonce(&account), 1);
        assert_eq!(application.deliver(&mut state, &raw).code, Code::Duplicated);
    }

    #[test_traced]
    fn test_undecodable() {
        let (mut state, signer, account) = setup();
        let application = Application::new(Config::default());
        let mut raw = encoded(&signer, 0);
        raw.truncate(raw.len() - 1);

        assert_eq!(application.check(&state, &raw).code, Code::InvalidFormat);
        assert_eq!(
            application.deliver(&mut state, &raw).code,
            Code::InvalidFormat
        );
        assert_eq!(state.next_nonce(&account), 0);

        // Trailing bytes are rejected
        let mut raw = encoded(&signer, 0);
        raw.push(0);
        assert_eq!(application.check(&state, &raw).code, Code::InvalidFormat);
    }

    #[test_traced]
    fn test_oversized() {
        let (mut state, signer, account) = setup();
        let raw = encoded(&signer, 0);
        let application = Application::new(Config {
            max_transaction_size: raw.len() - 1,
        });
        assert_eq!(
            application.deliver(&mut state, &raw).code,
            Code::InvalidFormat
        );
        assert_eq!(state.next_nonce(&account), 0);
    }
}
