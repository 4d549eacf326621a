use crate::{metrics::Metrics, Chain, Config, Contract, Cursor, Error};
use commonware_macros::select;
use commonware_runtime::{Clock, Handle, Metrics as RuntimeMetrics, Spawner};
use tracing::{debug, info, warn};

/// Submits finalized withdraws to the external contract.
pub struct Relay<E: Clock + Spawner + RuntimeMetrics, C: Chain, K: Contract> {
    context: E,
    cfg: Config,
    chain: C,
    contract: K,

    cursor: Cursor,
    metrics: Metrics,
}

impl<E: Clock + Spawner + RuntimeMetrics, C: Chain, K: Contract> Relay<E, C, K> {
    /// Create a new [Relay], resuming from the cursor persisted at `cfg.state_path` (or starting
    /// at `cfg.start_height` if there is none).
    pub fn new(context: E, cfg: Config, chain: C, contract: K) -> Result<Self, Error> {
        let cursor = match Cursor::load(&cfg.state_path)? {
            Some(cursor) => {
                info!(
                    height = cursor.height,
                    submitted = cursor.submitted,
                    "resuming from cursor"
                );
                cursor
            }
            None => {
                info!(height = cfg.start_height, "starting without cursor");
                Cursor::new(cfg.start_height)
            }
        };
        let metrics = Metrics::init(context.clone());
        metrics.height.set(cursor.height as i64);
        Ok(Self {
            context,
            cfg,
            chain,
            contract,
            cursor,
            metrics,
        })
    }

    /// The current cursor.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn persist(&mut self, cursor: Cursor) -> Result<(), Error> {
        cursor.store(&self.cfg.state_path)?;
        self.cursor = cursor;
        self.metrics.height.set(cursor.height as i64);
        Ok(())
    }

    /// Submit every withdraw finalized since the cursor, returning the number submitted.
    ///
    /// If a query or submission fails, the cursor stays at the first unsubmitted withdraw and
    /// the error is returned. The next step retries from there.
    pub async fn step(&mut self) -> Result<usize, Error> {
        let latest = self.chain.latest_height().await.map_err(|err| {
            self.metrics.failures.inc();
            Error::Chain(err.to_string())
        })?;

        let mut submitted = 0;
        while self.cursor.height <= latest {
            let height = self.cursor.height;
            let mut withdraws = self.chain.withdraws(height).await.map_err(|err| {
                self.metrics.failures.inc();
                Error::Chain(err.to_string())
            })?;
            withdraws.sort_by_key(|withdraw| withdraw.index);

            for withdraw in withdraws.iter().skip(self.cursor.submitted as usize) {
                if let Err(err) = self.contract.submit(&self.cfg.contract, withdraw).await {
                    self.metrics.failures.inc();
                    warn!(height, index = withdraw.index, %err, "submission failed");
                    return Err(Error::Submit {
                        height,
                        index: withdraw.index,
                        reason: err.to_string(),
                    });
                }
                self.metrics.submitted.inc();
                submitted += 1;
                debug!(height, index = withdraw.index, "submitted withdraw");
                self.persist(Cursor {
                    height,
                    submitted: self.cursor.submitted + 1,
                })?;
            }
            self.persist(Cursor::new(height + 1))?;
        }
        if submitted > 0 {
            info!(submitted, height = self.cursor.height, "relayed withdraws");
        }
        Ok(submitted)
    }

    /// Step every `poll_interval` until the runtime is stopped.
    pub fn start(self) -> Handle<()> {
        self.context.clone().spawn(|_| self.run())
    }

    /// Inner run loop called by `start`.
    async fn run(mut self) {
        let mut shutdown = self.context.stopped();
        loop {
            select! {
                _ = &mut shutdown => {
                    debug!("shutdown");
                    return;
                },
                result = self.step() => {
                    if let Err(err) = result {
                        warn!(?err, "step failed");
                    }
                },
            }
            select! {
                _ = &mut shutdown => {
                    debug!("shutdown");
                    return;
                },
                _ = self.context.sleep(self.cfg.poll_interval) => {},
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{self, withdraw};
    use bridge_types::Address;
    use commonware_macros::test_traced;
    use commonware_runtime::{deterministic, Runner};
    use std::{path::Path, time::Duration};

    const CONTRACT: Address = Address::new([7; 20]);

    fn config(dir: &Path, start_height: u64) -> Config {
        Config {
            contract: CONTRACT,
            state_path: dir.join("state.json"),
            start_height,
            poll_interval: Duration::from_secs(1),
        }
    }

    fn heights(contract: &mocks::Contract) -> Vec<(u64, u32)> {
        contract
            .accepted()
            .into_iter()
            .map(|(address, withdraw)| {
                assert_eq!(address, CONTRACT);
                (withdraw.height, withdraw.index)
            })
            .collect()
    }

    #[test_traced]
    fn test_relays_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let chain = mocks::Chain::default();
            let contract = mocks::Contract::default();
            chain.finalize(1, 2);
            chain.finalize(2, 0);
            chain.finalize(3, 3);

            let mut relay = Relay::new(
                context.with_label("relay"),
                config(dir.path(), 1),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            assert_eq!(relay.step().await.unwrap(), 5);
            assert_eq!(
                heights(&contract),
                vec![(1, 0), (1, 1), (3, 0), (3, 1), (3, 2)]
            );
            assert_eq!(contract.accepted()[0].1, withdraw(1, 0));
            assert_eq!(relay.cursor(), Cursor::new(4));
            assert_eq!(
                Cursor::load(&dir.path().join("state.json")).unwrap(),
                Some(Cursor::new(4))
            );

            // Nothing new
            assert_eq!(relay.step().await.unwrap(), 0);

            // New height
            chain.finalize(4, 1);
            assert_eq!(relay.step().await.unwrap(), 1);
            assert_eq!(heights(&contract).last(), Some(&(4, 0)));

            let metrics = context.encode();
            assert!(metrics.contains("relay_submitted_total 6"));
            assert!(metrics.contains("relay_height 5"));
        });
    }

    #[test_traced]
    fn test_start_height() {
        let dir = tempfile::tempdir().unwrap();
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let chain = mocks::Chain::default();
            let contract = mocks::Contract::default();
            chain.finalize(1, 1);
            chain.finalize(2, 1);

            let mut relay = Relay::new(
                context,
                config(dir.path(), 2),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            relay.step().await.unwrap();
            assert_eq!(heights(&contract), vec![(2, 0)]);
        });
    }

    #[test_traced]
    fn test_resume_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let chain = mocks::Chain::default();
            let contract = mocks::Contract::default();
            chain.finalize(1, 2);
            chain.finalize(2, 3);

            // Fail partway through the second height
            contract.set_limit(Some(3));
            let mut relay = Relay::new(
                context.with_label("first"),
                config(dir.path(), 1),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            assert!(matches!(
                relay.step().await,
                Err(Error::Submit {
                    height: 2,
                    index: 1,
                    ..
                })
            ));
            let expected = Cursor {
                height: 2,
                submitted: 1,
            };
            assert_eq!(relay.cursor(), expected);
            assert!(context.encode().contains("first_failures_total 1"));
            drop(relay);

            // Restart from the persisted cursor
            contract.set_limit(None);
            let mut relay = Relay::new(
                context.with_label("second"),
                config(dir.path(), 1),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            assert_eq!(relay.cursor(), expected);
            assert_eq!(relay.step().await.unwrap(), 2);
            assert_eq!(
                heights(&contract),
                vec![(1, 0), (1, 1), (2, 0), (2, 1), (2, 2)]
            );
        });
    }

    #[test_traced]
    fn test_chain_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let chain = mocks::Chain::default();
            let contract = mocks::Contract::default();
            chain.finalize(1, 1);
            chain.set_unavailable(true);

            let mut relay = Relay::new(
                context,
                config(dir.path(), 1),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            assert!(matches!(relay.step().await, Err(Error::Chain(_))));
            assert_eq!(relay.cursor(), Cursor::new(1));
            assert!(contract.accepted().is_empty());

            chain.set_unavailable(false);
            assert_eq!(relay.step().await.unwrap(), 1);
        });
    }

    #[test_traced]
    fn test_run() {
        let dir = tempfile::tempdir().unwrap();
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let chain = mocks::Chain::default();
            let contract = mocks::Contract::default();
            chain.finalize(1, 2);

            // Failures are retried on the next poll
            contract.set_limit(Some(1));
            let relay = Relay::new(
                context.with_label("relay"),
                config(dir.path(), 1),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            let handle = relay.start();
            context.sleep(Duration::from_secs(5)).await;
            assert_eq!(heights(&contract), vec![(1, 0)]);
            assert!(context.encode().contains("relay_failures_total"));

            // Recovers once the contract accepts again
            contract.set_limit(None);
            context.sleep(Duration::from_secs(5)).await;
            assert_eq!(heights(&contract), vec![(1, 0), (1, 1)]);
            assert_eq!(
                Cursor::load(&dir.path().join("state.json")).unwrap(),
                Some(Cursor::new(2))
            );

            // Picks up newly finalized heights
            chain.finalize(2, 1);
            context.sleep(Duration::from_secs(5)).await;
            assert_eq!(heights(&contract).last(), Some(&(2, 0)));
            handle.abort();
        });
    }

    #[test_traced]
    fn test_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let chain = mocks::Chain::default();
            let contract = mocks::Contract::default();
            chain.finalize(1, 2);
            chain.finalize(2, 3);

            // Stop partway through the second height
            contract.set_limit(Some(3));
            let relay = Relay::new(
                context.with_label("relay"),
                config(dir.path(), 1),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            let handle = relay.start();
            context.sleep(Duration::from_secs(2)).await;
            context.clone().stop(0);
            handle.await.unwrap();

            // Progress survives the stop
            let expected = Cursor {
                height: 2,
                submitted: 1,
            };
            assert_eq!(
                Cursor::load(&dir.path().join("state.json")).unwrap(),
                Some(expected)
            );

            // A restarted relay resumes where the stopped one left off
            contract.set_limit(None);
            let mut relay = Relay::new(
                context.with_label("restarted"),
                config(dir.path(), 1),
                chain.clone(),
                contract.clone(),
            )
            .unwrap();
            assert_eq!(relay.cursor(), expected);
            assert_eq!(relay.step().await.unwrap(), 2);
            assert_eq!(
                heights(&contract),
                vec![(1, 0), (1, 1), (2, 0), (2, 1), (2, 2)]
            );
        });
    }
}
