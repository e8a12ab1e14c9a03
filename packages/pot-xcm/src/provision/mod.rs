//! Batched on-chain provisioning of pots and users
//!
//! Intents are ordered, cut into batches of at most `maxBatchSize` and each
//! batch becomes one extrinsic. Batches go out strictly one after another;
//! the first failure or a shutdown request stops the run.

mod calls;

use crate::calls::CallIndexTable;
use crate::client::{Dispatch, SubmissionResult};
use crate::error::SubmissionError;
use crate::registry::{Pot, User};
use crate::types::ProvisionSettings;
use std::future::Future;
use tracing::{debug, info, warn};

/// One pot or user to bring into existence on chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionIntent {
    CreatePot {
        pot_id: u32,
    },
    RegisterUser {
        pot_id: u32,
        user_index: u32,
        account: [u8; 32],
    },
}

impl ProvisionIntent {
    pub fn pot_id(&self) -> u32 {
        match self {
            ProvisionIntent::CreatePot { pot_id } => *pot_id,
            ProvisionIntent::RegisterUser { pot_id, .. } => *pot_id,
        }
    }

    /// Pot creation sorts before every user of that pot
    fn sort_key(&self) -> (u32, Option<u32>) {
        match self {
            ProvisionIntent::CreatePot { pot_id } => (*pot_id, None),
            ProvisionIntent::RegisterUser {
                pot_id, user_index, ..
            } => (*pot_id, Some(*user_index)),
        }
    }
}

impl From<&Pot> for ProvisionIntent {
    fn from(pot: &Pot) -> Self {
        ProvisionIntent::CreatePot { pot_id: pot.id }
    }
}

impl From<&User> for ProvisionIntent {
    fn from(user: &User) -> Self {
        ProvisionIntent::RegisterUser {
            pot_id: user.pot_id,
            user_index: user.index,
            account: *user.public_key(),
        }
    }
}

/// A group of intents encoded as a single extrinsic call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position in submission order, starting at 0
    pub index: usize,
    pub intents: Vec<ProvisionIntent>,
    pub call: Vec<u8>,
}

impl Batch {
    pub fn call_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.call))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Encoded only (dry run)
    Planned,
    Succeeded(SubmissionResult),
    Failed(SubmissionError),
    /// Skipped because an earlier batch failed
    NotAttempted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch: Batch,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub batches: Vec<BatchReport>,
}

impl ProvisionReport {
    /// True when every batch was either submitted successfully or only planned
    pub fn is_success(&self) -> bool {
        self.batches.iter().all(|b| {
            matches!(
                b.outcome,
                BatchOutcome::Planned | BatchOutcome::Succeeded(_)
            )
        })
    }

    pub fn first_failed(&self) -> Option<&BatchReport> {
        self.batches
            .iter()
            .find(|b| matches!(b.outcome, BatchOutcome::Failed(_)))
    }

    /// Index of the last batch confirmed by the chain
    pub fn last_confirmed(&self) -> Option<usize> {
        self.batches
            .iter()
            .rev()
            .find(|b| matches!(b.outcome, BatchOutcome::Succeeded(_)))
            .map(|b| b.batch.index)
    }

    pub fn was_cancelled(&self) -> bool {
        self.batches
            .iter()
            .any(|b| b.outcome == BatchOutcome::Cancelled)
    }
}

enum Halt {
    Failed,
    Cancelled,
}

pub struct BatchProvisioner<'a> {
    settings: &'a ProvisionSettings,
    table: &'a CallIndexTable,
}

impl<'a> BatchProvisioner<'a> {
    pub fn new(settings: &'a ProvisionSettings, table: &'a CallIndexTable) -> Self {
        Self { settings, table }
    }

    /// Order, partition and encode intents without touching the network
    pub fn plan(&self, mut intents: Vec<ProvisionIntent>) -> Vec<Batch> {
        intents.sort_by_key(ProvisionIntent::sort_key);
        let batch_size = self.settings.max_batch_size.max(1);

        intents
            .chunks(batch_size)
            .enumerate()
            .map(|(index, chunk)| Batch {
                index,
                intents: chunk.to_vec(),
                call: self.encode_batch(chunk),
            })
            .collect()
    }

    fn encode_batch(&self, intents: &[ProvisionIntent]) -> Vec<u8> {
        let mut encoded = Vec::new();
        // consecutive registrations for one pot share a call
        let mut pending: Option<(u32, Vec<[u8; 32]>)> = None;

        for intent in intents {
            match intent {
                ProvisionIntent::RegisterUser {
                    pot_id, account, ..
                } => {
                    if let Some((pot, users)) = pending.as_mut() {
                        if *pot == *pot_id {
                            users.push(*account);
                            continue;
                        }
                    }
                    if let Some((pot, users)) = pending.replace((*pot_id, vec![*account])) {
                        encoded.push(calls::register_users(self.table, self.settings, pot, &users));
                    }
                }
                ProvisionIntent::CreatePot { pot_id } => {
                    if let Some((pot, users)) = pending.take() {
                        encoded.push(calls::register_users(self.table, self.settings, pot, &users));
                    }
                    encoded.push(calls::create_pot(self.table, self.settings, *pot_id));
                }
            }
        }
        if let Some((pot, users)) = pending {
            encoded.push(calls::register_users(self.table, self.settings, pot, &users));
        }

        if encoded.len() == 1 {
            encoded.remove(0)
        } else {
            calls::batch_all(self.table, encoded)
        }
    }

    /// Plan the intents, then submit batch by batch unless this is a dry run
    ///
    /// Resolving `shutdown` stops the run: the in-flight batch and all later
    /// ones are reported as cancelled, confirmed batches stay confirmed.
    pub async fn submit<F>(
        &self,
        intents: Vec<ProvisionIntent>,
        dispatch: Dispatch<'_>,
        shutdown: F,
    ) -> ProvisionReport
    where
        F: Future<Output = ()>,
    {
        let batches = self.plan(intents);
        info!(
            batches = batches.len(),
            dry_run = dispatch.is_dry_run(),
            "provisioning planned"
        );

        let client = match dispatch {
            Dispatch::DryRun => {
                return ProvisionReport {
                    batches: batches
                        .into_iter()
                        .map(|batch| BatchReport {
                            batch,
                            outcome: BatchOutcome::Planned,
                        })
                        .collect(),
                };
            }
            Dispatch::Submit(client) => client,
        };

        tokio::pin!(shutdown);
        let mut halt = None;
        let mut reports = Vec::with_capacity(batches.len());

        for batch in batches {
            let outcome = match halt {
                Some(Halt::Failed) => BatchOutcome::NotAttempted,
                Some(Halt::Cancelled) => BatchOutcome::Cancelled,
                None => {
                    debug!(batch = batch.index, intents = batch.intents.len(), "submitting batch");
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            warn!(batch = batch.index, "shutdown requested, stopping");
                            halt = Some(Halt::Cancelled);
                            BatchOutcome::Cancelled
                        }
                        result = client.submit_call(&batch.call) => {
                            match result.and_then(SubmissionResult::into_result) {
                                Ok(result) => {
                                    info!(
                                        batch = batch.index,
                                        block = ?result.block_hash,
                                        "batch confirmed"
                                    );
                                    BatchOutcome::Succeeded(result)
                                }
                                Err(e) => {
                                    warn!(batch = batch.index, error = %e, "batch failed");
                                    halt = Some(Halt::Failed);
                                    BatchOutcome::Failed(e)
                                }
                            }
                        }
                    }
                }
            };
            reports.push(BatchReport { batch, outcome });
        }

        ProvisionReport { batches: reports }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClient;
    use futures::future::{pending, ready};

    fn user(pot_id: u32, user_index: u32) -> ProvisionIntent {
        ProvisionIntent::RegisterUser {
            pot_id,
            user_index,
            account: [user_index as u8; 32],
        }
    }

    fn settings(max_batch_size: usize) -> ProvisionSettings {
        ProvisionSettings {
            max_batch_size,
            ..ProvisionSettings::default()
        }
    }

    fn three_batches() -> Vec<ProvisionIntent> {
        (0..3).map(|pot_id| ProvisionIntent::CreatePot { pot_id }).collect()
    }

    #[test]
    fn test_plan_orders_pot_before_users() {
        let settings = settings(100);
        let table = CallIndexTable::default();
        let intents = vec![
            user(1, 1),
            user(0, 0),
            ProvisionIntent::CreatePot { pot_id: 1 },
            user(1, 0),
        ];

        let batches = BatchProvisioner::new(&settings, &table).plan(intents);
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].intents,
            vec![
                user(0, 0),
                ProvisionIntent::CreatePot { pot_id: 1 },
                user(1, 0),
                user(1, 1),
            ]
        );

        let expected = calls::batch_all(
            &table,
            vec![
                calls::register_users(&table, &settings, 0, &[[0; 32]]),
                calls::create_pot(&table, &settings, 1),
                calls::register_users(&table, &settings, 1, &[[0; 32], [1; 32]]),
            ],
        );
        assert_eq!(batches[0].call, expected);
    }

    #[test]
    fn test_plan_single_call_not_wrapped() {
        let settings = settings(10);
        let table = CallIndexTable::default();
        let intents: Vec<_> = (0..5).map(|i| user(0, i)).collect();

        let batches = BatchProvisioner::new(&settings, &table).plan(intents);
        let accounts: Vec<_> = (0..5).map(|i| [i as u8; 32]).collect();
        assert_eq!(
            batches[0].call,
            calls::register_users(&table, &settings, 0, &accounts)
        );
    }

    #[test]
    fn test_plan_chunks() {
        let settings = settings(100);
        let table = CallIndexTable::default();
        let intents: Vec<_> = (0..250).map(|i| user(2, i)).collect();

        let batches = BatchProvisioner::new(&settings, &table).plan(intents);
        let sizes: Vec<_> = batches.iter().map(|b| b.intents.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(batches[2].index, 2);
        assert_eq!(batches[1].intents[0], user(2, 100));
    }

    #[tokio::test]
    async fn test_resume_after_failure() {
        let settings = settings(1);
        let table = CallIndexTable::default();
        let client = MockClient::failing_on(1);

        let report = BatchProvisioner::new(&settings, &table)
            .submit(three_batches(), Dispatch::Submit(&client), pending())
            .await;

        assert!(matches!(report.batches[0].outcome, BatchOutcome::Succeeded(_)));
        assert_eq!(
            report.batches[1].outcome,
            BatchOutcome::Failed(SubmissionError::Rejected("injected failure".to_string()))
        );
        assert_eq!(report.batches[2].outcome, BatchOutcome::NotAttempted);
        assert_eq!(client.submit_count(), 2);
        assert_eq!(report.first_failed().map(|b| b.batch.index), Some(1));
        assert_eq!(report.last_confirmed(), Some(0));
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_all_batches_submitted_in_order() {
        let settings = settings(1);
        let table = CallIndexTable::default();
        let client = MockClient::new();

        let provisioner = BatchProvisioner::new(&settings, &table);
        let report = provisioner
            .submit(three_batches(), Dispatch::Submit(&client), pending())
            .await;

        assert!(report.is_success());
        assert_eq!(report.last_confirmed(), Some(2));
        let planned: Vec<_> = provisioner
            .plan(three_batches())
            .into_iter()
            .map(|b| b.call)
            .collect();
        assert_eq!(client.submitted(), planned);
    }

    #[tokio::test]
    async fn test_dry_run_is_offline() {
        let settings = settings(1);
        let table = CallIndexTable::default();

        let report = BatchProvisioner::new(&settings, &table)
            .submit(three_batches(), Dispatch::DryRun, pending())
            .await;

        assert_eq!(report.batches.len(), 3);
        assert!(report
            .batches
            .iter()
            .all(|b| b.outcome == BatchOutcome::Planned));
        assert!(report.is_success());
        assert_eq!(report.last_confirmed(), None);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_remaining() {
        let settings = settings(1);
        let table = CallIndexTable::default();
        let client = MockClient::new();

        let report = BatchProvisioner::new(&settings, &table)
            .submit(three_batches(), Dispatch::Submit(&client), ready(()))
            .await;

        assert!(report.was_cancelled());
        assert!(report
            .batches
            .iter()
            .all(|b| b.outcome == BatchOutcome::Cancelled));
        assert_eq!(client.submit_count(), 0);
        assert_eq!(report.last_confirmed(), None);
    }
}
