use crate::config::DEFAULT_CONCURRENCY;
use crate::error::ScanError;
use crate::normalize::RawResult;
use crate::registry::CheckDescriptor;
use crate::snapshot::Snapshot;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Lifecycle of a check within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl CheckState {
    pub fn is_finished(&self) -> bool {
        matches!(self, CheckState::Completed | CheckState::Failed)
    }
}

/// Final state of one check
#[derive(Debug, Clone)]
pub struct CheckRecord {
    pub id: String,
    pub state: CheckState,
    pub results: usize,
}

/// What the scheduler observed over a whole run
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// One record per check, in registration order
    pub checks: Vec<CheckRecord>,
    /// Every per-check failure, in completion order
    pub errors: Vec<ScanError>,
}

impl ScanOutcome {
    pub fn completed(&self) -> usize {
        self.checks.iter().filter(|c| c.state == CheckState::Completed).count()
    }

    pub fn failed(&self) -> usize {
        self.checks.iter().filter(|c| c.state == CheckState::Failed).count()
    }

    /// The failure seen last, if any
    pub fn last_error(&self) -> Option<&ScanError> {
        self.errors.last()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs checks against a snapshot with at most `concurrency` in flight.
///
/// Every check runs on its own task. A failing or panicking check is
/// recorded and the run carries on with the others.
pub struct Scheduler {
    concurrency: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(DEFAULT_CONCURRENCY)
    }
}

impl Scheduler {
    /// Erstellt einen neuen Scheduler (mindestens ein Slot)
    pub fn new(concurrency: usize) -> Self {
        Scheduler {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Evaluates every check and hands each check's results to `on_complete`
    /// as soon as that check finishes.
    ///
    /// `settings` yields the settings of a check by id. `on_complete` is only
    /// ever called from this future, one check at a time, so it may write to
    /// sinks without further locking.
    pub async fn run<S, F>(
        &self,
        checks: &[Arc<CheckDescriptor>],
        snapshot: Arc<Snapshot>,
        settings: S,
        mut on_complete: F,
    ) -> ScanOutcome
    where
        S: Fn(&str) -> Value,
        F: FnMut(&CheckDescriptor, &[RawResult]),
    {
        let states = Mutex::new(vec![CheckState::Pending; checks.len()]);
        let mut records: Vec<CheckRecord> = checks
            .iter()
            .map(|c| CheckRecord {
                id: c.id.clone(),
                state: CheckState::Pending,
                results: 0,
            })
            .collect();
        let mut errors = Vec::new();

        let mut completions = stream::iter(checks.iter().cloned().enumerate())
            .map(|(idx, check)| {
                // Called by buffer_unordered only once a slot is free
                set_state(&states, idx, CheckState::Running);
                let snapshot = snapshot.clone();
                let check_settings = settings(&check.id);
                tracing::debug!(check = %check.id, "dispatching check");

                let task = tokio::spawn(async move {
                    let start = Instant::now();
                    let result = check.check.evaluate(&snapshot, &check_settings).await;
                    (result, start.elapsed())
                });
                async move { (idx, task.await) }
            })
            .buffer_unordered(self.concurrency);

        while let Some((idx, joined)) = completions.next().await {
            let check = &checks[idx];
            let outcome = match joined {
                Ok((Ok(results), elapsed)) => {
                    tracing::debug!(check = %check.id, results = results.len(), elapsed_ms = elapsed.as_millis() as u64, "check completed");
                    Ok(results)
                }
                Ok((Err(e), _)) => Err(format!("{:#}", e)),
                Err(join_error) if join_error.is_panic() => Err("check panicked".to_string()),
                Err(join_error) => Err(join_error.to_string()),
            };

            match outcome {
                Ok(results) => {
                    on_complete(check, &results);
                    records[idx].results = results.len();
                    set_state(&states, idx, CheckState::Completed);
                }
                Err(message) => {
                    tracing::warn!(check = %check.id, error = %message, "check failed");
                    errors.push(ScanError::CheckEvaluation {
                        check: check.id.clone(),
                        message,
                    });
                    set_state(&states, idx, CheckState::Failed);
                }
            }
        }
        drop(completions);

        let states = states.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (record, state) in records.iter_mut().zip(states) {
            debug_assert!(state.is_finished(), "check {} left in {:?}", record.id, state);
            record.state = state;
        }

        ScanOutcome { checks: records, errors }
    }
}

fn set_state(states: &Mutex<Vec<CheckState>>, idx: usize, state: CheckState) {
    let mut states = states.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    states[idx] = state;
}
