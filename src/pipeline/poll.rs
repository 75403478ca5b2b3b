//! Job-status polling: a bounded-retry state machine over a manifest.
//!
//! One poll pass walks the manifest's jobs in order and asks the analysis
//! service for each status; the first non-terminal job short-circuits the
//! pass. The pass result feeds a small pure transition function
//! ([`advance`]) so the WAITING → COMPLETE / TIMED_OUT logic is testable
//! without real time; the async wrapper only adds the fixed-interval sleep
//! between passes.
//!
//! A FAILED job counts as terminal here: the poller aggregates "still
//! running or not", nothing more. What to do about failed jobs is decided
//! downstream by the result assembler.

use crate::analysis::DocumentAnalysis;
use crate::error::IntakeError;
use crate::model::Manifest;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// State of the bounded-retry loop after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// At least one job is non-terminal and attempts remain.
    Waiting,
    /// Every job in the manifest is terminal.
    Complete,
    /// At least one job is non-terminal and the attempt budget is spent.
    TimedOut,
}

/// Bounded fixed-interval retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(5),
        }
    }
}

/// Pure state transition for one completed pass.
///
/// `attempt` is 1-based; the budget is spent when `attempt` reaches
/// `max_attempts` without completion.
pub fn advance(all_terminal: bool, attempt: u32, max_attempts: u32) -> PollState {
    if all_terminal {
        PollState::Complete
    } else if attempt >= max_attempts {
        PollState::TimedOut
    } else {
        PollState::Waiting
    }
}

/// One pass over the manifest: true when every job is terminal.
///
/// Jobs are checked in manifest order and the first non-terminal one ends
/// the pass early.
pub async fn manifest_complete(
    analysis: &dyn DocumentAnalysis,
    manifest: &Manifest,
) -> Result<bool, IntakeError> {
    for job in &manifest.jobs {
        let status = analysis.get_status(&job.job_id).await?;
        if !status.is_terminal() {
            debug!(
                "job {} (page {}) still running",
                job.job_id, job.page_num
            );
            return Ok(false);
        }
    }
    Ok(true)
}

/// Block until every job in the manifest is terminal, or the retry budget
/// is exhausted.
///
/// Returns `Ok(())` on completion and
/// [`IntakeError::ProcessingTimeout`] when `policy.max_attempts` passes
/// (spaced `policy.interval` apart) finish with jobs still non-terminal.
/// Nothing is cancelled on timeout; the underlying jobs keep running on
/// the service's schedule.
pub async fn wait_for_completion(
    analysis: &dyn DocumentAnalysis,
    manifest: &Manifest,
    policy: PollPolicy,
) -> Result<(), IntakeError> {
    for attempt in 1..=policy.max_attempts {
        let all_terminal = manifest_complete(analysis, manifest).await?;
        match advance(all_terminal, attempt, policy.max_attempts) {
            PollState::Complete => {
                info!(
                    "all {} jobs for '{}' are terminal after {} attempt(s)",
                    manifest.jobs.len(),
                    manifest.tracking_id,
                    attempt
                );
                return Ok(());
            }
            PollState::Waiting => {
                debug!(
                    "jobs for '{}' still processing (attempt {}/{})",
                    manifest.tracking_id, attempt, policy.max_attempts
                );
                sleep(policy.interval).await;
            }
            PollState::TimedOut => break,
        }
    }

    warn!(
        "processing not completed after {} attempts for '{}'",
        policy.max_attempts, manifest.tracking_id
    );
    Err(IntakeError::ProcessingTimeout {
        tracking_id: manifest.tracking_id.clone(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, DocumentLocation, QuerySpec};
    use crate::model::{AnalysisResult, JobRecord, JobStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted status source: each job returns its queued statuses in
    /// order, repeating the last one forever.
    struct ScriptedStatuses {
        statuses: Mutex<HashMap<String, Vec<JobStatus>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedStatuses {
        fn new(jobs: &[(&str, &[JobStatus])]) -> Self {
            let statuses = jobs
                .iter()
                .map(|(id, seq)| (id.to_string(), seq.to_vec()))
                .collect();
            Self {
                statuses: Mutex::new(statuses),
                calls: Mutex::new(0),
            }
        }

        fn status_calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl DocumentAnalysis for ScriptedStatuses {
        async fn start_analysis(
            &self,
            _location: &DocumentLocation,
            _queries: &[QuerySpec],
            _detect_signatures: bool,
        ) -> Result<String, AnalysisError> {
            unimplemented!("status fake")
        }

        async fn get_status(&self, job_id: &str) -> Result<JobStatus, AnalysisError> {
            *self.calls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            let seq = statuses
                .get_mut(job_id)
                .ok_or_else(|| AnalysisError::UnknownJob(job_id.to_string()))?;
            let status = if seq.len() > 1 { seq.remove(0) } else { seq[0] };
            Ok(status)
        }

        async fn get_result(&self, _job_id: &str) -> Result<AnalysisResult, AnalysisError> {
            unimplemented!("status fake")
        }
    }

    fn manifest(job_ids: &[&str]) -> Manifest {
        Manifest {
            tracking_id: "fax_0042".into(),
            filename: "fax_0042.pdf".into(),
            jobs: job_ids
                .iter()
                .enumerate()
                .map(|(i, id)| JobRecord {
                    job_id: id.to_string(),
                    page_num: (i + 1) as u32,
                })
                .collect(),
        }
    }

    #[test]
    fn advance_transitions() {
        assert_eq!(advance(true, 1, 60), PollState::Complete);
        assert_eq!(advance(true, 60, 60), PollState::Complete);
        assert_eq!(advance(false, 1, 60), PollState::Waiting);
        assert_eq!(advance(false, 59, 60), PollState::Waiting);
        assert_eq!(advance(false, 60, 60), PollState::TimedOut);
    }

    #[tokio::test]
    async fn pass_short_circuits_on_first_non_terminal() {
        use JobStatus::*;
        let analysis = ScriptedStatuses::new(&[
            ("j1", &[Succeeded]),
            ("j2", &[Running]),
            ("j3", &[Succeeded]),
        ]);
        let m = manifest(&["j1", "j2", "j3"]);

        assert!(!manifest_complete(&analysis, &m).await.unwrap());
        // j3 was never queried: the pass stopped at j2.
        assert_eq!(analysis.status_calls(), 2);
    }

    #[tokio::test]
    async fn failed_counts_as_terminal_for_aggregation() {
        use JobStatus::*;
        let analysis =
            ScriptedStatuses::new(&[("j1", &[Succeeded]), ("j2", &[Failed])]);
        let m = manifest(&["j1", "j2"]);
        assert!(manifest_complete(&analysis, &m).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn completes_once_all_jobs_turn_terminal() {
        use JobStatus::*;
        let analysis = ScriptedStatuses::new(&[
            ("j1", &[Succeeded]),
            ("j2", &[Running, Running, Succeeded]),
        ]);
        let m = manifest(&["j1", "j2"]);

        wait_for_completion(&analysis, &m, PollPolicy::default())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_is_processing_timeout() {
        use JobStatus::*;
        let analysis = ScriptedStatuses::new(&[
            ("j1", &[Succeeded]),
            ("j2", &[Running]),
            ("j3", &[Succeeded]),
        ]);
        let m = manifest(&["j1", "j2", "j3"]);

        let err = wait_for_completion(&analysis, &m, PollPolicy::default())
            .await
            .unwrap_err();
        match err {
            IntakeError::ProcessingTimeout {
                tracking_id,
                attempts,
            } => {
                assert_eq!(tracking_id, "fax_0042");
                assert_eq!(attempts, 60);
            }
            other => panic!("expected ProcessingTimeout, got {other:?}"),
        }
    }
}
