//! Periodic revocation of expired grants.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use lakegrant_core::{AppError, AppResult};
use lakegrant_domain::GrantRecord;

use crate::ActivationStatus;
use crate::grant_lifecycle_service::{GrantLifecycleService, RevokeGrantInput};
use crate::grant_ports::GrantRecordStore;


/// Tuning for one sweeper instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOptions {
    /// Maximum revocations in flight at once. `1` revokes sequentially.
    pub max_concurrency: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self { max_concurrency: 1 }
    }
}

/// Terminal state of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStatus {
    /// Every eligible grant was revoked, including the case of none.
    Completed,
    /// At least one eligible grant could not be revoked.
    PartialFailure,
    /// The record scan failed; nothing was attempted.
    Aborted,
}

impl SweepStatus {
    /// Returns a stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::PartialFailure => "partial_failure",
            Self::Aborted => "aborted",
        }
    }
}

/// Counters and status for one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Terminal state.
    pub status: SweepStatus,
    /// Grants found past their window.
    pub eligible: usize,
    /// Revocations attempted.
    pub attempted: usize,
    /// Revocations that removed permissions and deactivated the record.
    pub succeeded: usize,
    /// Revocations left for the next sweep.
    pub failed: usize,
    /// Human-readable outcome.
    pub message: String,
}

impl SweepReport {
    fn aborted(error: &AppError) -> Self {
        Self {
            status: SweepStatus::Aborted,
            eligible: 0,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            message: format!("sweep aborted: {error}"),
        }
    }

    fn from_outcomes(eligible: usize, outcomes: &[AppResult<()>]) -> Self {
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        let attempted = outcomes.len();
        let succeeded = attempted - failed;

        let (status, message) = if eligible == 0 {
            (
                SweepStatus::Completed,
                "no eligible grants found for revocation".to_owned(),
            )
        } else if failed == 0 {
            (
                SweepStatus::Completed,
                format!("revoked {succeeded} of {eligible} eligible grants"),
            )
        } else {
            (
                SweepStatus::PartialFailure,
                format!(
                    "revoked {succeeded} of {eligible} eligible grants; {failed} left for retry"
                ),
            )
        };

        Self {
            status,
            eligible,
            attempted,
            succeeded,
            failed,
            message,
        }
    }

    /// Returns the activation status reported to the trigger surface.
    #[must_use]
    pub fn to_activation_status(&self) -> ActivationStatus {
        match self.status {
            SweepStatus::Completed => ActivationStatus::succeeded(self.message.clone()),
            SweepStatus::PartialFailure | SweepStatus::Aborted => {
                ActivationStatus::failed(self.message.clone())
            }
        }
    }
}

/// Finds grants whose window has elapsed and revokes them.
#[derive(Clone)]
pub struct ExpirySweeper {
    lifecycle_service: GrantLifecycleService,
    record_store: Arc<dyn GrantRecordStore>,
    options: SweepOptions,
}

impl ExpirySweeper {
    /// Creates a sweeper from required dependencies.
    #[must_use]
    pub fn new(
        lifecycle_service: GrantLifecycleService,
        record_store: Arc<dyn GrantRecordStore>,
        options: SweepOptions,
    ) -> Self {
        Self {
            lifecycle_service,
            record_store,
            options,
        }
    }

    /// Sweeps using the current wall-clock time.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now().timestamp()).await
    }

    /// Sweeps as if the current time were `now` (seconds since epoch).
    ///
    /// A scan failure aborts before any revocation. A failed revocation is
    /// counted and never stops the remaining ones.
    pub async fn sweep_at(&self, now: i64) -> SweepReport {
        let scanned = self
            .lifecycle_service
            .call_policy()
            .run(
                "grant record scan",
                self.record_store.scan_eligible_grants(now),
            )
            .await;

        let records = match scanned {
            Ok(records) => records,
            Err(error) => {
                let error = AppError::RecordScanFailed(error.to_string());
                warn!(now, error = %error, "grant sweep aborted");
                return SweepReport::aborted(&error);
            }
        };

        let eligible: Vec<GrantRecord> = records
            .into_iter()
            .filter(|record| record.is_eligible_for_revocation(now))
            .collect();

        if eligible.is_empty() {
            info!(now, "no eligible grants found for revocation");
            return SweepReport::from_outcomes(0, &[]);
        }

        let eligible_count = eligible.len();
        info!(now, eligible = eligible_count, "revoking expired grants");

        let outcomes = if self.options.max_concurrency <= 1 {
            self.revoke_sequentially(eligible).await
        } else {
            self.revoke_concurrently(eligible).await
        };

        let report = SweepReport::from_outcomes(eligible_count, &outcomes);
        info!(
            status = report.status.as_str(),
            eligible = report.eligible,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "grant sweep finished"
        );

        report
    }

    async fn revoke_sequentially(&self, eligible: Vec<GrantRecord>) -> Vec<AppResult<()>> {
        let mut outcomes = Vec::with_capacity(eligible.len());
        for record in eligible {
            outcomes.push(revoke_record(&self.lifecycle_service, &record).await);
        }

        outcomes
    }

    async fn revoke_concurrently(&self, eligible: Vec<GrantRecord>) -> Vec<AppResult<()>> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency));
        let mut tasks = JoinSet::new();

        for record in eligible {
            let lifecycle_service = self.lifecycle_service.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|error| {
                    AppError::Internal(format!("revocation permit unavailable: {error}"))
                })?;
                revoke_record(&lifecycle_service, &record).await
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.unwrap_or_else(|error| {
                warn!(error = %error, "grant revocation task did not complete");
                Err(AppError::Internal(format!(
                    "revocation task did not complete: {error}"
                )))
            }));
        }

        outcomes
    }
}

async fn revoke_record(
    lifecycle_service: &GrantLifecycleService,
    record: &GrantRecord,
) -> AppResult<()> {
    let input = RevokeGrantInput::from_record(record).map_err(|error| {
        warn!(
            access_id = %record.access_id(),
            error = %error,
            "stored grant has an unreadable resource descriptor"
        );
        error
    })?;

    lifecycle_service.revoke_grant(&input).await
}
