//! Periodic billing sweep.
//!
//! Every tick pages through ACTIVE adoptions in id order and advances each
//! one's billing cycle. A failure on one adoption is logged and the sweep
//! moves on.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emr_common::{AppResult, BillingConfig};
use emr_core::{AdoptionService, BillingOutcome};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between billing sweeps (default: 1 hour).
    pub billing_interval: Duration,
    /// Adoptions loaded per page.
    pub batch_size: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&BillingConfig::default())
    }
}

impl From<&BillingConfig> for SchedulerConfig {
    fn from(billing: &BillingConfig) -> Self {
        Self {
            billing_interval: Duration::from_secs(billing.scheduler_interval_secs.max(1)),
            batch_size: billing.scheduler_batch_size.max(1),
        }
    }
}

/// Counts per outcome for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub created: u64,
    pub not_due: u64,
    pub already_billed: u64,
    pub inactive: u64,
    pub failed: u64,
}

impl SweepReport {
    fn record(&mut self, outcome: &BillingOutcome) {
        match outcome {
            BillingOutcome::Created(_) => self.created += 1,
            BillingOutcome::NotDue => self.not_due += 1,
            BillingOutcome::AlreadyBilled => self.already_billed += 1,
            BillingOutcome::Inactive => self.inactive += 1,
        }
    }

    /// Adoptions visited.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.created + self.not_due + self.already_billed + self.inactive + self.failed
    }
}

/// Billing operations the sweep drives.
#[async_trait]
pub trait BillingExecutor: Send + Sync {
    /// IDs of ACTIVE adoptions after `after_id`, ascending.
    async fn active_adoption_ids(&self, after_id: Option<&str>, limit: u64)
    -> AppResult<Vec<String>>;

    /// Advance one adoption's billing cycle.
    async fn advance(&self, adoption_id: &str, now: DateTime<Utc>) -> AppResult<BillingOutcome>;
}

#[async_trait]
impl BillingExecutor for AdoptionService {
    async fn active_adoption_ids(
        &self,
        after_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<String>> {
        Ok(self
            .find_due_for_billing(after_id, limit)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }

    async fn advance(&self, adoption_id: &str, now: DateTime<Utc>) -> AppResult<BillingOutcome> {
        self.advance_billing_cycle(adoption_id, now).await
    }
}

/// Run one sweep over every ACTIVE adoption.
///
/// Only a failure to load a page aborts the sweep.
pub async fn run_billing_sweep<E: BillingExecutor + ?Sized>(
    executor: &E,
    batch_size: u64,
    now: DateTime<Utc>,
) -> AppResult<SweepReport> {
    let mut report = SweepReport::default();
    let mut cursor: Option<String> = None;

    loop {
        let ids = executor
            .active_adoption_ids(cursor.as_deref(), batch_size)
            .await?;
        let page_len = ids.len() as u64;

        for id in &ids {
            match executor.advance(id, now).await {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(adoption_id = %id, error = %e, "Failed to advance billing cycle");
                }
            }
        }

        match ids.into_iter().last() {
            Some(last) if page_len >= batch_size => cursor = Some(last),
            _ => break,
        }
    }

    Ok(report)
}

/// Spawn the billing sweep loop.
pub fn run_scheduler<E: BillingExecutor + 'static>(
    config: SchedulerConfig,
    executor: Arc<E>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(config.billing_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match run_billing_sweep(executor.as_ref(), config.batch_size, Utc::now()).await {
                Ok(report) => {
                    if report.total() > 0 {
                        tracing::info!(
                            created = report.created,
                            not_due = report.not_due,
                            already_billed = report.already_billed,
                            inactive = report.inactive,
                            failed = report.failed,
                            "Billing sweep finished"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Billing sweep aborted");
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_from_billing() {
        let billing = BillingConfig {
            scheduler_interval_secs: 60,
            scheduler_batch_size: 0,
            ..BillingConfig::default()
        };
        let config = SchedulerConfig::from(&billing);

        assert_eq!(config.billing_interval, Duration::from_secs(60));
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.billing_interval, Duration::from_secs(3600));
        assert_eq!(config.batch_size, 200);
    }

    #[test]
    fn test_report_total() {
        let report = SweepReport {
            created: 2,
            not_due: 3,
            failed: 1,
            ..SweepReport::default()
        };
        assert_eq!(report.total(), 6);
    }
}
