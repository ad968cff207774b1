//! Billing sweep tests against an in-memory executor.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emr_common::{AppError, AppResult};
use emr_core::BillingOutcome;
use emr_db::entities::donation::{self, DonationStatus};
use emr_queue::{BillingExecutor, SweepReport, run_billing_sweep};

/// Adoptions keyed by id, each with the outcome its next advance returns.
struct FakeExecutor {
    outcomes: HashMap<String, Result<&'static str, &'static str>>,
    ids: Vec<String>,
    pages: Mutex<Vec<Option<String>>>,
    advanced: Mutex<Vec<String>>,
}

impl FakeExecutor {
    fn new(entries: &[(&str, Result<&'static str, &'static str>)]) -> Self {
        let mut ids: Vec<String> = entries.iter().map(|(id, _)| (*id).to_string()).collect();
        ids.sort();
        Self {
            outcomes: entries
                .iter()
                .map(|(id, o)| ((*id).to_string(), *o))
                .collect(),
            ids,
            pages: Mutex::new(Vec::new()),
            advanced: Mutex::new(Vec::new()),
        }
    }
}

fn donation_for(adoption_id: &str, now: DateTime<Utc>) -> donation::Model {
    donation::Model {
        id: format!("d-{adoption_id}"),
        adoption_id: adoption_id.to_string(),
        amount_cents: 50_000,
        status: DonationStatus::Pending,
        period_start: now.into(),
        created_at: now.into(),
        settled_at: None,
    }
}

#[async_trait]
impl BillingExecutor for FakeExecutor {
    async fn active_adoption_ids(
        &self,
        after_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<String>> {
        self.pages.lock().unwrap().push(after_id.map(str::to_string));
        Ok(self
            .ids
            .iter()
            .filter(|id| after_id.is_none_or(|after| id.as_str() > after))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn advance(&self, adoption_id: &str, now: DateTime<Utc>) -> AppResult<BillingOutcome> {
        self.advanced.lock().unwrap().push(adoption_id.to_string());
        match self.outcomes[adoption_id] {
            Ok("created") => Ok(BillingOutcome::Created(donation_for(adoption_id, now))),
            Ok("not_due") => Ok(BillingOutcome::NotDue),
            Ok("already_billed") => Ok(BillingOutcome::AlreadyBilled),
            Ok(_) => Ok(BillingOutcome::Inactive),
            Err(msg) => Err(AppError::Database(msg.to_string())),
        }
    }
}

#[tokio::test]
async fn test_sweep_pages_through_all_adoptions() {
    let executor = FakeExecutor::new(&[
        ("a1", Ok("created")),
        ("a2", Ok("not_due")),
        ("a3", Ok("created")),
        ("a4", Ok("already_billed")),
        ("a5", Ok("inactive")),
    ]);

    let report = run_billing_sweep(&executor, 2, Utc::now()).await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            created: 2,
            not_due: 1,
            already_billed: 1,
            inactive: 1,
            failed: 0,
        }
    );
    assert_eq!(
        *executor.pages.lock().unwrap(),
        vec![None, Some("a2".to_string()), Some("a4".to_string())]
    );
}

#[tokio::test]
async fn test_sweep_continues_after_failure() {
    let executor = FakeExecutor::new(&[
        ("a1", Err("connection reset")),
        ("a2", Ok("created")),
        ("a3", Ok("not_due")),
    ]);

    let report = run_billing_sweep(&executor, 10, Utc::now()).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.total(), 3);
    assert_eq!(executor.advanced.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_sweep_with_no_adoptions() {
    let executor = FakeExecutor::new(&[]);

    let report = run_billing_sweep(&executor, 50, Utc::now()).await.unwrap();

    assert_eq!(report, SweepReport::default());
    assert_eq!(executor.pages.lock().unwrap().len(), 1);
}
