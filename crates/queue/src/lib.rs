//! Background scheduling for EMR Adopt.
//!
//! - **Scheduler**: periodic billing sweep over ACTIVE adoptions

pub mod scheduler;

pub use scheduler::{
    BillingExecutor, SchedulerConfig, SweepReport, run_billing_sweep, run_scheduler,
};
