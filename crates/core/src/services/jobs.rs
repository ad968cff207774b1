//! Post-commit side effects.
//!
//! Services enqueue notification and email jobs after their transaction has
//! committed. Workers run them concurrently; a failing job is logged and
//! never reaches the caller.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::services::email::{EmailMessage, EmailService};
use crate::services::notification::NotificationService;
use emr_db::entities::notification::NotificationType;

/// Maximum number of concurrent job workers.
const MAX_WORKERS: usize = 4;

/// Channel buffer size for jobs.
const JOB_BUFFER_SIZE: usize = 1000;

/// Job types that can be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Append an in-app notification.
    Notify {
        user_id: String,
        notification_type: NotificationType,
        title: String,
        body: String,
        link: Option<String>,
    },
    /// Send a transactional email.
    Email(EmailMessage),
}

/// Job sender for enqueueing jobs.
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue a job without waiting. A full or closed queue drops the job
    /// with a warning.
    pub fn enqueue(&self, job: Job) {
        match self.sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                warn!(job = ?job, "Job queue is full, dropping job");
            }
            Err(TrySendError::Closed(job)) => {
                warn!(job = ?job, "Job queue is closed, dropping job");
            }
        }
    }

    /// Enqueue an in-app notification.
    pub fn notify(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        title: &str,
        body: &str,
        link: Option<String>,
    ) {
        self.enqueue(Job::Notify {
            user_id: user_id.to_string(),
            notification_type,
            title: title.to_string(),
            body: body.to_string(),
            link,
        });
    }

    /// Enqueue an email rendered by one of the `email::templates` functions.
    pub fn email(&self, to: &str, (subject, html_body): (String, String)) {
        self.enqueue(Job::Email(EmailMessage {
            to: to.to_string(),
            subject,
            html_body,
        }));
    }
}

/// Job worker context containing services needed for job processing.
#[derive(Clone)]
pub struct JobWorkerContext {
    pub notification_service: NotificationService,
    pub email_service: EmailService,
}

/// Job processing service.
pub struct JobService {
    sender: mpsc::Sender<Job>,
    receiver: mpsc::Receiver<Job>,
}

impl JobService {
    /// Create a new job service.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(JOB_BUFFER_SIZE)
    }

    /// Create a job service with a custom queue size.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self { sender, receiver }
    }

    /// Get a job sender for enqueueing jobs.
    #[must_use]
    pub fn sender(&self) -> JobSender {
        JobSender {
            sender: self.sender.clone(),
        }
    }

    /// Take every job currently queued, without running it.
    pub fn drain(&mut self) -> Vec<Job> {
        let mut jobs = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(job) => jobs.push(job),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        jobs
    }

    /// Start the job processor with the given context.
    /// This consumes the receiver and spawns worker tasks.
    pub fn start(self, context: JobWorkerContext) -> JoinHandle<()> {
        let Self { sender, receiver } = self;
        drop(sender);
        let context = Arc::new(context);

        tokio::spawn(async move {
            info!("Job worker starting with {} workers", MAX_WORKERS);
            run_job_processor(receiver, context).await;
            info!("Job worker stopped");
        })
    }
}

impl Default for JobService {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the job processor until every sender is dropped.
async fn run_job_processor(mut receiver: mpsc::Receiver<Job>, context: Arc<JobWorkerContext>) {
    // Use a semaphore to limit concurrent workers
    let semaphore = Arc::new(tokio::sync::Semaphore::new(MAX_WORKERS));
    let mut tasks = tokio::task::JoinSet::new();

    while let Some(job) = receiver.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let ctx = context.clone();

        tasks.spawn(async move {
            let _permit = permit;
            process_job(job, &ctx).await;
        });

        // Reap finished tasks so the set does not grow without bound.
        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}
}

/// Process a single job.
async fn process_job(job: Job, context: &JobWorkerContext) {
    match job {
        Job::Notify {
            user_id,
            notification_type,
            title,
            body,
            link,
        } => {
            match context
                .notification_service
                .record(&user_id, notification_type, &title, &body, link.as_deref())
                .await
            {
                Ok(notification) => {
                    debug!(
                        user_id = %user_id,
                        notification_id = %notification.id,
                        notification_type = ?notification_type,
                        "Notification recorded"
                    );
                }
                Err(e) => {
                    error!(
                        user_id = %user_id,
                        notification_type = ?notification_type,
                        error = %e,
                        "Failed to record notification"
                    );
                }
            }
        }
        Job::Email(message) => match context.email_service.send(&message).await {
            Ok(message_id) => {
                debug!(to = %message.to, message_id = %message_id, "Email delivered");
            }
            Err(e) => {
                error!(
                    to = %message.to,
                    subject = %message.subject,
                    error = %e,
                    "Failed to send email"
                );
            }
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use emr_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_enqueue_and_drain() {
        let mut service = JobService::new();
        let sender = service.sender();

        sender.notify("u1", NotificationType::Welcome, "Hi", "Body", None);
        sender.email(
            "u1@example.org",
            ("Subject".to_string(), "<p>x</p>".to_string()),
        );

        let jobs = service.drain();
        assert_eq!(jobs.len(), 2);
        assert!(matches!(
            &jobs[0],
            Job::Notify { notification_type: NotificationType::Welcome, .. }
        ));
        assert!(matches!(&jobs[1], Job::Email(m) if m.to == "u1@example.org"));
        assert!(service.drain().is_empty());
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let mut service = JobService::with_capacity(1);
        let sender = service.sender();

        sender.notify("u1", NotificationType::Welcome, "first", "", None);
        sender.notify("u1", NotificationType::Welcome, "second", "", None);

        let jobs = service.drain();
        assert_eq!(jobs.len(), 1);
        assert!(matches!(&jobs[0], Job::Notify { title, .. } if title == "first"));
    }

    #[tokio::test]
    async fn test_worker_survives_failing_jobs() {
        // The notification insert fails; the worker must log and keep going.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Custom("down".into())])
                .into_connection(),
        );
        let context = JobWorkerContext {
            notification_service: NotificationService::new(NotificationRepository::new(db)),
            email_service: EmailService::log_only(),
        };

        let service = JobService::new();
        let sender = service.sender();
        let handle = service.start(context);

        sender.notify("u1", NotificationType::PaymentFailed, "t", "b", None);
        sender.email("u1@example.org", ("s".to_string(), "h".to_string()));
        drop(sender);

        handle.await.unwrap();
    }
}
