//! EMR Adopt server entry point.
//!
//! Usage: `emr-adopt [serve|seed]` (default `serve`).

mod seed;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use axum::{Router, middleware};
use emr_api::{AppState, auth_middleware, router as api_router};
use emr_common::{Config, config::LogFormat};
use emr_core::{
    AdoptionService, EmailService, JobService, JobWorkerContext, ListingService,
    NotificationService, RegistrationService, SettingsService,
};
use emr_db::repositories::{
    AdoptionRepository, DonationRepository, ListingRepository, NotificationRepository,
    SettingRepository, UserRepository,
};
use emr_queue::{SchedulerConfig, run_scheduler};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Time allowed for queued notifications and emails to finish on shutdown.
const JOB_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "emr=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let command = std::env::args().nth(1).unwrap_or_else(|| "serve".to_string());

    // Load configuration
    let config = Config::load().context("loading configuration")?;
    init_tracing(&config);

    // Connect to database
    let db = Arc::new(emr_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    emr_db::migrate(&db).await?;
    info!("Migrations completed");

    match command.as_str() {
        "serve" => serve(config, db).await,
        "seed" => seed::run(db, config.billing.default_donation_amount_cents).await,
        other => bail!("unknown command `{other}`, expected `serve` or `seed`"),
    }
}

async fn serve(config: Config, db: Arc<sea_orm::DatabaseConnection>) -> anyhow::Result<()> {
    info!("Starting EMR Adopt server...");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let listing_repo = ListingRepository::new(Arc::clone(&db));
    let adoption_repo = AdoptionRepository::new(Arc::clone(&db));
    let donation_repo = DonationRepository::new(Arc::clone(&db));
    let setting_repo = SettingRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize services
    let jobs = JobService::new();
    let notification_service = NotificationService::new(notification_repo);
    let email_service = EmailService::from_settings(&config.email)?;
    let settings_service =
        SettingsService::new(setting_repo, config.billing.default_donation_amount_cents);

    let state = AppState {
        registration_service: RegistrationService::new(
            user_repo.clone(),
            jobs.sender(),
            config.server.url.clone(),
        ),
        listing_service: ListingService::new(
            listing_repo.clone(),
            user_repo.clone(),
            jobs.sender(),
        ),
        adoption_service: AdoptionService::new(
            adoption_repo,
            donation_repo,
            listing_repo,
            user_repo,
            settings_service.clone(),
            jobs.sender(),
            config.billing.clone(),
        ),
        notification_service: notification_service.clone(),
        settings_service,
    };

    // Start job workers
    let job_worker = jobs.start(JobWorkerContext {
        notification_service,
        email_service,
    });
    info!(provider = ?config.email.provider, "Job workers started");

    // Start billing scheduler
    let scheduler_config = SchedulerConfig::from(&config.billing);
    info!(
        interval_secs = scheduler_config.billing_interval.as_secs(),
        period = ?config.billing.period,
        "Starting billing scheduler"
    );
    let scheduler = run_scheduler(scheduler_config, Arc::new(state.adoption_service.clone()));

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("parsing listen address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the scheduler's senders lets the job queue run dry
    scheduler.abort();
    let _ = scheduler.await;
    if tokio::time::timeout(JOB_DRAIN_TIMEOUT, job_worker).await.is_err() {
        warn!("Job workers did not finish before shutdown timeout");
    }

    info!("Server shutdown complete");
    Ok(())
}
