//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Outbound email configuration.
    #[serde(default)]
    pub email: EmailSettings,
    /// Recurring billing configuration.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the site, used for links in emails.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Which transport delivers outbound email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    /// Write the message to the log and drop it.
    #[default]
    Log,
    /// Deliver through an SMTP relay.
    Smtp,
    /// Deliver through the Resend HTTP API.
    Resend,
}

/// Email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Delivery provider.
    #[serde(default)]
    pub provider: EmailProviderKind,
    /// Sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Resend API key.
    #[serde(default)]
    pub resend_api_key: Option<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            provider: EmailProviderKind::Log,
            from_address: default_from_address(),
            from_name: default_from_name(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            resend_api_key: None,
        }
    }
}

/// Recurrence interval of an adoption's donations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    /// Every 7 days.
    Weekly,
    /// Same day of every calendar month (clamped to month end).
    #[default]
    Monthly,
}

/// Recurring billing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Billing period length.
    #[serde(default)]
    pub period: BillingPeriod,
    /// Consecutive failed payments after which an adoption is cancelled.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Seconds between billing sweeps.
    #[serde(default = "default_scheduler_interval_secs")]
    pub scheduler_interval_secs: u64,
    /// Adoptions loaded per page during a sweep.
    #[serde(default = "default_scheduler_batch_size")]
    pub scheduler_batch_size: u64,
    /// Donation amount used when the `donation_amount_cents` setting is absent.
    #[serde(default = "default_donation_amount_cents")]
    pub default_donation_amount_cents: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            period: BillingPeriod::Monthly,
            max_consecutive_failures: default_max_consecutive_failures(),
            scheduler_interval_secs: default_scheduler_interval_secs(),
            scheduler_batch_size: default_scheduler_batch_size(),
            default_donation_amount_cents: default_donation_amount_cents(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_from_address() -> String {
    "no-reply@emradopt.org".to_string()
}

fn default_from_name() -> String {
    "EMR Adopt".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_max_consecutive_failures() -> u32 {
    3
}

const fn default_scheduler_interval_secs() -> u64 {
    3600
}

const fn default_scheduler_batch_size() -> u64 {
    200
}

/// $500.00
const fn default_donation_amount_cents() -> i64 {
    50_000
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `EMR_ENV`)
    /// 3. Environment variables with `EMR_` prefix (`EMR_DATABASE__URL`)
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("EMR_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("EMR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize::<Self>()?.validated()
    }

    /// Reject values that would only fail later, at first use.
    fn validated(self) -> Result<Self, config::ConfigError> {
        if self.billing.default_donation_amount_cents <= 0 {
            return Err(config::ConfigError::Message(format!(
                "billing.default_donation_amount_cents must be positive, got {}",
                self.billing.default_donation_amount_cents
            )));
        }
        Ok(self)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("EMR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize::<Self>()?.validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [server]
            url = "https://emradopt.org"

            [database]
            url = "postgres://localhost/emr"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.email.provider, EmailProviderKind::Log);
        assert_eq!(config.billing.period, BillingPeriod::Monthly);
        assert_eq!(config.billing.max_consecutive_failures, 3);
        assert_eq!(config.billing.default_donation_amount_cents, 50_000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_non_positive_default_amount_is_rejected() {
        let config = parse(
            r#"
            [server]
            url = "https://emradopt.org"

            [database]
            url = "postgres://localhost/emr"

            [billing]
            default_donation_amount_cents = 0
            "#,
        );

        let err = config.validated().unwrap_err();
        assert!(err.to_string().contains("default_donation_amount_cents"));
        assert!(parse(
            r#"
            [server]
            url = "https://emradopt.org"

            [database]
            url = "postgres://localhost/emr"
            "#,
        )
        .validated()
        .is_ok());
    }

    #[test]
    fn test_billing_and_email_sections() {
        let config = parse(
            r#"
            [server]
            url = "https://emradopt.org"

            [database]
            url = "postgres://localhost/emr"

            [email]
            provider = "resend"
            resend_api_key = "re_123"

            [billing]
            period = "weekly"
            max_consecutive_failures = 5
            "#,
        );

        assert_eq!(config.email.provider, EmailProviderKind::Resend);
        assert_eq!(config.email.resend_api_key.as_deref(), Some("re_123"));
        assert_eq!(config.email.from_name, "EMR Adopt");
        assert_eq!(config.billing.period, BillingPeriod::Weekly);
        assert_eq!(config.billing.max_consecutive_failures, 5);
        assert_eq!(config.billing.scheduler_interval_secs, 3600);
    }
}
