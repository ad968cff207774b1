//! Outbound email.
//!
//! Delivery is best-effort: callers run inside job workers, which log a
//! failed send and move on.

use emr_common::config::{EmailProviderKind, EmailSettings};
use emr_common::{AppError, AppResult, IdGenerator};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Email message to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html_body: String,
}

#[derive(Clone)]
enum Transport {
    Log,
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Resend { api_key: String },
}

/// Email service.
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
    from: String,
    http_client: reqwest::Client,
    id_gen: IdGenerator,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: Option<String>,
}

impl EmailService {
    /// Build the service for the configured provider.
    pub fn from_settings(settings: &EmailSettings) -> AppResult<Self> {
        let transport = match settings.provider {
            EmailProviderKind::Log => Transport::Log,
            EmailProviderKind::Smtp => {
                let host = settings.smtp_host.as_deref().ok_or_else(|| {
                    AppError::Config("email.smtp_host is required for the smtp provider".into())
                })?;
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| AppError::Config(format!("invalid SMTP relay: {e}")))?
                    .port(settings.smtp_port);
                if let (Some(user), Some(pass)) =
                    (settings.smtp_username.clone(), settings.smtp_password.clone())
                {
                    builder = builder.credentials(Credentials::new(user, pass));
                }
                Transport::Smtp(builder.build())
            }
            EmailProviderKind::Resend => {
                let api_key = settings.resend_api_key.clone().ok_or_else(|| {
                    AppError::Config("email.resend_api_key is required for the resend provider".into())
                })?;
                Transport::Resend { api_key }
            }
        };

        Ok(Self {
            transport,
            from: format!("{} <{}>", settings.from_name, settings.from_address),
            http_client: reqwest::Client::new(),
            id_gen: IdGenerator::new(),
        })
    }

    /// A service that only logs messages.
    #[must_use]
    pub fn log_only() -> Self {
        Self {
            transport: Transport::Log,
            from: "EMR Adopt <no-reply@emradopt.org>".to_string(),
            http_client: reqwest::Client::new(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Send an email. Returns the provider's message id.
    pub async fn send(&self, message: &EmailMessage) -> AppResult<String> {
        match &self.transport {
            Transport::Log => {
                let message_id = self.id_gen.generate_message_id();
                tracing::info!(
                    to = %message.to,
                    subject = %message.subject,
                    message_id = %message_id,
                    "Email (log provider)"
                );
                Ok(message_id)
            }
            Transport::Smtp(mailer) => self.send_smtp(mailer, message).await,
            Transport::Resend { api_key } => self.send_resend(api_key, message).await,
        }
    }

    async fn send_smtp(
        &self,
        mailer: &AsyncSmtpTransport<Tokio1Executor>,
        message: &EmailMessage,
    ) -> AppResult<String> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Config(format!("invalid sender address: {e}")))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::BadRequest(format!("invalid recipient address: {e}")))?;
        let message_id = self.id_gen.generate_message_id();

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(format!("<{message_id}@emradopt.org>")))
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| AppError::Internal(format!("failed to build email: {e}")))?;

        mailer
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP send failed: {e}")))?;

        tracing::debug!(to = %message.to, message_id = %message_id, "Email sent via SMTP");
        Ok(message_id)
    }

    async fn send_resend(&self, api_key: &str, message: &EmailMessage) -> AppResult<String> {
        let body = ResendRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html_body,
        };

        let response = self
            .http_client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Resend request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Resend returned {status}: {error_text}"
            )));
        }

        let result: ResendResponse = response
            .json()
            .await
            .unwrap_or(ResendResponse { id: None });
        let message_id = result
            .id
            .unwrap_or_else(|| self.id_gen.generate_message_id());

        tracing::debug!(to = %message.to, message_id = %message_id, "Email sent via Resend");
        Ok(message_id)
    }
}

/// Email bodies. Each function returns `(subject, html)`; user-supplied text
/// is escaped.
pub mod templates {
    /// Escape text for inclusion in HTML.
    #[must_use]
    pub fn escape_html(input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(c),
            }
        }
        out
    }

    /// Format cents as US dollars, e.g. `$1,234.50`.
    #[must_use]
    pub fn format_usd(amount_cents: i64) -> String {
        let sign = if amount_cents < 0 { "-" } else { "" };
        let cents = amount_cents.unsigned_abs();
        let dollars = (cents / 100).to_string();

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, c) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        format!("{sign}${grouped}.{:02}", cents % 100)
    }

    /// Wrap body content in the shared layout.
    #[must_use]
    pub fn wrap_html(content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        a {{ color: #0d7a5f; }}
    </style>
</head>
<body>
    {content}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">EMR Adopt connects donors with rural health units in the Philippines.</p>
</body>
</html>"#
        )
    }

    #[must_use]
    pub fn welcome(name: &str, role: &str, base_url: &str) -> (String, String) {
        let body = format!(
            r#"<h1>Welcome, {}!</h1>
    <p>Your account has been created as a <strong>{}</strong>.</p>
    <p>Visit <a href="{}">EMR Adopt</a> to get started.</p>"#,
            escape_html(name),
            escape_html(role),
            escape_html(base_url),
        );
        ("Welcome to EMR Adopt".to_string(), wrap_html(&body))
    }

    #[must_use]
    pub fn adoption_created(donor_name: &str, rhu_name: &str) -> (String, String) {
        let body = format!(
            r"<h1>Adoption Confirmed</h1>
    <p>Hi {}, you are now supporting <strong>{}</strong>.</p>
    <p>Thank you for your generosity.</p>",
            escape_html(donor_name),
            escape_html(rhu_name),
        );
        ("Adoption Confirmed".to_string(), wrap_html(&body))
    }

    #[must_use]
    pub fn listing_validated(recipient_name: &str, rhu_name: &str) -> (String, String) {
        let body = format!(
            r"<h1>Your listing has been validated</h1>
    <p>Hi {}, <strong>{}</strong> is now live and visible to donors.</p>",
            escape_html(recipient_name),
            escape_html(rhu_name),
        );
        ("Your listing has been validated".to_string(), wrap_html(&body))
    }

    #[must_use]
    pub fn listing_rejected(recipient_name: &str, rhu_name: &str, reason: &str) -> (String, String) {
        let body = format!(
            r"<h1>Your listing needs changes</h1>
    <p>Hi {}, <strong>{}</strong> was not approved.</p>
    <p>Reason: {}</p>
    <p>You can edit the listing and submit it again.</p>",
            escape_html(recipient_name),
            escape_html(rhu_name),
            escape_html(reason),
        );
        ("Your listing needs changes".to_string(), wrap_html(&body))
    }

    #[must_use]
    pub fn adoption_cancelled(name: &str, rhu_name: &str) -> (String, String) {
        let body = format!(
            r"<h1>Adoption Cancelled</h1>
    <p>Hi {}, the adoption of <strong>{}</strong> has been cancelled.</p>",
            escape_html(name),
            escape_html(rhu_name),
        );
        ("Adoption Cancelled".to_string(), wrap_html(&body))
    }

    #[must_use]
    pub fn subscription_renewed(
        donor_name: &str,
        rhu_name: &str,
        amount_cents: i64,
    ) -> (String, String) {
        let body = format!(
            r"<h1>Donation Renewed</h1>
    <p>Hi {}, your donation of <strong>{}</strong> to <strong>{}</strong> has been processed.</p>",
            escape_html(donor_name),
            format_usd(amount_cents),
            escape_html(rhu_name),
        );
        ("Donation Renewed".to_string(), wrap_html(&body))
    }

    #[must_use]
    pub fn payment_failed(donor_name: &str, rhu_name: &str, amount_cents: i64) -> (String, String) {
        let body = format!(
            r"<h1>Payment Failed</h1>
    <p>Hi {}, your donation of <strong>{}</strong> to <strong>{}</strong> could not be processed.</p>
    <p>Please check your payment method.</p>",
            escape_html(donor_name),
            format_usd(amount_cents),
            escape_html(rhu_name),
        );
        ("Payment Failed".to_string(), wrap_html(&body))
    }
}
