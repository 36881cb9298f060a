//! Email Notifier
//!
//! The `Notifier` boundary and its SMTP implementation.

use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
    message::{header, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::{error, info};
use tera::{Context, Tera};

use crate::config::EmailConfig;
use crate::utils::error::{AppError, AppResult};

/// Outbound notification boundary.
///
/// Delivery is best-effort: callers treat a failed send as an observability
/// event, not a flow failure.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to the given address
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// HTML layout wrapped around every outgoing message. The plain-text
/// alternative part carries the body unchanged.
const LAYOUT_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ subject }}</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { text-align: center; background: #f8f9fa; padding: 20px; border-radius: 8px 8px 0 0; }
        .content { background: white; padding: 30px; border: 1px solid #dee2e6; }
        .footer { background: #f8f9fa; padding: 20px; border-radius: 0 0 8px 8px; text-align: center; font-size: 12px; color: #666; }
    </style>
</head>
<body>
    <div class="header">
        <h1>{{ subject }}</h1>
    </div>
    <div class="content">
        <div style="white-space: pre-line;">{{ body }}</div>
    </div>
    <div class="footer">
        <p>This email was sent from {{ app_name }}. If you have any questions, please contact our support team.</p>
        <p>© {{ current_year }} {{ app_name }}. All rights reserved.</p>
    </div>
</body>
</html>
"#;

/// Notifier implementation delivering mail over SMTP
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    templates: Tera,
    config: EmailConfig,
}

impl EmailService {
    /// Create a new email service from SMTP configuration
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| AppError::Configuration(format!("Failed to configure SMTP relay: {}", e)))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        let mut templates = Tera::default();
        templates
            .add_raw_template("notification.html", LAYOUT_TEMPLATE)
            .map_err(|e| AppError::Configuration(format!("Failed to add email template: {}", e)))?;

        Ok(Self {
            transport,
            templates,
            config,
        })
    }

    fn render_html(&self, subject: &str, body: &str) -> AppResult<String> {
        let mut context = Context::new();
        context.insert("subject", subject);
        context.insert("body", body);
        context.insert("app_name", &self.config.from_name);
        context.insert("current_year", &chrono::Utc::now().year());

        self.templates
            .render("notification.html", &context)
            .map_err(|e| AppError::Internal(format!("Failed to render email template: {}", e)))
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> AppResult<()> {
        let html_body = self.render_html(subject, body)?;

        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| AppError::Configuration(format!("Invalid from address: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid recipient email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("email sent to {}: {}", to_email, subject);
                Ok(())
            }
            Err(e) => {
                error!("failed to send email to {}: {}", to_email, e);
                Err(AppError::Notification(format!("Failed to send email: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer@example.com".to_string(),
            smtp_password: "password".to_string(),
            from_name: "Auth Service".to_string(),
            from_email: "noreply@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_service_creation_and_template() {
        let service = EmailService::new(test_config()).unwrap();

        assert!(service
            .templates
            .get_template_names()
            .any(|name| name == "notification.html"));
    }

    #[tokio::test]
    async fn test_render_html_embeds_subject_and_body() {
        let service = EmailService::new(test_config()).unwrap();

        let html = service
            .render_html("Your OTP Code", "Dear Alice,\n\nYour OTP code is 123456.")
            .unwrap();

        assert!(html.contains("Your OTP Code"));
        assert!(html.contains("123456"));
        assert!(html.contains("Auth Service"));
    }
}
