use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{PoolConfig, authentication::Credentials},
};

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(&self, to: &str, name: &str, token: &str)
    -> anyhow::Result<()>;

    async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    frontend_url: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, frontend_url: &str) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("invalid SMTP relay")?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .pool_config(PoolConfig::new().max_size(4))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send_html(&self, to: &str, subject: &str, html: String) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.parse().context("invalid from address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .context("failed to build email")?;

        self.transport
            .send(email)
            .await
            .context("SMTP send failed")?;
        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let link = verification_link(&self.frontend_url, token);
        self.send_html(to, "Verify your email", verification_body(name, &link))
            .await
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let link = reset_link(&self.frontend_url, token);
        self.send_html(to, "Reset your password", reset_body(name, &link))
            .await
    }
}

/// Used when SMTP is not configured. Writes the links to the log instead of sending.
pub struct LogMailer {
    frontend_url: String,
}

impl LogMailer {
    pub fn new(frontend_url: &str) -> Self {
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(
        &self,
        to: &str,
        _name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let link = verification_link(&self.frontend_url, token);
        tracing::info!(to = %to, link = %link, "verification email (not sent, SMTP disabled)");
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        _name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let link = reset_link(&self.frontend_url, token);
        tracing::info!(to = %to, link = %link, "password reset email (not sent, SMTP disabled)");
        Ok(())
    }
}

pub fn verification_link(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/verify-email?token={token}")
}

pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/reset-password?token={token}")
}

/// Escapes the HTML-special characters of user-supplied text.
fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(ch),
        }
    }
    output
}

fn verification_body(name: &str, link: &str) -> String {
    let name = escape_html(name);
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #333;">
    <h2>Hi {name},</h2>
    <p>Thanks for signing up. Confirm your email address to finish setting up your account.</p>
    <p><a href="{link}" style="background: #6b46c1; color: #fff; padding: 12px 24px; border-radius: 6px; text-decoration: none;">Verify my email</a></p>
    <p>If the button does not work, copy this link into your browser:</p>
    <p style="word-break: break-all; color: #666; font-size: 14px;">{link}</p>
    <p><strong>This link expires in 24 hours.</strong></p>
  </body>
</html>"#
    )
}

fn reset_body(name: &str, link: &str) -> String {
    let name = escape_html(name);
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #333;">
    <h2>Hi {name},</h2>
    <p>We received a request to reset your password.</p>
    <p><a href="{link}" style="background: #6b46c1; color: #fff; padding: 12px 24px; border-radius: 6px; text-decoration: none;">Reset my password</a></p>
    <p style="word-break: break-all; color: #666; font-size: 14px;">{link}</p>
    <ul>
      <li>This link expires in 1 hour.</li>
      <li>If you did not ask for a reset, ignore this email. Your password stays the same.</li>
    </ul>
  </body>
</html>"#
    )
}
