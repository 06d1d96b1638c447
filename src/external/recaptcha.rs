use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::RecaptchaConfig,
    error::{AppError, AppResult},
};

const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

#[async_trait]
pub trait BotVerifier: Send + Sync {
    /// `false` means the caller must be rejected.
    async fn verify(&self, token: &str, expected_action: &str) -> bool;
}

/// Rejects the request with `BadRequest` when the bot check fails.
pub async fn verify_or_fail(
    verifier: &dyn BotVerifier,
    token: &str,
    expected_action: &str,
) -> AppResult<()> {
    if verifier.verify(token, expected_action).await {
        Ok(())
    } else {
        tracing::warn!(action = %expected_action, "bot verification rejected request");
        Err(AppError::BadRequest(
            "reCAPTCHA verification failed, please try again".into(),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub action: String,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

/// reCAPTCHA v3 scoring against Google's siteverify endpoint.
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret_key: Option<String>,
    min_score: f64,
}

impl RecaptchaVerifier {
    pub fn new(config: &RecaptchaConfig) -> Self {
        if config.secret_key.is_none() {
            tracing::warn!("RECAPTCHA_SECRET_KEY not set, bot verification is disabled");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            secret_key: config.secret_key.clone(),
            min_score: config.min_score,
        }
    }

    async fn siteverify(&self, secret: &str, token: &str) -> reqwest::Result<SiteVerifyResponse> {
        self.client
            .post(SITEVERIFY_URL)
            .query(&[("secret", secret), ("response", token)])
            .send()
            .await?
            .error_for_status()?
            .json::<SiteVerifyResponse>()
            .await
    }
}

#[async_trait]
impl BotVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, expected_action: &str) -> bool {
        let Some(secret) = self.secret_key.as_deref() else {
            tracing::warn!("skipping reCAPTCHA verification, secret key not configured");
            return true;
        };

        match self.siteverify(secret, token).await {
            Ok(resp) => evaluate(&resp, self.min_score, expected_action),
            Err(err) => {
                tracing::error!(error = %err, "reCAPTCHA verification request failed");
                false
            }
        }
    }
}

/// Pure scoring rule: success flag, minimum score, then action match.
pub fn evaluate(resp: &SiteVerifyResponse, min_score: f64, expected_action: &str) -> bool {
    tracing::debug!(
        success = resp.success,
        score = resp.score,
        action = %resp.action,
        "reCAPTCHA verification"
    );

    if !resp.success {
        tracing::warn!(errors = ?resp.error_codes, "reCAPTCHA verification failed");
        return false;
    }
    if resp.score < min_score {
        tracing::warn!(score = resp.score, min_score, "reCAPTCHA score too low");
        return false;
    }
    if !expected_action.is_empty() && resp.action != expected_action {
        tracing::warn!(
            expected = %expected_action,
            got = %resp.action,
            "reCAPTCHA action mismatch"
        );
        return false;
    }
    true
}
