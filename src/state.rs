use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    external::{
        BotVerifier, GoogleTokenInfoVerifier, IdentityVerifier, LogMailer, Mailer,
        RecaptchaVerifier, SmtpMailer,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub bot_verifier: Arc<dyn BotVerifier>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Wires the production collaborators from configuration.
    pub fn new(orm: DatabaseConnection, config: AppConfig) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.frontend_url)?),
            None => {
                tracing::warn!("SMTP not configured, emails will only be logged");
                Arc::new(LogMailer::new(&config.frontend_url))
            }
        };
        let bot_verifier: Arc<dyn BotVerifier> = Arc::new(RecaptchaVerifier::new(&config.recaptcha));
        let identity: Arc<dyn IdentityVerifier> = Arc::new(GoogleTokenInfoVerifier::new());

        Ok(Self {
            orm,
            config: Arc::new(config),
            mailer,
            bot_verifier,
            identity,
        })
    }
}
