#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::bail;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use clinic_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::services::CreateServiceRequest,
    entity::{
        sea_orm_active_enums::{AuthProvider, UserRole},
        users::Model as UserModel,
    },
    external::{BotVerifier, GoogleIdentity, IdentityVerifier, Mailer},
    models::Service,
    services::{catalog_service, password::hash_password, user_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailKind {
    Verification,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: MailKind,
    pub to: String,
    pub token: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_token(&self, kind: MailKind, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.kind == kind && m.to == to)
            .map(|m| m.token)
    }

    fn record(&self, kind: MailKind, to: &str, token: &str) -> anyhow::Result<()> {
        if self.fail {
            bail!("SMTP unavailable");
        }
        self.sent.lock().unwrap().push(SentMail {
            kind,
            to: to.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(&self, to: &str, _name: &str, token: &str) -> anyhow::Result<()> {
        self.record(MailKind::Verification, to, token)
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        _name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        self.record(MailKind::PasswordReset, to, token)
    }
}

pub struct FixedBotVerifier(pub bool);

#[async_trait]
impl BotVerifier for FixedBotVerifier {
    async fn verify(&self, _token: &str, _expected_action: &str) -> bool {
        self.0
    }
}

/// Accepts tokens shaped `google:<subject>:<email>` for the configured audience.
pub struct FakeIdentityVerifier;

#[async_trait]
impl IdentityVerifier for FakeIdentityVerifier {
    async fn verify_id_token(&self, token: &str, audience: &str) -> anyhow::Result<GoogleIdentity> {
        if audience != "test-google-client" {
            bail!("unexpected audience");
        }
        let mut parts = token.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("google"), Some(subject), Some(email)) => Ok(GoogleIdentity {
                subject: subject.to_string(),
                email: email.to_string(),
                name: Some("Google Patient".to_string()),
                picture: Some("https://example.com/avatar.png".to_string()),
            }),
            _ => bail!("invalid token"),
        }
    }
}

pub fn google_token(subject: &str, email: &str) -> String {
    format!("google:{subject}:{email}")
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

fn database_url() -> String {
    std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

pub async fn setup() -> anyhow::Result<TestApp> {
    setup_with(RecordingMailer::default(), true).await
}

pub async fn setup_with(mailer: RecordingMailer, bot_allows: bool) -> anyhow::Result<TestApp> {
    let url = database_url();
    let orm = create_orm_conn(&url).await?;
    run_migrations(&orm).await?;

    let mailer = Arc::new(mailer);
    let state = AppState {
        orm,
        config: Arc::new(AppConfig::for_tests(url)),
        mailer: mailer.clone(),
        bot_verifier: Arc::new(FixedBotVerifier(bot_allows)),
        identity: Arc::new(FakeIdentityVerifier),
    };
    Ok(TestApp { state, mailer })
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// A date no other test run is likely to book, so a shared database stays usable.
pub fn unique_date() -> NaiveDate {
    let offset = (Uuid::new_v4().as_u128() % 3_000_000) as i64;
    Utc::now().date_naive() + Duration::days(365 + offset)
}

pub async fn create_patient(state: &AppState, email: &str) -> anyhow::Result<UserModel> {
    let active = user_service::new_patient(
        email.to_string(),
        "Test Patient".to_string(),
        Some(hash_password("Password123!")?),
        AuthProvider::Local,
    );
    Ok(active.insert(&state.orm).await?)
}

pub async fn create_admin(state: &AppState) -> anyhow::Result<UserModel> {
    let mut active = user_service::new_patient(
        unique_email("admin"),
        "Clinic Admin".to_string(),
        Some(hash_password("Admin123!")?),
        AuthProvider::Local,
    );
    active.role = Set(UserRole::Admin);
    Ok(active.insert(&state.orm).await?)
}

pub async fn create_service(
    state: &AppState,
    admin_id: Uuid,
    name: &str,
    price: i64,
    deposit: i64,
) -> anyhow::Result<Service> {
    let resp = catalog_service::create(
        state,
        CreateServiceRequest {
            name: name.to_string(),
            description: None,
            duration_minutes: 60,
            price,
            deposit_amount: deposit,
            is_active: None,
            display_order: None,
        },
        admin_id,
    )
    .await?;
    Ok(resp.data.expect("service data"))
}
