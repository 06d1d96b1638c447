use std::env;

/// Runtime settings, read once at startup and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub frontend_url: String,
    pub google_client_id: Option<String>,
    pub recaptcha: RecaptchaConfig,
    pub smtp: Option<SmtpConfig>,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct RecaptchaConfig {
    /// `None` disables bot verification entirely (local and test environments).
    pub secret_key: Option<String>,
    pub min_score: f64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let ttl_hours = env::var("JWT_EXPIRES_IN_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(24);

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let recaptcha = RecaptchaConfig {
            secret_key: non_empty_var("RECAPTCHA_SECRET_KEY"),
            min_score: env::var("RECAPTCHA_MIN_SCORE")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.5),
        };

        let smtp = match non_empty_var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse::<u16>().ok())
                    .unwrap_or(587),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from: env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "Clinic <no-reply@localhost>".to_string()),
            }),
            None => None,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            jwt: JwtConfig { secret, ttl_hours },
            frontend_url,
            google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            recaptcha,
            smtp,
            cors_origins,
        })
    }

    /// Settings for tests and tooling that never reach external services.
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                ttl_hours: 1,
            },
            frontend_url: "http://localhost:5173".to_string(),
            google_client_id: Some("test-google-client".to_string()),
            recaptcha: RecaptchaConfig {
                secret_key: None,
                min_score: 0.5,
            },
            smtp: None,
            cors_origins: Vec::new(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
