use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde::Deserialize;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_id_token(&self, token: &str, audience: &str)
    -> anyhow::Result<GoogleIdentity>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    aud: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Validates ID tokens through Google's `tokeninfo` endpoint, which checks
/// signature and expiry server-side. Audience is checked here.
pub struct GoogleTokenInfoVerifier {
    client: reqwest::Client,
}

impl GoogleTokenInfoVerifier {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for GoogleTokenInfoVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenInfoVerifier {
    async fn verify_id_token(
        &self,
        token: &str,
        audience: &str,
    ) -> anyhow::Result<GoogleIdentity> {
        let info = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await
            .context("tokeninfo request failed")?
            .error_for_status()
            .context("Google rejected the ID token")?
            .json::<TokenInfo>()
            .await
            .context("malformed tokeninfo response")?;

        identity_from_token_info(info, audience)
    }
}

fn identity_from_token_info(info: TokenInfo, audience: &str) -> anyhow::Result<GoogleIdentity> {
    if info.aud != audience {
        bail!("ID token audience mismatch");
    }
    let Some(email) = info.email else {
        bail!("ID token carries no email");
    };
    if info.email_verified.as_deref() == Some("false") {
        bail!("Google email is not verified");
    }

    Ok(GoogleIdentity {
        subject: info.sub,
        email,
        name: info.name,
        picture: info.picture,
    })
}
