//! Outbound collaborators: email delivery, bot scoring and Google identity.
//! Each one sits behind a trait so tests can swap in doubles through `AppState`.

pub mod google;
pub mod mailer;
pub mod recaptcha;

pub use google::{GoogleIdentity, GoogleTokenInfoVerifier, IdentityVerifier};
pub use mailer::{LogMailer, Mailer, SmtpMailer};
pub use recaptcha::{BotVerifier, RecaptchaVerifier};
