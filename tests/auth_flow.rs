mod common;

use chrono::{Duration, Utc};
use clinic_booking_api::{
    dto::auth::{
        ForgotPasswordRequest, GoogleAuthRequest, LoginRequest, RegisterRequest,
        ResetPasswordRequest, VerifyEmailRequest,
    },
    entity::{Users, sea_orm_active_enums::AuthProvider, users::ActiveModel as UserActive},
    error::AppError,
    services::{
        auth_service, session::decode_session,
        token_service::{self, TokenKind},
    },
};
use common::{MailKind, RecordingMailer, google_token, setup, setup_with, unique_email};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "Password123!".to_string(),
        full_name: "Ana Gomez".to_string(),
        phone: None,
        dni: None,
        recaptcha_token: "token".to_string(),
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
        recaptcha_token: "token".to_string(),
    }
}

#[tokio::test]
async fn register_then_verify_email_exactly_once() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("a");

    let resp = auth_service::register(&app.state, register_request(&email)).await?;
    let auth = resp.data.expect("auth data");
    assert!(!auth.user.email_verified);
    assert!(!auth.access_token.is_empty());

    let claims = decode_session(&app.state.config.jwt, &auth.access_token)?;
    assert_eq!(claims.sub, auth.user.id.to_string());
    assert_eq!(claims.role, "patient");

    let wrong = auth_service::verify_email(
        &app.state,
        VerifyEmailRequest {
            token: "wrong-token".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let token = app
        .mailer
        .last_token(MailKind::Verification, &email)
        .expect("verification email sent");
    auth_service::verify_email(&app.state, VerifyEmailRequest { token: token.clone() }).await?;

    let profile = auth_service::profile(&app.state, auth.user.id).await?;
    assert!(profile.data.expect("profile").email_verified);

    let again = auth_service::verify_email(&app.state, VerifyEmailRequest { token }).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_and_dni_conflict() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("dup");
    let dni = format!("{:08}", Uuid::new_v4().as_u128() % 100_000_000);

    let mut first = register_request(&email);
    first.dni = Some(dni.clone());
    auth_service::register(&app.state, first).await?;

    let same_email = auth_service::register(&app.state, register_request(&email)).await;
    assert!(matches!(same_email, Err(AppError::Conflict(_))));

    let mut same_dni = register_request(&unique_email("other"));
    same_dni.dni = Some(dni);
    let same_dni = auth_service::register(&app.state, same_dni).await;
    assert!(matches!(same_dni, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn registration_survives_mail_failure() -> anyhow::Result<()> {
    let app = setup_with(RecordingMailer::failing(), true).await?;
    let email = unique_email("nomail");

    let resp = auth_service::register(&app.state, register_request(&email)).await?;
    let user_id = resp.data.expect("auth data").user.id;
    assert!(Users::find_by_id(user_id).one(&app.state.orm).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn failed_bot_check_blocks_registration() -> anyhow::Result<()> {
    let app = setup_with(RecordingMailer::default(), false).await?;
    let result = auth_service::register(&app.state, register_request(&unique_email("bot"))).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(app.mailer.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> anyhow::Result<()> {
    let app = setup().await?;
    let resp = auth_service::register(&app.state, register_request(&unique_email("exp"))).await?;
    let user_id = resp.data.expect("auth data").user.id;

    let expired_at = Utc::now().fixed_offset() - Duration::seconds(1);
    let token = token_service::issue_with_expiry(
        &app.state.orm,
        TokenKind::EmailVerification,
        user_id,
        expired_at,
    )
    .await?;

    let result = auth_service::verify_email(&app.state, VerifyEmailRequest { token }).await;
    assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.contains("expired")));
    Ok(())
}

#[tokio::test]
async fn older_tokens_stay_valid_after_reissue() -> anyhow::Result<()> {
    let app = setup().await?;
    let resp = auth_service::register(&app.state, register_request(&unique_email("multi"))).await?;
    let user_id = resp.data.expect("auth data").user.id;

    let first = token_service::issue(&app.state.orm, TokenKind::PasswordReset, user_id).await?;
    let _second = token_service::issue(&app.state.orm, TokenKind::PasswordReset, user_id).await?;

    let owner = token_service::consume(&app.state.orm, TokenKind::PasswordReset, &first).await?;
    assert_eq!(owner, user_id);
    Ok(())
}

#[tokio::test]
async fn login_checks_credentials_and_account_state() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("login");
    let resp = auth_service::register(&app.state, register_request(&email)).await?;
    let user_id = resp.data.expect("auth data").user.id;

    let ok = auth_service::login(&app.state, login_request(&email, "Password123!")).await?;
    assert_eq!(ok.data.expect("auth").user.id, user_id);

    let wrong = auth_service::login(&app.state, login_request(&email, "Wrong123!")).await;
    assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

    let unknown =
        auth_service::login(&app.state, login_request(&unique_email("ghost"), "Password123!")).await;
    assert!(matches!(unknown, Err(AppError::Unauthorized(_))));

    let user = Users::find_by_id(user_id).one(&app.state.orm).await?.expect("user");
    let mut active: UserActive = user.into();
    active.is_active = Set(false);
    active.update(&app.state.orm).await?;

    let inactive = auth_service::login(&app.state, login_request(&email, "Password123!")).await;
    assert!(matches!(inactive, Err(AppError::Unauthorized(_))));
    Ok(())
}

#[tokio::test]
async fn oauth_only_account_is_directed_to_google() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("google");

    let resp = auth_service::google_auth(
        &app.state,
        GoogleAuthRequest {
            google_token: google_token(&format!("sub-{}", Uuid::new_v4()), &email),
            recaptcha_token: String::new(),
        },
    )
    .await?;
    let user = resp.data.expect("auth data").user;
    assert!(user.email_verified);

    let result = auth_service::login(&app.state, login_request(&email, "Password123!")).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn google_sign_in_links_existing_account() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("link");
    let registered = auth_service::register(&app.state, register_request(&email))
        .await?
        .data
        .expect("auth data")
        .user;
    let subject = format!("sub-{}", registered.id);

    let linked = auth_service::google_auth(
        &app.state,
        GoogleAuthRequest {
            google_token: google_token(&subject, &email),
            recaptcha_token: String::new(),
        },
    )
    .await?
    .data
    .expect("auth data")
    .user;
    assert_eq!(linked.id, registered.id);
    assert!(linked.email_verified);

    let stored = Users::find_by_id(registered.id)
        .one(&app.state.orm)
        .await?
        .expect("user");
    assert_eq!(stored.auth_provider, AuthProvider::Google);
    assert_eq!(stored.google_id.as_deref(), Some(subject.as_str()));

    // Password login keeps working for a linked account.
    auth_service::login(&app.state, login_request(&email, "Password123!")).await?;
    Ok(())
}

#[tokio::test]
async fn invalid_google_token_is_bad_request() -> anyhow::Result<()> {
    let app = setup().await?;
    let result = auth_service::google_auth(
        &app.state,
        GoogleAuthRequest {
            google_token: "garbage".into(),
            recaptcha_token: String::new(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("reset");
    auth_service::register(&app.state, register_request(&email)).await?;

    let known = auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: email.clone(),
            recaptcha_token: String::new(),
        },
    )
    .await?;
    let unknown = auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: unique_email("nobody"),
            recaptcha_token: String::new(),
        },
    )
    .await?;

    assert_eq!(known.message, unknown.message);
    assert_eq!(
        known.data.expect("data").message,
        unknown.data.expect("data").message
    );

    let resets: Vec<_> = app
        .mailer
        .sent()
        .into_iter()
        .filter(|m| m.kind == MailKind::PasswordReset)
        .collect();
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].to, email);
    Ok(())
}

#[tokio::test]
async fn reset_password_consumes_token_once() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("newpass");
    auth_service::register(&app.state, register_request(&email)).await?;
    auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: email.clone(),
            recaptcha_token: String::new(),
        },
    )
    .await?;
    let token = app
        .mailer
        .last_token(MailKind::PasswordReset, &email)
        .expect("reset email sent");

    auth_service::reset_password(
        &app.state,
        ResetPasswordRequest {
            token: token.clone(),
            new_password: "NewPassword456!".into(),
        },
    )
    .await?;

    auth_service::login(&app.state, login_request(&email, "NewPassword456!")).await?;
    let old = auth_service::login(&app.state, login_request(&email, "Password123!")).await;
    assert!(matches!(old, Err(AppError::Unauthorized(_))));

    let again = auth_service::reset_password(
        &app.state,
        ResetPasswordRequest {
            token,
            new_password: "Another789!".into(),
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn resend_verification_rejects_verified_accounts() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("resend");
    let user_id = auth_service::register(&app.state, register_request(&email))
        .await?
        .data
        .expect("auth data")
        .user
        .id;

    auth_service::resend_verification(&app.state, user_id).await?;
    let sent = app
        .mailer
        .sent()
        .into_iter()
        .filter(|m| m.kind == MailKind::Verification && m.to == email)
        .count();
    assert_eq!(sent, 2);

    let token = app
        .mailer
        .last_token(MailKind::Verification, &email)
        .expect("token");
    auth_service::verify_email(&app.state, VerifyEmailRequest { token }).await?;

    let result = auth_service::resend_verification(&app.state, user_id).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn password_resembling_a_hash_is_still_hashed() -> anyhow::Result<()> {
    let app = setup().await?;
    let email = unique_email("dollar");
    let mut request = register_request(&email);
    request.password = "$argon2$Abcdefg1".to_string();
    let user_id = auth_service::register(&app.state, request)
        .await?
        .data
        .expect("auth data")
        .user
        .id;

    let stored = Users::find_by_id(user_id)
        .one(&app.state.orm)
        .await?
        .expect("user");
    assert_ne!(stored.password_hash.as_deref(), Some("$argon2$Abcdefg1"));

    let ok = auth_service::login(&app.state, login_request(&email, "$argon2$Abcdefg1")).await?;
    assert_eq!(ok.data.expect("auth").user.id, user_id);
    Ok(())
}
