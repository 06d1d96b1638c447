use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        AuthResponse, ForgotPasswordRequest, GoogleAuthRequest, LoginRequest, RegisterRequest,
        ResetPasswordRequest, VerifyEmailRequest,
    },
    entity::{
        Users,
        sea_orm_active_enums::AuthProvider,
        users::{ActiveModel as UserActive, Column as UserCol, Model as UserModel},
    },
    error::{AppError, AppResult},
    external::{GoogleIdentity, recaptcha::verify_or_fail},
    models::{PublicUser, User},
    response::{ApiResponse, MessageData, Meta},
    services::{
        password::{hash_password, verify_password},
        session::issue_session,
        token_service::{self, TokenKind},
        user_service::{self, ACCOUNT_TAKEN},
    },
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const FORGOT_PASSWORD_REPLY: &str =
    "If the email is registered, you will receive a link to reset your password";

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    verify_or_fail(state.bot_verifier.as_ref(), &payload.recaptcha_token, "register").await?;

    let RegisterRequest {
        email,
        password,
        full_name,
        phone,
        dni,
        ..
    } = payload;

    user_service::ensure_email_free(&state.orm, &email).await?;
    if let Some(dni) = dni.as_deref() {
        user_service::ensure_dni_free(&state.orm, dni, None).await?;
    }

    let password_hash = hash_password(&password)?;

    let txn = state.orm.begin().await?;
    let mut active = user_service::new_patient(email, full_name, Some(password_hash), AuthProvider::Local);
    active.phone = Set(phone);
    active.dni = Set(dni);
    let user = active
        .insert(&txn)
        .await
        .map_err(|e| AppError::unique_violation_as(e, ACCOUNT_TAKEN))?;
    let token = token_service::issue(&txn, TokenKind::EmailVerification, user.id).await?;
    txn.commit().await?;

    // The account exists either way; a lost email can be re-requested.
    if let Err(err) = state
        .mailer
        .send_verification_email(&user.email, &user.full_name, &token)
        .await
    {
        tracing::error!(error = %err, user_id = %user.id, "failed to send verification email");
    }

    log_audit(
        &state.orm,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;
    tracing::info!(user_id = %user.id, "user registered");

    let resp = auth_response(state, &user)?;
    Ok(ApiResponse::success("User registered", resp, None))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    verify_or_fail(state.bot_verifier.as_ref(), &payload.recaptcha_token, "login").await?;

    let user = user_service::find_by_email(&state.orm, &payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let Some(stored_hash) = user.password_hash.as_deref() else {
        return Err(AppError::BadRequest(
            "This account was created with Google. Please sign in with Google".into(),
        ));
    };

    if !verify_password(&payload.password, stored_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".into()));
    }

    log_audit(
        &state.orm,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    let resp = auth_response(state, &user)?;
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Sign in with a Google ID token. Matches by Google subject, then links an
/// existing account by email, then creates a new one.
pub async fn google_auth(
    state: &AppState,
    payload: GoogleAuthRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    verify_or_fail(state.bot_verifier.as_ref(), &payload.recaptcha_token, "google_login").await?;

    let audience = state
        .config
        .google_client_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Google sign-in is not configured".into()))?;

    let identity = state
        .identity
        .verify_id_token(&payload.google_token, audience)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "Google token rejected");
            AppError::BadRequest("Invalid Google token".into())
        })?;

    let user = resolve_google_user(state, identity).await?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".into()));
    }

    log_audit(
        &state.orm,
        Some(user.id),
        "user_google_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    let resp = auth_response(state, &user)?;
    Ok(ApiResponse::success("Logged in with Google", resp, Some(Meta::empty())))
}

async fn resolve_google_user(state: &AppState, identity: GoogleIdentity) -> AppResult<UserModel> {
    if let Some(user) = user_service::find_by_google_id(&state.orm, &identity.subject).await? {
        return Ok(user);
    }

    if let Some(existing) = user_service::find_by_email(&state.orm, &identity.email).await? {
        let avatar_url = identity.picture.or_else(|| existing.avatar_url.clone());
        let mut active: UserActive = existing.into();
        active.google_id = Set(Some(identity.subject));
        active.avatar_url = Set(avatar_url);
        active.auth_provider = Set(AuthProvider::Google);
        active.email_verified = Set(true);
        active.updated_at = Set(Utc::now().fixed_offset());
        let linked = active.update(&state.orm).await?;
        tracing::info!(user_id = %linked.id, "linked Google account to existing user");
        return Ok(linked);
    }

    let full_name = identity.name.unwrap_or_else(|| identity.email.clone());
    let mut active = user_service::new_patient(identity.email, full_name, None, AuthProvider::Google);
    active.google_id = Set(Some(identity.subject));
    active.avatar_url = Set(identity.picture);
    active.email_verified = Set(true);
    let user = active
        .insert(&state.orm)
        .await
        .map_err(|e| AppError::unique_violation_as(e, ACCOUNT_TAKEN))?;
    tracing::info!(user_id = %user.id, "user created from Google sign-in");
    Ok(user)
}

pub async fn verify_email(
    state: &AppState,
    payload: VerifyEmailRequest,
) -> AppResult<ApiResponse<MessageData>> {
    let txn = state.orm.begin().await?;
    let user_id = token_service::consume(&txn, TokenKind::EmailVerification, &payload.token).await?;
    Users::update_many()
        .col_expr(UserCol::EmailVerified, Expr::value(true))
        .col_expr(UserCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(UserCol::Id.eq(user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(user_id = %user_id, "email verified");
    Ok(ApiResponse::success(
        "Email verified",
        MessageData::new("Email verified successfully"),
        None,
    ))
}

/// Replies with the same wording whether or not the account exists.
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<MessageData>> {
    verify_or_fail(
        state.bot_verifier.as_ref(),
        &payload.recaptcha_token,
        "forgot_password",
    )
    .await?;

    let user = user_service::find_by_email(&state.orm, &payload.email).await?;
    match user {
        Some(user) if user.is_active && !user.is_oauth_only() => {
            let token = token_service::issue(&state.orm, TokenKind::PasswordReset, user.id).await?;
            if let Err(err) = state
                .mailer
                .send_password_reset_email(&user.email, &user.full_name, &token)
                .await
            {
                tracing::error!(error = %err, user_id = %user.id, "failed to send password reset email");
            }
        }
        _ => tracing::debug!("password reset requested for unknown or passwordless account"),
    }

    Ok(ApiResponse::success(
        "Password reset requested",
        MessageData::new(FORGOT_PASSWORD_REPLY),
        None,
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<MessageData>> {
    let password_hash = hash_password(&payload.new_password)?;

    let txn = state.orm.begin().await?;
    let user_id = token_service::consume(&txn, TokenKind::PasswordReset, &payload.token).await?;
    Users::update_many()
        .col_expr(UserCol::PasswordHash, Expr::value(password_hash))
        .col_expr(UserCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(UserCol::Id.eq(user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    log_audit(
        &state.orm,
        Some(user_id),
        "password_reset",
        Some("users"),
        None,
    )
    .await;

    Ok(ApiResponse::success(
        "Password reset",
        MessageData::new("Password updated successfully"),
        None,
    ))
}

pub async fn profile(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = user_service::find_active(&state.orm, user_id).await?;
    Ok(ApiResponse::success("Profile", User::from(user), None))
}

/// Unlike registration, a send failure here is reported to the caller.
pub async fn resend_verification(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<MessageData>> {
    let user = user_service::find_active(&state.orm, user_id).await?;
    if user.email_verified {
        return Err(AppError::BadRequest("Email is already verified".into()));
    }

    let token = token_service::issue(&state.orm, TokenKind::EmailVerification, user.id).await?;
    state
        .mailer
        .send_verification_email(&user.email, &user.full_name, &token)
        .await?;

    Ok(ApiResponse::success(
        "Verification email sent",
        MessageData::new("Verification email sent"),
        None,
    ))
}

fn auth_response(state: &AppState, user: &UserModel) -> AppResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: issue_session(&state.config.jwt, user)?,
        user: PublicUser::from(user),
    })
}
