//! One-time tokens for email verification and password reset.
//!
//! A token is valid while it is unconsumed and `now <= expires_at`. Consuming
//! flips the flag through a conditional update, so a token can be redeemed
//! once even when two requests race for it.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    entity::{
        EmailVerificationTokens, PasswordResetTokens, email_verification_tokens,
        password_reset_tokens,
    },
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
}

impl TokenKind {
    pub fn ttl(self) -> Duration {
        match self {
            TokenKind::EmailVerification => Duration::hours(24),
            TokenKind::PasswordReset => Duration::hours(1),
        }
    }

    fn invalid_message(self) -> &'static str {
        match self {
            TokenKind::EmailVerification => "Invalid verification token",
            TokenKind::PasswordReset => "Invalid reset token",
        }
    }

    fn expired_message(self) -> &'static str {
        match self {
            TokenKind::EmailVerification => "Verification token has expired",
            TokenKind::PasswordReset => "Reset token has expired",
        }
    }
}

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn issue<C: ConnectionTrait>(conn: &C, kind: TokenKind, user_id: Uuid) -> AppResult<String> {
    let now = Utc::now().fixed_offset();
    issue_with_expiry(conn, kind, user_id, now + kind.ttl()).await
}

/// Stores a token with an explicit expiry. Older tokens for the same user stay valid.
pub async fn issue_with_expiry<C: ConnectionTrait>(
    conn: &C,
    kind: TokenKind,
    user_id: Uuid,
    expires_at: DateTime<FixedOffset>,
) -> AppResult<String> {
    let token = generate_token();
    let now = Utc::now().fixed_offset();

    match kind {
        TokenKind::EmailVerification => {
            email_verification_tokens::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                token: Set(token.clone()),
                expires_at: Set(expires_at),
                verified: Set(false),
                created_at: Set(now),
            }
            .insert(conn)
            .await?;
        }
        TokenKind::PasswordReset => {
            password_reset_tokens::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                token: Set(token.clone()),
                expires_at: Set(expires_at),
                used: Set(false),
                created_at: Set(now),
            }
            .insert(conn)
            .await?;
        }
    }

    Ok(token)
}

/// Redeems `token` and returns the owning user id.
pub async fn consume<C: ConnectionTrait>(conn: &C, kind: TokenKind, token: &str) -> AppResult<Uuid> {
    let now = Utc::now().fixed_offset();

    let (id, user_id, consumed, expires_at) = match kind {
        TokenKind::EmailVerification => EmailVerificationTokens::find()
            .filter(email_verification_tokens::Column::Token.eq(token))
            .one(conn)
            .await?
            .map(|t| (t.id, t.user_id, t.verified, t.expires_at)),
        TokenKind::PasswordReset => PasswordResetTokens::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(conn)
            .await?
            .map(|t| (t.id, t.user_id, t.used, t.expires_at)),
    }
    .ok_or_else(|| AppError::BadRequest(kind.invalid_message().into()))?;

    if consumed {
        return Err(AppError::BadRequest(kind.invalid_message().into()));
    }
    if now > expires_at {
        return Err(AppError::BadRequest(kind.expired_message().into()));
    }

    let result = match kind {
        TokenKind::EmailVerification => {
            EmailVerificationTokens::update_many()
                .col_expr(email_verification_tokens::Column::Verified, Expr::value(true))
                .filter(email_verification_tokens::Column::Id.eq(id))
                .filter(email_verification_tokens::Column::Verified.eq(false))
                .exec(conn)
                .await?
        }
        TokenKind::PasswordReset => {
            PasswordResetTokens::update_many()
                .col_expr(password_reset_tokens::Column::Used, Expr::value(true))
                .filter(password_reset_tokens::Column::Id.eq(id))
                .filter(password_reset_tokens::Column::Used.eq(false))
                .exec(conn)
                .await?
        }
    };

    // Another request redeemed it between the read and the update.
    if result.rows_affected == 0 {
        return Err(AppError::BadRequest(kind.invalid_message().into()));
    }

    Ok(user_id)
}
