use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::rules::{validate_dni, validate_password_strength};
use crate::models::PublicUser;

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(
        length(min = 8, max = 50, message = "Password must be 8 to 50 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
    #[validate(length(min = 3, max = 255, message = "Full name must be 3 to 255 characters"))]
    pub full_name: String,
    pub phone: Option<String>,
    #[validate(custom(function = "validate_dni"))]
    pub dni: Option<String>,
    #[serde(default)]
    pub recaptcha_token: String,
}

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    pub recaptcha_token: String,
}

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct GoogleAuthRequest {
    /// Google ID token obtained by the frontend.
    #[validate(length(min = 1, message = "Google token is required"))]
    pub google_token: String,
    #[serde(default)]
    pub recaptcha_token: String,
}

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[serde(default)]
    pub recaptcha_token: String,
}

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(
        length(min = 8, max = 50, message = "Password must be 8 to 50 characters"),
        custom(function = "validate_password_strength")
    )]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: PublicUser,
}

/// Session credential payload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}
