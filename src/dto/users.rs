use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::rules::validate_dni;
use crate::models::User;

/// Admin-created patient account. No password: the patient signs in later
/// through Google or a password reset.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 3, max = 255, message = "Full name must be 3 to 255 characters"))]
    pub full_name: String,
    #[validate(length(min = 8, message = "Phone must have at least 8 characters"))]
    pub phone: Option<String>,
    #[validate(custom(function = "validate_dni"))]
    pub dni: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 255, message = "Full name must be 3 to 255 characters"))]
    pub full_name: Option<String>,
    #[validate(length(min = 8, message = "Phone must have at least 8 characters"))]
    pub phone: Option<String>,
    #[validate(custom(function = "validate_dni"))]
    pub dni: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserStats {
    pub total: i64,
    pub patients: i64,
    pub admins: i64,
    pub verified: i64,
    pub google_users: i64,
}
