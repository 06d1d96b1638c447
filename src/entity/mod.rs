pub mod appointments;
pub mod audit_logs;
pub mod email_verification_tokens;
pub mod password_reset_tokens;
pub mod sea_orm_active_enums;
pub mod services;
pub mod users;

pub use appointments::Entity as Appointments;
pub use audit_logs::Entity as AuditLogs;
pub use email_verification_tokens::Entity as EmailVerificationTokens;
pub use password_reset_tokens::Entity as PasswordResetTokens;
pub use services::Entity as Services;
pub use users::Entity as Users;
