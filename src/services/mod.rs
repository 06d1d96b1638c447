pub mod appointment_service;
pub mod auth_service;
pub mod catalog_service;
pub mod password;
pub mod session;
pub mod slot_checker;
pub mod token_service;
pub mod user_service;
