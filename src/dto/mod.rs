pub mod appointments;
pub mod auth;
pub mod rules;
pub mod services;
pub mod users;
