//! Field rules shared by request bodies that `validator`'s built-ins cannot express.

use std::borrow::Cow;

use chrono::NaiveTime;
use validator::ValidationError;

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Lowercase, uppercase, digit and one of `@$!%*?&`.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if has_lower && has_upper && has_digit && has_symbol {
        Ok(())
    } else {
        Err(rule_error(
            "password_strength",
            "Password must contain uppercase, lowercase, digits and one of @$!%*?&",
        ))
    }
}

pub fn validate_dni(dni: &str) -> Result<(), ValidationError> {
    let digits = dni.len();
    if (7..=8).contains(&digits) && dni.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(rule_error("dni", "DNI must have 7 or 8 digits"))
    }
}

pub fn validate_slot_time(value: &str) -> Result<(), ValidationError> {
    match parse_slot_time(value) {
        Some(_) => Ok(()),
        None => Err(rule_error("slot_time", "Time must use the HH:mm format (e.g. 14:30)")),
    }
}

/// Parses `H:mm` / `HH:mm` into a slot start time. Seconds are not accepted.
pub fn parse_slot_time(value: &str) -> Option<NaiveTime> {
    let (hour, minute) = value.split_once(':')?;
    if hour.is_empty()
        || hour.len() > 2
        || minute.len() != 2
        || !hour.chars().all(|c| c.is_ascii_digit())
        || !minute.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_needs_every_character_class() {
        assert!(validate_password_strength("Password123!").is_ok());
        assert!(validate_password_strength("password123!").is_err());
        assert!(validate_password_strength("PASSWORD123!").is_err());
        assert!(validate_password_strength("Password!!!!").is_err());
        assert!(validate_password_strength("Password1234").is_err());
    }

    #[test]
    fn dni_is_seven_or_eight_digits() {
        assert!(validate_dni("3512345").is_ok());
        assert!(validate_dni("35123456").is_ok());
        assert!(validate_dni("351234").is_err());
        assert!(validate_dni("351234567").is_err());
        assert!(validate_dni("35A23456").is_err());
    }

    #[test]
    fn slot_time_parsing() {
        assert_eq!(parse_slot_time("14:30"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_slot_time("9:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_slot_time("24:00"), None);
        assert_eq!(parse_slot_time("12:60"), None);
        assert_eq!(parse_slot_time("12:3"), None);
        assert_eq!(parse_slot_time("12:30:00"), None);
        assert_eq!(parse_slot_time("noon"), None);
    }
}
