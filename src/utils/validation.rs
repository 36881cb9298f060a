//! Validation Utilities
//!
//! Input validation functions for user data and flow requests.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Normalizes email address to lowercase and removes surrounding whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a name contains only allowed characters and length
pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.len() > 255 {
        return false;
    }

    // Letters, spaces, hyphens, and apostrophes
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z\s\-']+$").expect("Failed to compile name regex"));

    regex.is_match(trimmed)
}

/// Validates phone number format: digits with an optional leading `+`,
/// separators allowed, 3 to 20 characters
pub fn validate_phone(phone: &str) -> bool {
    let trimmed = phone.trim();

    if trimmed.len() < 3 || trimmed.len() > 20 {
        return false;
    }

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9\s\-]*$").expect("Failed to compile phone regex")
    });

    regex.is_match(trimmed)
}

/// Validates a 6-digit OTP code
pub fn validate_otp_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

/// Custom validator for name fields using the validator crate
pub fn name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_name"))
    }
}

/// Custom validator for phone fields using the validator crate
pub fn phone_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Custom validator for OTP code fields using the validator crate
pub fn otp_code_validator(code: &str) -> Result<(), ValidationError> {
    if validate_otp_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_otp_code"))
    }
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Please enter a valid email address";
    pub const INVALID_NAME: &str =
        "Name must contain only letters, spaces, hyphens, and apostrophes";
    pub const INVALID_PHONE: &str = "Please enter a valid phone number";
    pub const INVALID_OTP_CODE: &str = "OTP code must be exactly 6 digits";
    pub const FIELD_REQUIRED: &str = "This field is required";
}
