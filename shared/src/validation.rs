//! Input validation functions
//!
//! Field checks return a human-readable message on failure. Request types
//! implement [`RequestValidation`], which runs every field check and reports
//! all failures together as `field: message, field: message`.

use crate::types::{LoginRequest, RegisterRequest};
use validator::ValidateEmail;

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !email.validate_email() {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if name.len() > 100 {
        return Err("Name too long".to_string());
    }
    Ok(())
}

/// Validate a phone number (exactly 10 digits)
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.trim().is_empty() {
        return Err("Phone number is required".to_string());
    }
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number must be 10 digits".to_string());
    }
    Ok(())
}

/// Validation over a whole request payload
pub trait RequestValidation {
    fn validate(&self) -> Result<(), String>;
}

fn collect(checks: &[(&str, Result<(), String>)]) -> Result<(), String> {
    let errors: Vec<String> = checks
        .iter()
        .filter_map(|(field, result)| {
            result
                .as_ref()
                .err()
                .map(|msg| format!("{}: {}", field, msg))
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join(", "))
    }
}

impl RequestValidation for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        collect(&[
            ("name", validate_name(&self.name)),
            ("email", validate_email(&self.email)),
            ("password", validate_password(&self.password)),
            ("phone", validate_phone(&self.phone)),
        ])
    }
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        let password = if self.password.is_empty() {
            Err("Password is required".to_string())
        } else {
            Ok(())
        };
        collect(&[("email", validate_email(&self.email)), ("password", password)])
    }
}
