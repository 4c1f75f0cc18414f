use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, AppResult};

pub const USERNAME_MIN: usize = 3;
pub const PSEUDO_MIN: usize = 3;
pub const PSEUDO_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 8;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").unwrap();
}

fn invalid(msg: &str) -> AppError {
    AppError::Validation(msg.to_string())
}

pub fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(invalid("Username is required"));
    }
    if username.chars().count() < USERNAME_MIN {
        return Err(invalid("Username must be at least 3 characters"));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(invalid(
            "Username must only contain letters, numbers, _ and -",
        ));
    }
    Ok(())
}

pub fn validate_pseudo(pseudo: &str) -> AppResult<()> {
    let len = pseudo.chars().count();
    if len < PSEUDO_MIN {
        return Err(invalid("Pseudo must be at least 3 characters"));
    }
    if len > PSEUDO_MAX {
        return Err(invalid("Pseudo must be at most 20 characters"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() {
        return Err(invalid("Email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(invalid("Invalid email"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(invalid("Password must be at least 8 characters"));
    }
    Ok(())
}

/// Trims and lowercases an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Blank pseudo means "no pseudo".
pub fn normalize_pseudo(pseudo: Option<String>) -> Option<String> {
    pseudo
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}
