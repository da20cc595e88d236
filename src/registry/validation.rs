//! Field checks shared by the user and item registries

use std::sync::LazyLock;

use regex::Regex;

use super::error::FieldError;

pub type Checked<T> = Result<T, FieldError>;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

// Russian mobile numbers: optional +7, 7 or 8 prefix, then 9 and nine digits
static MOBILE_RU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?7|8)?9\d{9}$").expect("phone pattern is valid"));

/// Treat missing and blank inputs alike
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn is_alpha(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL.is_match(value)
}

pub fn is_mobile_phone(value: &str) -> bool {
    MOBILE_RU.is_match(value)
}

/// Parse a finite decimal number ("19.99", "-3", ".5", "1e3")
pub fn parse_float(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse a positive public id
pub fn parse_id(value: &str) -> Option<u64> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

pub fn check_id(field: &str, raw: &str) -> Checked<u64> {
    if raw.trim().is_empty() {
        return Err(FieldError::new(field, format!("{field} is required")));
    }
    parse_id(raw.trim()).ok_or_else(|| FieldError::new(field, format!("{field} must be an integer")))
}

pub fn check_name(raw: &str) -> Checked<String> {
    if raw.is_empty() {
        return Err(FieldError::new("name", "Name is required"));
    }
    if !is_alpha(raw) {
        return Err(FieldError::new("name", "Name must contain only letters"));
    }
    Ok(raw.to_string())
}

pub fn check_email(raw: &str) -> Checked<String> {
    if raw.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    if !is_email(raw) {
        return Err(FieldError::new("email", "Email is not valid"));
    }
    Ok(raw.to_string())
}

pub fn check_phone(raw: &str) -> Checked<String> {
    if raw.is_empty() {
        return Err(FieldError::new("phone", "Phone is required"));
    }
    if !is_mobile_phone(raw) {
        return Err(FieldError::new("phone", "Phone is not a valid mobile number"));
    }
    Ok(raw.to_string())
}

pub fn check_password(field: &str, raw: &str) -> Checked<String> {
    if raw.is_empty() {
        return Err(FieldError::new(field, "Password is required"));
    }
    Ok(raw.to_string())
}

pub fn check_title(raw: &str) -> Checked<String> {
    if raw.is_empty() {
        return Err(FieldError::new("title", "Title is required"));
    }
    if !is_alphanumeric(raw) {
        return Err(FieldError::new(
            "title",
            "Title must contain only letters and digits",
        ));
    }
    Ok(raw.to_string())
}

pub fn check_price(raw: &str) -> Checked<f64> {
    if raw.trim().is_empty() {
        return Err(FieldError::new("price", "Price is required"));
    }
    parse_float(raw.trim()).ok_or_else(|| FieldError::new("price", "Price must be a number"))
}
