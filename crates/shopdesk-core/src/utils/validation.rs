//! Input validation utilities
//!
//! Checks for URLs, e-mail addresses and OTP codes entered on the command line
//! or submitted through auth operations.

use crate::error::CliError;

/// Validate that a URL is properly formatted
pub fn validate_url(url: &str) -> crate::Result<()> {
    if url.is_empty() {
        return Err(CliError::InvalidArguments("URL cannot be empty".to_string()).into());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CliError::InvalidArguments(format!(
            "Invalid URL '{}': URL must start with http:// or https://",
            url
        ))
        .into());
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> crate::Result<()> {
    if email.is_empty() {
        return Err(CliError::InvalidArguments("Email cannot be empty".to_string()).into());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(CliError::InvalidArguments(format!(
            "Invalid email '{}': Email must have username and domain parts",
            email
        ))
        .into());
    }

    if !parts[1].contains('.') || parts[1].starts_with('.') || parts[1].ends_with('.') {
        return Err(CliError::InvalidArguments(format!(
            "Invalid email '{}': Domain must contain dot",
            email
        ))
        .into());
    }

    if email.chars().any(char::is_whitespace) {
        return Err(CliError::InvalidArguments(format!(
            "Invalid email '{}': Email cannot contain spaces",
            email
        ))
        .into());
    }

    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    validate_email(email).is_ok()
}

/// OTP codes are exactly six ASCII digits
pub fn validate_otp(otp: &str) -> crate::Result<()> {
    if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(
            CliError::InvalidArguments("OTP must be a 6-digit code".to_string()).into(),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_valid_urls() {
        assert!(validate_url("http://localhost:5000/api").is_ok());
        assert!(validate_url("https://shop.example.com/api").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_invalid_urls() {
        assert!(validate_url("").is_err());
        assert!(validate_url("localhost:5000").is_err());
        assert!(validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_email_accepts_valid_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("test.email@domain.org").is_ok());
        assert!(is_valid_email("admin@shop.local"));
    }

    #[test]
    fn test_validate_email_rejects_invalid_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@domain.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("user@domain@com").is_err());
        assert!(validate_email("user name@domain.com").is_err());
        assert!(!is_valid_email("user@.com"));
    }

    #[test]
    fn test_validate_otp() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("1234567").is_err());
        assert!(validate_otp("12a456").is_err());
    }
}
