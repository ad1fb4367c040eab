//! Field rules for user input, usable from `#[validate(custom(...))]` and directly.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{ValidationError, ValidationErrors};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 100;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len < NAME_MIN {
        return Err(invalid("name_length", "Name must be at least 2 characters long"));
    }
    if len > NAME_MAX {
        return Err(invalid("name_length", "Name cannot exceed 50 characters"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(invalid("email", "Please provide a valid email address"))
    }
}

/// 8–100 characters with at least one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        return Err(invalid("password_length", "Password must be at least 8 characters long"));
    }
    if len > PASSWORD_MAX {
        return Err(invalid("password_length", "Password cannot exceed 100 characters"));
    }
    if !password.chars().any(|c| c.is_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid(
            "password_strength",
            "Password must contain at least one letter and one number",
        ));
    }
    Ok(())
}

/// Human-readable message of the first failing field, ordered by field name.
pub fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    let mut names: Vec<_> = fields.keys().collect();
    names.sort();

    names
        .first()
        .and_then(|name| {
            fields.get(*name).and_then(|errs| errs.first()).map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", name))
            })
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}

/// Map a single rule failure to the domain error.
pub fn check(result: Result<(), ValidationError>) -> crate::error::UserResult<()> {
    result.map_err(|e| {
        crate::error::UserError::Validation(
            e.message
                .map(|m| m.into_owned())
                .unwrap_or_else(|| e.code.into_owned()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_bounds() {
        assert!(validate_name("Al").is_ok());
        assert!(validate_name(" A ").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("john@example.com").is_ok());
        assert!(validate_email("john@example").is_err());
        assert!(validate_email("john doe@example.com").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Password123!").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("1234567890").is_err());
        assert!(validate_password(&format!("a1{}", "x".repeat(99))).is_err());
    }

    #[test]
    fn test_check_carries_message() {
        let err = check(validate_password("abc")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Password must be at least 8 characters long"
        );
    }
}
