//! Form field validation.
//!
//! Every check returns the first problem found, worded the way the forms
//! display it. Lengths are counted in characters, not bytes.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Email;

/// Minimum length of a display name.
pub const NAME_MIN_LEN: usize = 20;
/// Maximum length of a display name.
pub const NAME_MAX_LEN: usize = 60;
/// Maximum length of a postal address.
pub const ADDRESS_MAX_LEN: usize = 400;
/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 8;
/// Maximum password length.
pub const PASSWORD_MAX_LEN: usize = 16;
/// Lowest star value a rating may carry.
pub const RATING_MIN: i32 = 1;
/// Highest star value a rating may carry.
pub const RATING_MAX: i32 = 5;

static UPPERCASE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Static pattern
    Regex::new("[A-Z]").unwrap()
});

static SPECIAL_CHAR: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Static pattern
    Regex::new(r#"[!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]"#).unwrap()
});

/// A rejected form field.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,
    #[error("Name must be at least 20 characters")]
    NameTooShort,
    #[error("Name must be at most 60 characters")]
    NameTooLong,
    #[error("Address is required")]
    AddressRequired,
    #[error("Address must be at most 400 characters")]
    AddressTooLong,
    #[error("Email is required")]
    EmailRequired,
    #[error("Invalid email format")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Password must be at most 16 characters")]
    PasswordTooLong,
    #[error("Password must include at least one uppercase letter")]
    PasswordMissingUppercase,
    #[error("Password must include at least one special character")]
    PasswordMissingSpecial,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
}

impl ValidationError {
    const ALL: [Self; 14] = [
        Self::NameRequired,
        Self::NameTooShort,
        Self::NameTooLong,
        Self::AddressRequired,
        Self::AddressTooLong,
        Self::EmailRequired,
        Self::EmailInvalid,
        Self::PasswordRequired,
        Self::PasswordTooShort,
        Self::PasswordTooLong,
        Self::PasswordMissingUppercase,
        Self::PasswordMissingSpecial,
        Self::PasswordMismatch,
        Self::RatingOutOfRange,
    ];

    /// Stable code carried in `?error=` query strings.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NameRequired => "name-required",
            Self::NameTooShort => "name-too-short",
            Self::NameTooLong => "name-too-long",
            Self::AddressRequired => "address-required",
            Self::AddressTooLong => "address-too-long",
            Self::EmailRequired => "email-required",
            Self::EmailInvalid => "email-invalid",
            Self::PasswordRequired => "password-required",
            Self::PasswordTooShort => "password-too-short",
            Self::PasswordTooLong => "password-too-long",
            Self::PasswordMissingUppercase => "password-missing-uppercase",
            Self::PasswordMissingSpecial => "password-missing-special",
            Self::PasswordMismatch => "password-mismatch",
            Self::RatingOutOfRange => "rating-out-of-range",
        }
    }

    /// Inverse of [`ValidationError::code`].
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }
}

/// Display name: required, 20 to 60 characters.
///
/// # Errors
///
/// Returns the first rule the value breaks.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        Err(ValidationError::NameRequired)
    } else if len < NAME_MIN_LEN {
        Err(ValidationError::NameTooShort)
    } else if len > NAME_MAX_LEN {
        Err(ValidationError::NameTooLong)
    } else {
        Ok(())
    }
}

/// Postal address: required, at most 400 characters.
///
/// # Errors
///
/// Returns the first rule the value breaks.
pub fn validate_address(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        Err(ValidationError::AddressRequired)
    } else if len > ADDRESS_MAX_LEN {
        Err(ValidationError::AddressTooLong)
    } else {
        Ok(())
    }
}

/// Email: required and shaped like `local@domain.tld`.
///
/// # Errors
///
/// Returns the first rule the value breaks.
pub fn validate_email(value: &str) -> Result<Email, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    Email::parse(value).map_err(|_| ValidationError::EmailInvalid)
}

/// Password: 8 to 16 characters with an uppercase letter and a special
/// character.
///
/// # Errors
///
/// Returns the first rule the value breaks.
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ValidationError::PasswordRequired);
    }
    if len < PASSWORD_MIN_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ValidationError::PasswordTooLong);
    }
    if !UPPERCASE.is_match(value) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    if !SPECIAL_CHAR.is_match(value) {
        return Err(ValidationError::PasswordMissingSpecial);
    }
    Ok(())
}

/// Password plus its confirmation field.
///
/// # Errors
///
/// Returns the password's first broken rule, or a mismatch.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_password(password)?;
    if password == confirm {
        Ok(())
    } else {
        Err(ValidationError::PasswordMismatch)
    }
}

/// Rating: an integer star value from 1 to 5.
///
/// # Errors
///
/// Returns [`ValidationError::RatingOutOfRange`] outside 1..=5.
pub fn validate_rating(value: i32) -> Result<(), ValidationError> {
    if (RATING_MIN..=RATING_MAX).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_bounds() {
        assert_eq!(validate_name(""), Err(ValidationError::NameRequired));
        assert_eq!(validate_name("John Doe"), Err(ValidationError::NameTooShort));
        assert_eq!(validate_name("Johnathan Quincy Adams-Doe"), Ok(()));
        assert_eq!(validate_name(&"a".repeat(20)), Ok(()));
        assert_eq!(validate_name(&"a".repeat(60)), Ok(()));
        assert_eq!(
            validate_name(&"a".repeat(61)),
            Err(ValidationError::NameTooLong)
        );
    }

    #[test]
    fn test_name_counts_characters() {
        // 20 characters, 40 bytes
        assert_eq!(validate_name(&"é".repeat(20)), Ok(()));
    }

    #[test]
    fn test_address_bounds() {
        assert_eq!(validate_address(""), Err(ValidationError::AddressRequired));
        assert_eq!(validate_address("1 Main St, Springfield"), Ok(()));
        assert_eq!(validate_address(&"x".repeat(400)), Ok(()));
        assert_eq!(
            validate_address(&"x".repeat(401)),
            Err(ValidationError::AddressTooLong)
        );
    }

    #[test]
    fn test_email() {
        assert_eq!(validate_email("").err(), Some(ValidationError::EmailRequired));
        assert_eq!(
            validate_email("not an email").err(),
            Some(ValidationError::EmailInvalid)
        );
        assert_eq!(
            validate_email("jane@example").err(),
            Some(ValidationError::EmailInvalid)
        );
        assert!(validate_email("jane@example.com").is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(validate_password("Abcdef1!"), Ok(()));
        assert_eq!(validate_password(""), Err(ValidationError::PasswordRequired));
        assert_eq!(
            validate_password("Ab1!"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_password("Abcdefghijklmno1!"),
            Err(ValidationError::PasswordTooLong)
        );
        assert_eq!(
            validate_password("abcdefgh"),
            Err(ValidationError::PasswordMissingUppercase)
        );
        assert_eq!(
            validate_password("Abcdefgh"),
            Err(ValidationError::PasswordMissingSpecial)
        );
    }

    #[test]
    fn test_password_special_characters() {
        for special in ["[", "]", "\\", "/", "'", "\"", "-", "?"] {
            let password = format!("Abcdefg{special}");
            assert_eq!(validate_password(&password), Ok(()), "{password}");
        }
    }

    #[test]
    fn test_new_password_confirmation() {
        assert_eq!(validate_new_password("Abcdef1!", "Abcdef1!"), Ok(()));
        assert_eq!(
            validate_new_password("Abcdef1!", "Abcdef1?"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_codes_round_trip() {
        for err in ValidationError::ALL {
            assert_eq!(ValidationError::from_code(err.code()), Some(err));
        }
        assert_eq!(ValidationError::from_code("nope"), None);
    }

    #[test]
    fn test_rating_range() {
        assert_eq!(validate_rating(0), Err(ValidationError::RatingOutOfRange));
        assert_eq!(validate_rating(6), Err(ValidationError::RatingOutOfRange));
        for value in 1..=5 {
            assert_eq!(validate_rating(value), Ok(()));
        }
    }
}
