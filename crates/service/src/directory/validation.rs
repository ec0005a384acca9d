//! Input rules shared by `create` and `edit`.
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::DirectoryError;

pub const MAX_NAME_CHARS: usize = 60;
pub const MAX_EMAIL_CHARS: usize = 120;
pub const MIN_PASSWORD_CHARS: usize = 8;
const MAX_LOCAL_PART_CHARS: usize = 64;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("email pattern compiles")
});

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Well-formed address check: dot-atom local part, dotted hostname with an
/// alphabetic top-level label.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, _)) = email.split_once('@') else { return false };
    local.chars().count() <= MAX_LOCAL_PART_CHARS && EMAIL_RE.is_match(email)
}

pub fn require_name_and_email(name: &str, email: &str) -> Result<(), DirectoryError> {
    if name.is_empty() || email.is_empty() {
        return Err(DirectoryError::validation("the \"nombre\" and \"email\" fields are required"));
    }
    Ok(())
}

pub fn check_email_format(email: &str) -> Result<(), DirectoryError> {
    if !is_valid_email(email) {
        return Err(DirectoryError::validation("the \"email\" field is not a valid address"));
    }
    Ok(())
}

pub fn check_lengths(name: &str, email: &str) -> Result<(), DirectoryError> {
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(DirectoryError::validation(format!(
            "the \"nombre\" field exceeds {MAX_NAME_CHARS} characters"
        )));
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(DirectoryError::validation(format!(
            "the \"email\" field exceeds {MAX_EMAIL_CHARS} characters"
        )));
    }
    Ok(())
}

/// Name/email rules applied by `edit`: presence, format, then length.
pub fn validate_profile(name: &str, email: &str) -> Result<(), DirectoryError> {
    require_name_and_email(name, email)?;
    check_email_format(email)?;
    check_lengths(name, email)
}

/// Full `create` rule set, in the order failures are reported.
pub fn validate_new_user(name: &str, email: &str, password: &str, role: &str) -> Result<(), DirectoryError> {
    require_name_and_email(name, email)?;
    check_email_format(email)?;
    if password.is_empty() {
        return Err(DirectoryError::validation("the \"password\" field is required"));
    }
    if role.is_empty() {
        return Err(DirectoryError::validation("the \"rol\" field is required"));
    }
    check_lengths(name, email)
}

pub fn check_new_password(password: &str) -> Result<(), DirectoryError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DirectoryError::validation(format!(
            "the password must be at least {MIN_PASSWORD_CHARS} characters long"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for ok in ["ana@x.com", "Ana@X.com", "first.last+tag@mail.example.org", "o'brien@ex-ample.io"] {
            assert!(is_valid_email(ok), "{ok} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "ana", "ana@", "@x.com", "ana@x", "ana@@x.com", "a..b@x.com", ".a@x.com", "ana@-x.com", "ana @x.com"] {
            assert!(!is_valid_email(bad), "{bad} should be invalid");
        }
        let long_local = format!("{}@x.com", "a".repeat(65));
        assert!(!is_valid_email(&long_local));
    }

    #[test]
    fn name_length_boundary() {
        let sixty = "n".repeat(60);
        let sixty_one = "n".repeat(61);
        assert!(check_lengths(&sixty, "a@x.com").is_ok());
        assert_eq!(check_lengths(&sixty_one, "a@x.com").unwrap_err().status(), 422);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let accented = "ñ".repeat(60);
        assert!(check_lengths(&accented, "a@x.com").is_ok());
    }

    #[test]
    fn new_user_requires_every_field() {
        assert!(validate_new_user("Ana", "ana@x.com", "secret12", "usuario").is_ok());
        assert!(validate_new_user("", "ana@x.com", "secret12", "usuario").is_err());
        assert!(validate_new_user("Ana", "not-an-email", "secret12", "usuario").is_err());
        assert!(validate_new_user("Ana", "ana@x.com", "", "usuario").is_err());
        assert!(validate_new_user("Ana", "ana@x.com", "secret12", "").is_err());
    }

    #[test]
    fn short_password_rejected() {
        assert!(check_new_password("1234567").is_err());
        assert!(check_new_password("12345678").is_ok());
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Ana@X.COM "), "ana@x.com");
    }
}
