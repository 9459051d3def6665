//! Input checks and email normalization.

use super::AuthError;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum display-name length, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Registration input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
}

/// Trim and lowercase an email. The result is the uniqueness key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose syntactic check: `local@domain.tld`, no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    email
        .char_indices()
        .filter(|&(_, c)| c == '@')
        .any(|(at, _)| {
            let domain = &email[at + 1..];
            at > 0
                && domain
                    .char_indices()
                    .any(|(dot, c)| c == '.' && dot > 0 && dot + 1 < domain.len())
        })
}

/// Check registration input and return the trimmed name and normalized email.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<Registration, AuthError> {
    let name = name.trim();
    let email = normalize_email(email);
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthError::ValidationError("Missing fields".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::ValidationError(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if !is_valid_email(&email) {
        return Err(AuthError::ValidationError("Invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(Registration {
        name: name.to_string(),
        email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Asha@Test.COM "), "asha@test.com");
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("asha@test.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("asha"));
        assert!(!is_valid_email("asha@test"));
        assert!(!is_valid_email("@test.com"));
        assert!(!is_valid_email("asha@.com"));
        assert!(!is_valid_email("asha@test."));
        assert!(!is_valid_email("as ha@test.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn registration_normalizes() {
        let reg = validate_registration(" Asha ", " Asha@Test.com ", "secret1").unwrap();
        assert_eq!(
            reg,
            Registration {
                name: "Asha".into(),
                email: "asha@test.com".into()
            }
        );
    }

    #[test]
    fn registration_rejects_missing_fields() {
        for (name, email, password) in [
            ("", "a@b.co", "secret1"),
            ("   ", "a@b.co", "secret1"),
            ("Asha", "", "secret1"),
            ("Asha", "a@b.co", ""),
        ] {
            let err = validate_registration(name, email, password).unwrap_err();
            assert!(matches!(err, AuthError::ValidationError(m) if m == "Missing fields"));
        }
    }

    #[test]
    fn registration_rejects_short_password() {
        let err = validate_registration("Asha", "a@b.co", "12345").unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(m) if m.contains("at least 6")));
        assert!(validate_registration("Asha", "a@b.co", "123456").is_ok());
    }

    #[test]
    fn registration_rejects_bad_email() {
        let err = validate_registration("Asha", "not-an-email", "secret1").unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(m) if m == "Invalid email"));
    }

    #[test]
    fn registration_rejects_long_name() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_registration(&name, "a@b.co", "secret1").is_err());
    }
}
