//! Local, synchronous form validation.
//!
//! Runs before any request is sent and is re-run on every submit attempt.
//! Each field reports at most one message: the first rule it breaks.

#[cfg(test)]
#[path = "validation_test.rs"]
mod validation_test;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::net::types::RegisterRequest;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email regex"));
static UPPERCASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]").expect("uppercase regex"));
static DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]").expect("digit regex"));
static SPECIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]"#).expect("special regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
    CurrentPassword,
    NewPassword,
    Url,
}

impl Field {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
            Self::CurrentPassword => "current_password",
            Self::NewPassword => "new_password",
            Self::Url => "url",
        }
    }
}

/// Field-level validation messages, ordered by field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {message}", field.as_str())?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Password length as browsers count it: UTF-16 code units, so an emoji counts twice.
fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// First password rule `password` breaks, in the order the form reports them.
#[must_use]
pub fn password_error(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("Password is required")
    } else if utf16_len(password) < MIN_PASSWORD_LEN {
        Some("Password must be at least 8 characters")
    } else if !UPPERCASE_RE.is_match(password) {
        Some("Password must contain at least one uppercase letter")
    } else if !DIGIT_RE.is_match(password) {
        Some("Password must contain at least one number")
    } else if !SPECIAL_RE.is_match(password) {
        Some("Password must contain at least one special character")
    } else {
        None
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl RegistrationForm {
    /// # Errors
    ///
    /// Returns every failing field with its first broken rule.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.username.trim().is_empty() {
            errors.insert(Field::Username, "Username name is required");
        }

        if self.email.trim().is_empty() {
            errors.insert(Field::Email, "Email is required");
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.insert(Field::Email, "Email format is invalid");
        }

        if let Some(message) = password_error(&self.password) {
            errors.insert(Field::Password, message);
        }

        if self.password != self.confirm_password {
            errors.insert(Field::ConfirmPassword, "Passwords do not match");
        }

        errors.into_result()
    }

    #[must_use]
    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordChangeForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChangeForm").finish_non_exhaustive()
    }
}

impl PasswordChangeForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.current_password.is_empty() {
            errors.insert(Field::CurrentPassword, "Current password is required");
        }
        if self.new_password != self.confirm_password {
            errors.insert(Field::ConfirmPassword, "New passwords don't match");
        }
        if utf16_len(&self.new_password) < MIN_PASSWORD_LEN {
            errors.insert(Field::NewPassword, "Password must be at least 8 characters");
        }

        errors.into_result()
    }
}

/// Trimmed target URL for the create/edit forms.
///
/// # Errors
///
/// Returns a [`Field::Url`] error when the input is blank.
pub fn validate_url_input(raw: &str) -> Result<&str, FieldErrors> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        let mut errors = FieldErrors::default();
        errors.insert(Field::Url, "URL is required");
        return Err(errors);
    }
    Ok(trimmed)
}
