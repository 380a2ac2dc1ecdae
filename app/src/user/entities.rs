use crate::{auth::PasswordHash, money::Rupiah};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

/// Rejections for request data that never reaches storage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("all fields are required")]
    MissingField,
    #[error("email is not a valid address")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("profile image must be a jpeg or png url")]
    UnsupportedImageFormat,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(pub Uuid);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(pub String);

impl Email {
    /// Accepts `local@domain.tld` shapes only: exactly one `@`, no
    /// whitespace, and a dot-separated domain.
    pub(crate) fn parse(s: &str) -> Result<Self, ValidationError> {
        let (local, domain) = s.split_once('@').ok_or(ValidationError::InvalidEmail)?;
        let valid = !local.is_empty()
            && !domain.is_empty()
            && !s.contains(char::is_whitespace)
            && !domain.contains('@')
            && domain
                .rsplit_once('.')
                .map(|(name, tld)| !name.is_empty() && !tld.is_empty())
                .unwrap_or(false);
        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(ValidationError::InvalidEmail)
        }
    }
}

#[derive(Debug)]
pub struct User {
    pub id: Id,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub balance: Rupiah,
    pub profile_image: Option<String>,
    pub created: DateTime<Utc>,
}

/// A validated registration, ready to persist. The account starts with a
/// zero balance.
#[derive(Debug)]
pub struct NewUser {
    pub(crate) id: Id,
    pub(crate) email: Email,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) password_hash: PasswordHash,
    pub(crate) created: DateTime<Utc>,
}

impl NewUser {
    pub fn create(
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
    ) -> Result<Self, ValidationError> {
        if email.trim().is_empty()
            || first_name.trim().is_empty()
            || last_name.trim().is_empty()
            || password.is_empty()
        {
            return Err(ValidationError::MissingField);
        }
        let email = Email::parse(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(Self {
            id: Id(Uuid::new_v4()),
            email,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            password_hash: PasswordHash::generate(password),
            created: Utc::now(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email.0
    }
}

/// A validated profile rename.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
}

impl ProfileUpdate {
    pub fn create(first_name: &str, last_name: &str) -> Result<Self, ValidationError> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(ValidationError::MissingField);
        }
        Ok(Self {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
        })
    }
}

/// A profile image location. The upload pipeline lives elsewhere; this side
/// only stores the resulting URL, after checking the extension.
#[derive(Debug)]
pub struct ImageUrl(pub(crate) String);

impl ImageUrl {
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        if url.trim().is_empty() {
            return Err(ValidationError::MissingField);
        }
        let lower = url.to_ascii_lowercase();
        let supported = [".jpg", ".jpeg", ".png"]
            .iter()
            .any(|ext| lower.ends_with(ext));
        if supported {
            Ok(Self(url.to_owned()))
        } else {
            Err(ValidationError::UnsupportedImageFormat)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_plain_address() {
        assert!(Email::parse("user@example.com").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for candidate in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@example",
            "user@@example.com",
            "us er@example.com",
            "user@example.",
            "user@.com",
        ] {
            assert_eq!(
                Email::parse(candidate),
                Err(ValidationError::InvalidEmail),
                "{:?} should be rejected",
                candidate
            );
        }
    }

    #[test]
    fn registration_requires_every_field() {
        let result = NewUser::create("user@example.com", "", "Doe", "long enough");
        assert_eq!(result.unwrap_err(), ValidationError::MissingField);
    }

    #[test]
    fn registration_rejects_short_passwords() {
        let result = NewUser::create("user@example.com", "Jane", "Doe", "short");
        assert_eq!(result.unwrap_err(), ValidationError::PasswordTooShort);
    }

    #[test]
    fn registration_hashes_the_password() {
        let user = NewUser::create("user@example.com", "Jane", "Doe", "long enough").unwrap();
        assert!(user.password_hash.verify("long enough"));
    }

    #[test]
    fn profile_update_rejects_blank_names() {
        assert_eq!(
            ProfileUpdate::create("  ", "Doe").unwrap_err(),
            ValidationError::MissingField
        );
    }

    #[test]
    fn image_url_accepts_jpeg_and_png_only() {
        assert!(ImageUrl::parse("https://cdn.example.com/me.PNG").is_ok());
        assert!(ImageUrl::parse("https://cdn.example.com/me.jpeg").is_ok());
        assert_eq!(
            ImageUrl::parse("https://cdn.example.com/me.gif").unwrap_err(),
            ValidationError::UnsupportedImageFormat
        );
    }
}
