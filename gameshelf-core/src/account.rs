//! Registration input rules.

use crate::types::ProfileUpdate;
use crate::validate::ValidationError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;
pub const MAX_EMAIL_LEN: usize = 128;
pub const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt only looks at the first 72 bytes.
pub const MAX_PASSWORD_LEN: usize = 72;
pub const MAX_BIO_CHARS: usize = 500;
pub const MAX_AVATAR_LEN: usize = 512;
pub const MAX_PREFERENCES: usize = 50;

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    check_username(username, &mut err);
    err.into_result()
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    check_email(email, &mut err);
    err.into_result()
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    check_password(password, &mut err);
    err.into_result()
}

/// Validate all registration fields at once.
pub fn validate_registration(
    email: &str,
    username: &str,
    password: &str,
) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    check_email(email, &mut err);
    check_username(username, &mut err);
    check_password(password, &mut err);
    err.into_result()
}

/// Bounds on the free-form profile fields.
pub fn validate_profile_update(update: &ProfileUpdate) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    if let Some(Some(bio)) = &update.bio {
        if bio.chars().count() > MAX_BIO_CHARS {
            err.push("bio", format!("must be at most {MAX_BIO_CHARS} characters"));
        }
    }
    if let Some(Some(avatar)) = &update.avatar {
        if avatar.len() > MAX_AVATAR_LEN {
            err.push("avatar", format!("must be at most {MAX_AVATAR_LEN} characters"));
        }
    }
    if let Some(preferences) = &update.preferences {
        if preferences.len() > MAX_PREFERENCES {
            err.push(
                "preferences",
                format!("may hold at most {MAX_PREFERENCES} entries"),
            );
        }
    }
    err.into_result()
}

fn check_username(username: &str, err: &mut ValidationError) {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        err.push(
            "username",
            format!("must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters"),
        );
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        err.push(
            "username",
            "may only contain letters, numbers, underscores, and hyphens",
        );
    }
}

fn check_email(email: &str, err: &mut ValidationError) {
    if email.len() > MAX_EMAIL_LEN {
        err.push("email", format!("must be at most {MAX_EMAIL_LEN} characters"));
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if !valid {
        err.push("email", "invalid email format");
    }
}

fn check_password(password: &str, err: &mut ValidationError) {
    if password.len() < MIN_PASSWORD_LEN {
        err.push(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    } else if password.len() > MAX_PASSWORD_LEN {
        err.push(
            "password",
            format!("must be at most {MAX_PASSWORD_LEN} bytes"),
        );
    }
}
