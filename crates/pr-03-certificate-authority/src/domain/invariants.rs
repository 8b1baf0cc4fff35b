//! # Domain Invariants
//!
//! A username becomes both the certificate common name and a file name in
//! the PKI directory.

use crate::domain::AuthorityError;

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 64;

/// Invariant: usernames are non-empty, at most [`MAX_USERNAME_LEN`]
/// characters of `[A-Za-z0-9._@-]`, and never `.` or `..`.
pub fn validate_username(username: &str) -> Result<(), AuthorityError> {
    let reject = |reason: &str| {
        Err(AuthorityError::InvalidUsername {
            username: username.to_string(),
            reason: reason.to_string(),
        })
    };

    if username.is_empty() {
        return reject("must not be empty");
    }
    if username.len() > MAX_USERNAME_LEN {
        return reject("must be at most 64 characters");
    }
    if username == "." || username == ".." {
        return reject("must not be a relative path");
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-')))
    {
        return reject(&format!("character {:?} is not allowed", c));
    }
    Ok(())
}
