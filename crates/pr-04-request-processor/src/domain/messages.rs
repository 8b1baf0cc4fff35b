//! # Reply Texts
//!
//! Operators and clients match on these strings; keep them stable.

/// Failure text when a request carries a reply address but no username.
pub const MISSING_USERNAME_MESSAGE: &str = "request is missing a username";

/// Failure text for a request whose identity already holds a valid certificate.
pub fn duplicate_certificate_message(username: &str) -> String {
    format!("a valid certificate for {} already exists", username)
}

/// Failure text for a revocation with nothing to revoke.
pub fn missing_certificate_message(username: &str) -> String {
    format!("no valid certificate for {} exists", username)
}

/// Success body of a revocation.
pub fn revoked_confirmation(username: &str) -> String {
    format!("certificate for {} revoked", username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_text() {
        assert_eq!(
            duplicate_certificate_message("alice"),
            "a valid certificate for alice already exists"
        );
    }

    #[test]
    fn test_revoke_texts() {
        assert_eq!(missing_certificate_message("bob"), "no valid certificate for bob exists");
        assert_eq!(revoked_confirmation("bob"), "certificate for bob revoked");
    }
}
