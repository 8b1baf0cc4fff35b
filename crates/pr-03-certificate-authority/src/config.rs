//! # Authority Configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Certificate authority configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Directory holding the CA material and the index.
    pub pki_dir: PathBuf,

    /// Common name of a newly created CA.
    pub ca_common_name: String,

    /// Organization written into issued subjects.
    pub organization: Option<String>,

    /// Lifetime of a newly created CA certificate.
    pub ca_validity_days: i64,

    /// Lifetime of issued client certificates.
    pub client_validity_days: i64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            pki_dir: PathBuf::from("/opt/openvpn-admin/pki"),
            ca_common_name: "OpenVPN Relay CA".to_string(),
            organization: None,
            ca_validity_days: 3650,
            client_validity_days: 3650,
        }
    }
}

impl AuthorityConfig {
    /// Config rooted at `pki_dir` with default lifetimes.
    pub fn with_pki_dir(pki_dir: impl Into<PathBuf>) -> Self {
        Self {
            pki_dir: pki_dir.into(),
            ..Self::default()
        }
    }

    /// Create a config for testing (short lifetimes).
    pub fn for_testing(pki_dir: impl Into<PathBuf>) -> Self {
        Self {
            pki_dir: pki_dir.into(),
            ca_common_name: "Test Relay CA".to_string(),
            organization: Some("Relay Tests".to_string()),
            ca_validity_days: 30,
            client_validity_days: 7,
        }
    }

    /// `ca.crt`
    pub fn ca_cert_path(&self) -> PathBuf {
        self.pki_dir.join("ca.crt")
    }

    /// `ca.key`
    pub fn ca_key_path(&self) -> PathBuf {
        self.pki_dir.join("ca.key")
    }

    /// `index.txt`
    pub fn index_path(&self) -> PathBuf {
        self.pki_dir.join("index.txt")
    }

    /// `issued/`
    pub fn issued_dir(&self) -> PathBuf {
        self.pki_dir.join("issued")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_under_pki_dir() {
        let config = AuthorityConfig::with_pki_dir("/tmp/pki");
        assert_eq!(config.ca_cert_path(), PathBuf::from("/tmp/pki/ca.crt"));
        assert_eq!(config.index_path(), PathBuf::from("/tmp/pki/index.txt"));
        assert_eq!(config.issued_dir(), PathBuf::from("/tmp/pki/issued"));
    }
}
