//! # Certificate Authority Service
//!
//! Issues and revokes client certificates against a PKI directory.
//!
//! All index mutations are applied to a copy, persisted, and only then
//! committed in memory, so a failed write leaves both views unchanged.

use crate::config::AuthorityConfig;
use crate::domain::{validate_username, AuthorityError, CertificateIndex, IndexEntry};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, SerialNumber,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// A freshly issued client certificate.
#[derive(Clone)]
pub struct IssuedCertificate {
    /// Common name the certificate was issued for
    pub username: String,
    /// Serial number, upper-case hex
    pub serial: String,
    /// `notAfter`
    pub expires_at: DateTime<Utc>,
    /// Certificate in PEM form
    pub certificate_pem: String,
    /// Private key in PKCS#8 PEM form
    pub private_key_pem: String,
}

impl IssuedCertificate {
    /// Certificate followed by its private key.
    pub fn bundle_pem(&self) -> String {
        let mut bundle = self.certificate_pem.clone();
        if !bundle.ends_with('\n') {
            bundle.push('\n');
        }
        bundle.push_str(&self.private_key_pem);
        bundle
    }
}

impl std::fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCertificate")
            .field("username", &self.username)
            .field("serial", &self.serial)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

struct CaMaterial {
    certificate: Certificate,
    key_pair: KeyPair,
}

/// File-backed certificate authority.
pub struct CertificateAuthorityService {
    config: AuthorityConfig,
    ca: CaMaterial,
    index: Mutex<CertificateIndex>,
}

impl CertificateAuthorityService {
    /// Open the PKI directory, creating the CA and an empty index if absent.
    pub fn open(config: AuthorityConfig) -> Result<Self, AuthorityError> {
        fs::create_dir_all(config.issued_dir()).map_err(|e| storage(&config.issued_dir(), e))?;

        let ca = load_or_create_ca(&config)?;

        let index_path = config.index_path();
        let index = match fs::read_to_string(&index_path) {
            Ok(contents) => CertificateIndex::parse(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CertificateIndex::new(),
            Err(e) => return Err(storage(&index_path, e)),
        };
        info!(
            pki_dir = %config.pki_dir.display(),
            entries = index.entries().len(),
            "[pr-03] Certificate authority ready"
        );

        Ok(Self {
            config,
            ca,
            index: Mutex::new(index),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// The CA certificate in PEM form.
    pub fn ca_certificate_pem(&self) -> String {
        self.ca.certificate.pem()
    }

    /// Copy of the current index.
    pub fn index_snapshot(&self) -> CertificateIndex {
        self.index.lock().clone()
    }

    /// Whether a valid, unexpired certificate for `username` is on record.
    pub fn has_valid_certificate(&self, username: &str) -> Result<bool, AuthorityError> {
        validate_username(username)?;
        Ok(self.index.lock().find_valid(username, Utc::now()).is_some())
    }

    /// Issue a client certificate for `username`.
    ///
    /// Fails with [`AuthorityError::AlreadyIssued`] if a valid one exists.
    pub fn issue(&self, username: &str) -> Result<IssuedCertificate, AuthorityError> {
        validate_username(username)?;

        let mut index = self.index.lock();
        let now = Utc::now();
        if index.find_valid(username, now).is_some() {
            return Err(AuthorityError::AlreadyIssued(username.to_string()));
        }

        let serial_bytes = new_serial();
        let serial = hex::encode_upper(serial_bytes);
        let expires_at = now + Duration::days(self.config.client_validity_days);

        let mut params = CertificateParams::default();
        params.distinguished_name = self.distinguished_name(username);
        params.is_ca = IsCa::ExplicitNoCa;
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        params.serial_number = Some(SerialNumber::from(serial_bytes.to_vec()));
        params.not_before = to_offset(now)?;
        params.not_after = to_offset(expires_at)?;
        params.use_authority_key_identifier_extension = true;

        let key_pair = KeyPair::generate()?;
        let certificate = params.signed_by(&key_pair, &self.ca.certificate, &self.ca.key_pair)?;
        let certificate_pem = certificate.pem();

        // Certificate file first: the index entry is the record of issuance.
        let cert_path = self.config.issued_dir().join(format!("{}.crt", username));
        fs::write(&cert_path, &certificate_pem).map_err(|e| storage(&cert_path, e))?;

        let mut next = index.clone();
        next.append(IndexEntry::issued(username, &serial, expires_at));
        if let Err(err) = self.persist_index(&next) {
            if let Err(cleanup) = fs::remove_file(&cert_path) {
                warn!(
                    path = %cert_path.display(),
                    error = %cleanup,
                    "[pr-03] Could not remove certificate after index write failed"
                );
            }
            return Err(err);
        }
        *index = next;

        info!(username, serial = %serial, "[pr-03] Issued client certificate");
        Ok(IssuedCertificate {
            username: username.to_string(),
            serial,
            expires_at,
            certificate_pem,
            private_key_pem: key_pair.serialize_pem(),
        })
    }

    /// Revoke every valid certificate for `username`. Returns the revoked
    /// serials.
    pub fn revoke(&self, username: &str) -> Result<Vec<String>, AuthorityError> {
        validate_username(username)?;

        let mut index = self.index.lock();
        let mut next = index.clone();
        let serials = next.revoke(username, Utc::now());
        if serials.is_empty() {
            return Err(AuthorityError::NotIssued(username.to_string()));
        }
        self.persist_index(&next)?;
        *index = next;

        info!(username, count = serials.len(), "[pr-03] Revoked client certificate");
        Ok(serials)
    }

    /// Flip expired entries to `E` and persist. Returns how many changed.
    pub fn update_expired(&self) -> Result<usize, AuthorityError> {
        let mut index = self.index.lock();
        let mut next = index.clone();
        let changed = next.mark_expired(Utc::now());
        if changed > 0 {
            self.persist_index(&next)?;
            *index = next;
        }
        Ok(changed)
    }

    fn distinguished_name(&self, common_name: &str) -> DistinguishedName {
        let mut dn = DistinguishedName::new();
        if let Some(org) = &self.config.organization {
            dn.push(DnType::OrganizationName, org.as_str());
        }
        dn.push(DnType::CommonName, common_name);
        dn
    }

    fn persist_index(&self, index: &CertificateIndex) -> Result<(), AuthorityError> {
        let path = self.config.index_path();
        let tmp = path.with_extension("txt.tmp");
        fs::write(&tmp, index.render()).map_err(|e| storage(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| storage(&path, e))?;
        debug!(entries = index.entries().len(), "[pr-03] Index persisted");
        Ok(())
    }
}

fn load_or_create_ca(config: &AuthorityConfig) -> Result<CaMaterial, AuthorityError> {
    let cert_path = config.ca_cert_path();
    let key_path = config.ca_key_path();

    if cert_path.exists() && key_path.exists() {
        let cert_pem = fs::read_to_string(&cert_path).map_err(|e| storage(&cert_path, e))?;
        let key_pem = fs::read_to_string(&key_path).map_err(|e| storage(&key_path, e))?;

        let key_pair = KeyPair::from_pem(&key_pem)?;
        let params = CertificateParams::from_ca_cert_pem(&cert_pem)?;
        // Re-signing yields an issuer with the stored subject and key.
        let certificate = params.self_signed(&key_pair)?;
        debug!(path = %cert_path.display(), "[pr-03] Loaded CA");
        return Ok(CaMaterial {
            certificate,
            key_pair,
        });
    }

    let now = Utc::now();
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    if let Some(org) = &config.organization {
        dn.push(DnType::OrganizationName, org.as_str());
    }
    dn.push(DnType::CommonName, config.ca_common_name.as_str());
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params.serial_number = Some(SerialNumber::from(new_serial().to_vec()));
    params.not_before = to_offset(now)?;
    params.not_after = to_offset(now + Duration::days(config.ca_validity_days))?;

    let key_pair = KeyPair::generate()?;
    let certificate = params.self_signed(&key_pair)?;

    write_private(&key_path, &key_pair.serialize_pem())?;
    fs::write(&cert_path, certificate.pem()).map_err(|e| storage(&cert_path, e))?;
    info!(path = %cert_path.display(), "[pr-03] Created new CA");

    Ok(CaMaterial {
        certificate,
        key_pair,
    })
}

/// 16 random bytes, positive and without a leading zero byte.
fn new_serial() -> [u8; 16] {
    let mut bytes: [u8; 16] = rand::random();
    bytes[0] = (bytes[0] & 0x7f).max(1);
    bytes
}

fn to_offset(date: DateTime<Utc>) -> Result<OffsetDateTime, AuthorityError> {
    OffsetDateTime::from_unix_timestamp(date.timestamp())
        .map_err(|e| AuthorityError::Crypto(format!("validity out of range: {}", e)))
}

fn storage(path: &Path, err: std::io::Error) -> AuthorityError {
    AuthorityError::Storage {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn write_private(path: &Path, contents: &str) -> Result<(), AuthorityError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| storage(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| storage(path, e))
}
