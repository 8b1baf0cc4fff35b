//! # Certificate Index
//!
//! The OpenSSL `ca` database (`index.txt`): one tab-separated line per
//! issued certificate.
//!
//! ```text
//! V	340101000000Z		4F3A...	unknown	/CN=alice
//! R	340101000000Z	250102030405Z	9B11...	unknown	/CN=bob
//! ```
//!
//! Fields: status, expiry, revocation date (empty unless revoked), serial
//! in hex, file name (always `unknown`), subject.

use crate::domain::AuthorityError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

const DATE_FORMAT: &str = "%y%m%d%H%M%SZ";

/// Status column of an index line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatus {
    /// `V`
    Valid,
    /// `R`
    Revoked,
    /// `E`
    Expired,
}

impl CertificateStatus {
    fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "V" => Some(Self::Valid),
            "R" => Some(Self::Revoked),
            "E" => Some(Self::Expired),
            _ => None,
        }
    }

    fn flag(&self) -> char {
        match self {
            Self::Valid => 'V',
            Self::Revoked => 'R',
            Self::Expired => 'E',
        }
    }
}

/// One line of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Status flag
    pub status: CertificateStatus,
    /// `notAfter` of the certificate
    pub expires_at: DateTime<Utc>,
    /// Set when status is `Revoked`
    pub revoked_at: Option<DateTime<Utc>>,
    /// Serial number, upper-case hex
    pub serial: String,
    /// Subject in OpenSSL one-line form
    pub subject: String,
}

impl IndexEntry {
    /// Valid entry for `common_name`.
    pub fn issued(common_name: &str, serial: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            status: CertificateStatus::Valid,
            expires_at,
            revoked_at: None,
            serial: serial.to_ascii_uppercase(),
            subject: format!("/CN={}", common_name),
        }
    }

    /// The `CN` component of the subject.
    pub fn common_name(&self) -> Option<&str> {
        self.subject
            .split('/')
            .find_map(|part| part.strip_prefix("CN="))
    }

    /// Valid status and not yet past expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CertificateStatus::Valid && self.expires_at > now
    }

    fn parse(line: &str, line_no: usize) -> Result<Self, AuthorityError> {
        let corrupt = |reason: String| AuthorityError::CorruptIndex {
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 6 {
            return Err(corrupt(format!("expected 6 fields, found {}", fields.len())));
        }

        let status = CertificateStatus::from_flag(fields[0])
            .ok_or_else(|| corrupt(format!("unknown status {:?}", fields[0])))?;
        let expires_at = parse_date(fields[1]).map_err(|e| corrupt(format!("expiry: {}", e)))?;
        let revoked_at = match fields[2] {
            "" => None,
            // The revocation field may carry a `,reason` suffix.
            raw => Some(
                parse_date(raw.split(',').next().unwrap_or_default())
                    .map_err(|e| corrupt(format!("revocation date: {}", e)))?,
            ),
        };
        if status == CertificateStatus::Revoked && revoked_at.is_none() {
            return Err(corrupt("revoked entry without revocation date".to_string()));
        }

        Ok(Self {
            status,
            expires_at,
            revoked_at,
            serial: fields[3].to_string(),
            subject: fields[5].to_string(),
        })
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let revoked = self
            .revoked_at
            .map(format_date)
            .unwrap_or_default();
        write!(
            f,
            "{}\t{}\t{}\t{}\tunknown\t{}",
            self.status.flag(),
            format_date(self.expires_at),
            revoked,
            self.serial,
            self.subject
        )
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT).map(|naive| naive.and_utc())
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// In-memory copy of `index.txt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateIndex {
    entries: Vec<IndexEntry>,
}

impl CertificateIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the contents of an index file. Blank lines are ignored.
    pub fn parse(contents: &str) -> Result<Self, AuthorityError> {
        let entries = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| IndexEntry::parse(line, i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Render in index file form, one line per entry.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}\n", entry))
            .collect()
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// The valid entry for `common_name`, if any.
    pub fn find_valid(&self, common_name: &str, now: DateTime<Utc>) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.is_valid_at(now) && e.common_name() == Some(common_name))
    }

    /// Record a newly issued certificate.
    pub fn append(&mut self, entry: IndexEntry) {
        self.entries.push(entry);
    }

    /// Mark every valid entry for `common_name` revoked. Returns the serials
    /// that changed.
    pub fn revoke(&mut self, common_name: &str, now: DateTime<Utc>) -> Vec<String> {
        self.entries
            .iter_mut()
            .filter(|e| e.is_valid_at(now) && e.common_name() == Some(common_name))
            .map(|entry| {
                entry.status = CertificateStatus::Revoked;
                entry.revoked_at = Some(now);
                entry.serial.clone()
            })
            .collect()
    }

    /// Flip valid entries past their expiry to `E`. Returns how many changed.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.status == CertificateStatus::Valid && entry.expires_at <= now {
                entry.status = CertificateStatus::Expired;
                changed += 1;
            }
        }
        changed
    }
}
