//! Caller identity used as the rate-limit and conversation key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use super::ValidationError;

/// Who is chatting: a verified email or an anonymous visitor keyed by IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identity {
    Email(String),
    Anonymous(IpAddr),
}

impl Identity {
    /// Creates an email identity, normalised to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the address is empty, contains
    /// whitespace, or lacks a local part or domain.
    pub fn email(address: impl AsRef<str>) -> Result<Self, ValidationError> {
        let address = address.as_ref().trim();
        if address.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        if address.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format("email", "contains whitespace"));
        }
        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Identity::Email(address.to_lowercase()))
            }
            _ => Err(ValidationError::invalid_format("email", "expected local@domain")),
        }
    }

    /// Creates an anonymous identity from an IP address string.
    pub fn anonymous(ip: impl AsRef<str>) -> Result<Self, ValidationError> {
        let ip = ip.as_ref().trim();
        if ip.is_empty() {
            return Err(ValidationError::empty_field("ip"));
        }
        ip.parse::<IpAddr>()
            .map(Identity::Anonymous)
            .map_err(|e| ValidationError::invalid_format("ip", e.to_string()))
    }

    /// Stable storage key, e.g. `email:a@x.com` or `ip:10.0.0.1`.
    pub fn key(&self) -> String {
        match self {
            Identity::Email(address) => format!("email:{}", address),
            Identity::Anonymous(ip) => format!("ip:{}", ip),
        }
    }

    pub fn email_address(&self) -> Option<&str> {
        match self {
            Identity::Email(address) => Some(address),
            Identity::Anonymous(_) => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous(_))
    }

    /// Log-safe form: masked local part for emails, network prefix for IPs.
    pub fn redacted(&self) -> String {
        match self {
            Identity::Email(address) => format!("email:{}", redact_email(address)),
            Identity::Anonymous(IpAddr::V4(ip)) => {
                let [a, b, c, _] = ip.octets();
                format!("ip:{}.{}.{}.0", a, b, c)
            }
            Identity::Anonymous(IpAddr::V6(ip)) => {
                let s = ip.segments();
                format!("ip:{:x}:{:x}:{:x}::", s[0], s[1], s[2])
            }
        }
    }
}

/// Keeps the first character of the local part and the domain.
pub fn redact_email(address: &str) -> String {
    match address.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Email(address) => write!(f, "{}", address),
            Identity::Anonymous(ip) => write!(f, "anonymous@{}", ip),
        }
    }
}
