//! Request-side URL validation.
//!
//! Runs in the transport layer before the service is invoked; the
//! service itself trusts its input. Rejects non-http(s) schemes,
//! over-long URLs, and targets that would let a redirect reach
//! internal infrastructure (SSRF).

use thiserror::Error;
use url::{Host, Url};

pub const DEFAULT_MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid URL format")]
    Malformed,
    #[error("URL scheme must be http or https")]
    BadScheme,
    #[error("URL is missing a host")]
    MissingHost,
    #[error("URL length ({0}) exceeds maximum allowed length ({1})")]
    TooLong(usize, usize),
    #[error("URL targets a blocked or internal address")]
    Blocked,
}

#[derive(Debug, Clone)]
pub struct UrlValidator {
    max_length: usize,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_URL_LENGTH)
    }
}

impl UrlValidator {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Trim whitespace and default to https for schemeless input.
    pub fn sanitize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        }
    }

    /// Validate a sanitized URL. Returns the canonical string form on
    /// success.
    pub fn validate(&self, raw: &str) -> Result<String, ValidationError> {
        if raw.len() > self.max_length {
            return Err(ValidationError::TooLong(raw.len(), self.max_length));
        }

        let parsed = Url::parse(raw).map_err(|_| ValidationError::Malformed)?;

        match parsed.scheme() {
            "http" | "https" => {}
            _ => return Err(ValidationError::BadScheme),
        }

        match parsed.host() {
            None => Err(ValidationError::MissingHost),
            Some(host) if host_is_blocked(&host) => Err(ValidationError::Blocked),
            Some(_) => Ok(raw.to_string()),
        }
    }
}

fn host_is_blocked(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => ipv4_is_blocked(*ip),
        Host::Ipv6(ip) => match ip.to_ipv4_mapped() {
            Some(v4) => ipv4_is_blocked(v4),
            None => ip.is_loopback() || ip.is_unspecified(),
        },
    }
}

fn ipv4_is_blocked(ip: std::net::Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}
