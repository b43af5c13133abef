//! URL verification outcomes.
//!
//! A failed check is a value, never an error: callers surface
//! `error` to admins as a warning and carry on.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Message reported for URLs that cannot be parsed even after scheme normalization.
pub const INVALID_URL_MESSAGE: &str = "Invalid URL format";

/// Why a URL could not be confirmed reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationFailure {
    InvalidUrl,
    HttpStatus { status: u16 },
    DomainNotFound,
    ConnectionRefused,
    Timeout,
    CertificateExpired,
    CertificateInvalid,
    ConnectionFailed,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationFailure::InvalidUrl => f.write_str(INVALID_URL_MESSAGE),
            VerificationFailure::HttpStatus { status } => write!(f, "HTTP {status}"),
            VerificationFailure::DomainNotFound => f.write_str("Domain not found"),
            VerificationFailure::ConnectionRefused => f.write_str("Connection refused"),
            VerificationFailure::Timeout => f.write_str("Request timed out"),
            VerificationFailure::CertificateExpired => f.write_str("SSL certificate expired"),
            VerificationFailure::CertificateInvalid => {
                f.write_str("SSL certificate verification failed")
            }
            VerificationFailure::ConnectionFailed => f.write_str("Connection failed"),
        }
    }
}

/// Raw result of a single reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with this HTTP status.
    Status(u16),
    /// The request never produced a response.
    Failed(VerificationFailure),
}

/// Result of `verify_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub failure: Option<VerificationFailure>,
}

impl UrlCheck {
    pub fn valid(status_code: u16) -> Self {
        Self {
            is_valid: true,
            status_code: Some(status_code),
            error: None,
            failure: None,
        }
    }

    pub fn invalid(failure: VerificationFailure) -> Self {
        let status_code = match failure {
            VerificationFailure::HttpStatus { status } => Some(status),
            _ => None,
        };
        Self {
            is_valid: false,
            status_code,
            error: Some(failure.to_string()),
            failure: Some(failure),
        }
    }

    /// Classify an HTTP status: 2xx and 3xx count as reachable.
    pub fn from_status(status: u16) -> Self {
        if (200..400).contains(&status) {
            Self::valid(status)
        } else {
            Self::invalid(VerificationFailure::HttpStatus { status })
        }
    }
}

/// How a verification decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// Host matched the trusted platform list; no network call.
    AllowList,
    /// Live reachability probe.
    Probe,
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationMethod::AllowList => write!(f, "allow_list"),
            VerificationMethod::Probe => write!(f, "probe"),
        }
    }
}

/// Outcome of the trust decision policy for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDecision {
    pub verified: bool,
    pub method: VerificationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationDecision {
    pub fn allow_listed() -> Self {
        Self {
            verified: true,
            method: VerificationMethod::AllowList,
            status_code: None,
            error: None,
        }
    }

    pub fn from_check(check: UrlCheck) -> Self {
        Self {
            verified: check.is_valid,
            method: VerificationMethod::Probe,
            status_code: check.status_code,
            error: check.error,
        }
    }
}
