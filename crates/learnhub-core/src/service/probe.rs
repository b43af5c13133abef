//! UrlProbe trait for network reachability checks.
//!
//! Defined in learnhub-core so the trust verifier can be tested without the
//! network. The reqwest-backed adapter lives in learnhub-infra.

use std::time::Duration;

use learnhub_types::verification::{ProbeOutcome, VerificationFailure};
use url::Url;

/// A single HEAD-style reachability probe.
pub trait UrlProbe: Send + Sync {
    /// Probe `url`, giving up after `timeout`. Never downloads a body.
    fn probe(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> impl std::future::Future<Output = ProbeOutcome> + Send;
}

/// Map a transport error description (the flattened error source chain) to
/// the failure taxonomy shown to admins.
pub fn classify_transport_error(detail: &str) -> VerificationFailure {
    let detail = detail.to_lowercase();

    if detail.contains("dns error")
        || detail.contains("failed to lookup address")
        || detail.contains("name or service not known")
        || detail.contains("nodename nor servname")
        || detail.contains("no such host")
        || detail.contains("name resolution")
    {
        return VerificationFailure::DomainNotFound;
    }

    if detail.contains("connection refused") {
        return VerificationFailure::ConnectionRefused;
    }

    if detail.contains("certificate") || detail.contains("tls") || detail.contains("ssl") {
        if detail.contains("expired") {
            return VerificationFailure::CertificateExpired;
        }
        return VerificationFailure::CertificateInvalid;
    }

    if detail.contains("timed out") || detail.contains("timeout") {
        return VerificationFailure::Timeout;
    }

    VerificationFailure::ConnectionFailed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_dns_failures() {
        assert_eq!(
            classify_transport_error(
                "error sending request: client error (Connect): dns error: failed to lookup address information: Name or service not known"
            ),
            VerificationFailure::DomainNotFound
        );
        assert_eq!(
            classify_transport_error("nodename nor servname provided, or not known"),
            VerificationFailure::DomainNotFound
        );
    }

    #[test]
    fn test_classify_refused() {
        assert_eq!(
            classify_transport_error("tcp connect error: Connection refused (os error 111)"),
            VerificationFailure::ConnectionRefused
        );
    }

    #[test]
    fn test_classify_certificates() {
        assert_eq!(
            classify_transport_error("invalid peer certificate: Expired"),
            VerificationFailure::CertificateExpired
        );
        assert_eq!(
            classify_transport_error("invalid peer certificate: UnknownIssuer"),
            VerificationFailure::CertificateInvalid
        );
        assert_eq!(
            classify_transport_error("error:0A000086:SSL routines::certificate verify failed"),
            VerificationFailure::CertificateInvalid
        );
    }

    #[test]
    fn test_classify_timeout_and_fallback() {
        assert_eq!(
            classify_transport_error("operation timed out"),
            VerificationFailure::Timeout
        );
        assert_eq!(
            classify_transport_error("connection reset by peer"),
            VerificationFailure::ConnectionFailed
        );
    }
}
