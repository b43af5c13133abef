//! Resource trust verifier.
//!
//! Decides whether a resource URL is trusted for end-user exposure. Hosts on
//! the configured platform list are accepted without a network call; anything
//! else gets a single bounded reachability probe. A failed check is reported
//! as a value and never blocks the catalog mutation that asked for it.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use url::Url;

use learnhub_types::config::VerificationConfig;
use learnhub_types::verification::{
    ProbeOutcome, UrlCheck, VerificationDecision, VerificationFailure,
};

use crate::service::probe::UrlProbe;

/// Explicit set of trusted platform domains.
#[derive(Debug, Clone, Default)]
pub struct TrustedDomains {
    domains: Vec<String>,
}

impl TrustedDomains {
    /// Build the set, lowercasing entries and dropping blanks.
    pub fn new<I, D>(domains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .map(|d| d.strip_prefix("www.").map(str::to_string).unwrap_or(d))
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    /// Substring match against an already `www.`-stripped host.
    pub fn matches_host(&self, host: &str) -> bool {
        self.domains.iter().any(|d| host.contains(d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Timing knobs for probes.
#[derive(Debug, Clone)]
pub struct VerificationSettings {
    pub timeout: Duration,
    /// Maximum in-flight probes in `verify_many`.
    pub concurrency: usize,
    /// Pause between dispatches of the same `verify_many` worker.
    pub dispatch_delay: Duration,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self::from(&VerificationConfig::default())
    }
}

impl From<&VerificationConfig> for VerificationSettings {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            concurrency: config.concurrency.max(1),
            dispatch_delay: Duration::from_millis(config.dispatch_delay_ms),
        }
    }
}

/// Normalize user input into an absolute http(s) URL.
///
/// Inputs without a scheme get `https://` prepended. Anything that still
/// fails to parse, uses another scheme, or has no host is `InvalidUrl`.
pub fn normalize_url(raw: &str) -> Result<Url, VerificationFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VerificationFailure::InvalidUrl);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|_| VerificationFailure::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(VerificationFailure::InvalidUrl),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(VerificationFailure::InvalidUrl);
    }
    Ok(url)
}

/// The form a URL is stored in: normalized when parseable, trimmed otherwise.
pub fn canonical_url(raw: &str) -> String {
    normalize_url(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.trim().to_string())
}

/// Trust verifier over a pluggable probe.
pub struct TrustVerifier<P: UrlProbe> {
    trusted: TrustedDomains,
    probe: P,
    settings: VerificationSettings,
}

impl<P: UrlProbe> TrustVerifier<P> {
    pub fn new(trusted: TrustedDomains, probe: P, settings: VerificationSettings) -> Self {
        Self {
            trusted,
            probe,
            settings,
        }
    }

    /// Build from the `[verification]` config section.
    pub fn from_config(config: &VerificationConfig, probe: P) -> Self {
        Self::new(
            TrustedDomains::new(&config.trusted_domains),
            probe,
            VerificationSettings::from(config),
        )
    }

    pub fn settings(&self) -> &VerificationSettings {
        &self.settings
    }

    pub fn trusted_domains(&self) -> &TrustedDomains {
        &self.trusted
    }

    /// Pure allow-list check. Fails closed on unparseable input.
    pub fn is_known_authentic_platform(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        self.trusted.matches_host(host)
    }

    /// Probe a URL once, bounded by the configured timeout.
    #[tracing::instrument(name = "verify_url", skip(self), fields(timeout_ms = self.settings.timeout.as_millis() as u64))]
    pub async fn verify_url(&self, url: &str) -> UrlCheck {
        let parsed = match normalize_url(url) {
            Ok(parsed) => parsed,
            Err(failure) => {
                tracing::debug!("Rejected malformed URL without probing");
                return UrlCheck::invalid(failure);
            }
        };

        let timeout = self.settings.timeout;
        let outcome = match tokio::time::timeout(timeout, self.probe.probe(&parsed, timeout)).await
        {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Failed(VerificationFailure::Timeout),
        };

        let check = match outcome {
            ProbeOutcome::Status(status) => UrlCheck::from_status(status),
            ProbeOutcome::Failed(failure) => UrlCheck::invalid(failure),
        };
        tracing::debug!(
            valid = check.is_valid,
            status = ?check.status_code,
            error = ?check.error,
            "URL probe finished"
        );
        check
    }

    /// Probe many URLs with at most `concurrency` in flight.
    ///
    /// Workers drain a shared queue and pause `dispatch_delay` between their
    /// own dispatches. Results come back in input order.
    pub async fn verify_many(&self, urls: &[String]) -> Vec<(String, UrlCheck)> {
        if urls.is_empty() {
            return Vec::new();
        }

        let queue: Mutex<VecDeque<(usize, &str)>> =
            Mutex::new(urls.iter().map(String::as_str).enumerate().collect());
        let worker_count = self.settings.concurrency.max(1).min(urls.len());
        let queue = &queue;
        let this = self;

        let workers = (0..worker_count).map(move |_| async move {
            let mut done: Vec<(usize, UrlCheck)> = Vec::new();
            loop {
                let next = queue.lock().await.pop_front();
                let Some((index, url)) = next else {
                    break;
                };
                if !done.is_empty() && !this.settings.dispatch_delay.is_zero() {
                    tokio::time::sleep(this.settings.dispatch_delay).await;
                }
                done.push((index, this.verify_url(url).await));
            }
            done
        });

        let mut results: Vec<Option<UrlCheck>> = vec![None; urls.len()];
        for (index, check) in join_all(workers).await.into_iter().flatten() {
            results[index] = Some(check);
        }

        urls.iter()
            .cloned()
            .zip(results)
            .map(|(url, check)| {
                let check = check
                    .unwrap_or_else(|| UrlCheck::invalid(VerificationFailure::ConnectionFailed));
                (url, check)
            })
            .collect()
    }

    /// Trust decision: allow-list fast path, else a live probe.
    pub async fn decide_verification(&self, url: &str) -> VerificationDecision {
        if self.is_known_authentic_platform(url) {
            tracing::debug!(url, "Trusted platform, skipping probe");
            return VerificationDecision::allow_listed();
        }
        VerificationDecision::from_check(self.verify_url(url).await)
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::testing::{FakeProbe, SlowProbe};
    use learnhub_types::verification::VerificationMethod;

    fn verifier(probe: FakeProbe) -> TrustVerifier<FakeProbe> {
        TrustVerifier::new(
            TrustedDomains::new(["youtube.com", "coursera.org", "docs.python.org"]),
            probe,
            VerificationSettings {
                timeout: Duration::from_secs(10),
                concurrency: 5,
                dispatch_delay: Duration::from_millis(100),
            },
        )
    }

    #[test]
    fn test_known_platform_matches() {
        let v = verifier(FakeProbe::new(ProbeOutcome::Status(200)));
        assert!(v.is_known_authentic_platform("https://www.youtube.com/watch?v=x"));
        assert!(v.is_known_authentic_platform("https://m.youtube.com/watch?v=x"));
        assert!(v.is_known_authentic_platform("http://COURSERA.org/learn/ml"));
        assert!(v.is_known_authentic_platform("https://docs.python.org/3/tutorial/"));
    }

    #[test]
    fn test_known_platform_rejects_unknown_and_garbage() {
        let v = verifier(FakeProbe::new(ProbeOutcome::Status(200)));
        assert!(!v.is_known_authentic_platform("http://not-a-real-domain-xyz123.test"));
        assert!(!v.is_known_authentic_platform("not a url"));
        assert!(!v.is_known_authentic_platform(""));
        assert!(!v.is_known_authentic_platform("mailto:someone@youtube.com"));
    }

    #[test]
    fn test_trusted_domains_are_injectable() {
        let v = TrustVerifier::new(
            TrustedDomains::new(["WWW.Example.EDU", "  "]),
            FakeProbe::new(ProbeOutcome::Status(200)),
            VerificationSettings::default(),
        );
        assert_eq!(v.trusted_domains().len(), 1);
        assert!(v.is_known_authentic_platform("https://www.example.edu/course"));
        assert!(!v.is_known_authentic_platform("https://www.youtube.com/watch?v=x"));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("example.com/path").unwrap().as_str(),
            "https://example.com/path"
        );
        assert_eq!(
            normalize_url("  http://example.com ").unwrap().as_str(),
            "http://example.com/"
        );
        assert_eq!(normalize_url("not a url"), Err(VerificationFailure::InvalidUrl));
        assert_eq!(normalize_url(""), Err(VerificationFailure::InvalidUrl));
        assert_eq!(
            normalize_url("ftp://files.example.com/x"),
            Err(VerificationFailure::InvalidUrl)
        );
    }

    #[test]
    fn test_canonical_url_keeps_unparseable_input() {
        assert_eq!(canonical_url("example.com"), "https://example.com/");
        assert_eq!(canonical_url(" not a url "), "not a url");
    }

    #[tokio::test]
    async fn test_verify_url_ok() {
        let v = verifier(FakeProbe::new(ProbeOutcome::Status(200)));
        let check = v.verify_url("https://example.com").await;
        assert!(check.is_valid);
        assert_eq!(check.status_code, Some(200));
        assert!(check.error.is_none());
    }

    #[tokio::test]
    async fn test_verify_url_not_found() {
        let v = verifier(FakeProbe::new(ProbeOutcome::Status(404)));
        let check = v.verify_url("https://example.com/missing").await;
        assert!(!check.is_valid);
        assert_eq!(check.status_code, Some(404));
        assert_eq!(check.error.as_deref(), Some("HTTP 404"));
    }

    #[tokio::test]
    async fn test_verify_url_domain_not_found() {
        let v = verifier(FakeProbe::new(ProbeOutcome::Failed(
            VerificationFailure::DomainNotFound,
        )));
        let check = v.verify_url("http://not-a-real-domain-xyz123.test").await;
        assert!(!check.is_valid);
        assert_eq!(check.failure, Some(VerificationFailure::DomainNotFound));
        assert_eq!(check.error.as_deref(), Some("Domain not found"));
    }

    #[tokio::test]
    async fn test_verify_url_malformed_never_probes() {
        let probe = FakeProbe::new(ProbeOutcome::Status(200));
        let calls = probe.calls();
        let v = verifier(probe);
        let check = v.verify_url("not a url").await;
        assert!(!check.is_valid);
        assert_eq!(check.error.as_deref(), Some("Invalid URL format"));
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_verify_url_prepends_scheme() {
        let probe = FakeProbe::new(ProbeOutcome::Status(204));
        let seen = probe.seen();
        let v = verifier(probe);
        assert!(v.verify_url("example.org/about").await.is_valid);
        assert_eq!(seen.urls(), vec!["https://example.org/about".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_url_times_out_even_if_probe_hangs() {
        let v = TrustVerifier::new(
            TrustedDomains::default(),
            SlowProbe::new(Duration::from_secs(60)),
            VerificationSettings {
                timeout: Duration::from_secs(10),
                concurrency: 1,
                dispatch_delay: Duration::ZERO,
            },
        );
        let check = v.verify_url("https://slow.example.com").await;
        assert!(!check.is_valid);
        assert_eq!(check.failure, Some(VerificationFailure::Timeout));
    }

    #[tokio::test]
    async fn test_decide_allow_list_skips_network() {
        let probe = FakeProbe::new(ProbeOutcome::Status(500));
        let calls = probe.calls();
        let v = verifier(probe);
        let decision = v
            .decide_verification("https://www.youtube.com/watch?v=x")
            .await;
        assert!(decision.verified);
        assert_eq!(decision.method, VerificationMethod::AllowList);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_decide_probe_failure_is_a_value() {
        let v = verifier(FakeProbe::new(ProbeOutcome::Failed(
            VerificationFailure::ConnectionRefused,
        )));
        let decision = v.decide_verification("https://intranet.example.com").await;
        assert!(!decision.verified);
        assert_eq!(decision.method, VerificationMethod::Probe);
        assert_eq!(decision.error.as_deref(), Some("Connection refused"));
    }

    #[tokio::test]
    async fn test_verify_many_preserves_order() {
        let probe = FakeProbe::new(ProbeOutcome::Status(200))
            .with_host("gone.example.com", ProbeOutcome::Status(404));
        let v = verifier(probe);
        let urls = vec![
            "https://a.example.com".to_string(),
            "https://gone.example.com".to_string(),
            "bad url".to_string(),
            "https://b.example.com".to_string(),
        ];
        let results = v.verify_many(&urls).await;
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].0, "https://a.example.com");
        assert!(results[0].1.is_valid);
        assert_eq!(results[1].1.status_code, Some(404));
        assert_eq!(results[2].1.error.as_deref(), Some("Invalid URL format"));
        assert!(results[3].1.is_valid);
    }

    #[tokio::test]
    async fn test_verify_many_empty() {
        let v = verifier(FakeProbe::new(ProbeOutcome::Status(200)));
        assert!(v.verify_many(&[]).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_many_bounds_concurrency() {
        let probe = SlowProbe::new(Duration::from_secs(1));
        let peak = probe.peak();
        let v = TrustVerifier::new(
            TrustedDomains::default(),
            probe,
            VerificationSettings {
                timeout: Duration::from_secs(10),
                concurrency: 3,
                dispatch_delay: Duration::from_millis(100),
            },
        );
        let urls: Vec<String> = (0..9).map(|i| format!("https://h{i}.example.com")).collect();

        let started = Instant::now();
        let results = v.verify_many(&urls).await;
        assert_eq!(results.len(), 9);
        assert!(results.iter().all(|(_, c)| c.is_valid));
        assert_eq!(peak.get(), 3);
        // 3 rounds of 1s probes plus 2 dispatch delays per worker.
        assert!(started.elapsed() >= Duration::from_millis(3200));
    }
}
