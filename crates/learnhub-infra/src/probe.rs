//! reqwest-backed implementation of `UrlProbe`.
//!
//! Sends a HEAD request (falling back to GET when the server refuses HEAD),
//! follows a bounded number of redirects and never reads the body. TLS
//! certificates are only validated strictly in production.

use std::time::Duration;

use learnhub_core::service::probe::{UrlProbe, classify_transport_error};
use learnhub_types::config::DeploymentMode;
use learnhub_types::verification::{ProbeOutcome, VerificationFailure};
use reqwest::{Client, StatusCode, redirect};
use url::Url;

const MAX_REDIRECTS: usize = 5;

pub struct ReqwestUrlProbe {
    client: Client,
}

impl ReqwestUrlProbe {
    pub fn new(mode: DeploymentMode, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .danger_accept_invalid_certs(!mode.is_production())
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .request(method, url.clone())
            .timeout(timeout)
            .send()
            .await?;
        Ok(response.status())
    }
}

/// Flatten an error and its sources into one line for classification.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

fn classify(err: &reqwest::Error) -> VerificationFailure {
    if err.is_timeout() {
        return VerificationFailure::Timeout;
    }
    classify_transport_error(&error_chain(err))
}

impl UrlProbe for ReqwestUrlProbe {
    async fn probe(&self, url: &Url, timeout: Duration) -> ProbeOutcome {
        let status = match self.send(reqwest::Method::HEAD, url, timeout).await {
            Ok(status)
                if status == StatusCode::METHOD_NOT_ALLOWED
                    || status == StatusCode::NOT_IMPLEMENTED =>
            {
                tracing::debug!(%url, %status, "HEAD refused, retrying with GET");
                self.send(reqwest::Method::GET, url, timeout).await
            }
            other => other,
        };

        match status {
            Ok(status) => ProbeOutcome::Status(status.as_u16()),
            Err(err) => {
                let failure = classify(&err);
                tracing::debug!(%url, error = %error_chain(&err), ?failure, "Probe transport error");
                ProbeOutcome::Failed(failure)
            }
        }
    }
}
