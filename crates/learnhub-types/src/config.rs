//! Catalog configuration types.
//!
//! `CatalogConfig` represents the top-level `config.toml` that controls
//! URL verification, popularity weighting, and the deployment mode.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Deployment mode. Only `Production` enforces strict TLS validation when
/// probing resource URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    pub fn is_production(self) -> bool {
        self == DeploymentMode::Production
    }
}

impl Default for DeploymentMode {
    fn default() -> Self {
        DeploymentMode::Development
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Development => write!(f, "development"),
            DeploymentMode::Production => write!(f, "production"),
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(DeploymentMode::Production),
            "development" | "dev" | "test" | "staging" => Ok(DeploymentMode::Development),
            other => Err(format!("invalid deployment mode: '{other}'")),
        }
    }
}

/// Top-level catalog configuration, loaded from `~/.learnhub/config.toml`.
/// All fields have defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub deployment_mode: DeploymentMode,

    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub popularity: PopularityWeights,
}

/// Settings for the resource trust verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Per-probe timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum in-flight probes during bulk sweeps.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause each sweep worker takes between dispatches.
    #[serde(default = "default_dispatch_delay_ms")]
    pub dispatch_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Hosts trusted without a network round-trip (substring match).
    #[serde(default = "default_trusted_domains")]
    pub trusted_domains: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_concurrency() -> usize {
    5
}

fn default_dispatch_delay_ms() -> u64 {
    100
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; LearnHubBot/1.0; +resource-verification)".to_string()
}

/// Known learning-content platforms.
pub fn default_trusted_domains() -> Vec<String> {
    [
        "youtube.com",
        "youtu.be",
        "coursera.org",
        "udemy.com",
        "edx.org",
        "khanacademy.org",
        "linkedin.com",
        "freecodecamp.org",
        "codecademy.com",
        "w3schools.com",
        "developer.mozilla.org",
        "docs.python.org",
        "doc.rust-lang.org",
        "github.com",
        "stackoverflow.com",
        "medium.com",
        "dev.to",
        "geeksforgeeks.org",
        "ted.com",
        "skillshare.com",
        "pluralsight.com",
        "futurelearn.com",
        "duolingo.com",
        "wikipedia.org",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            dispatch_delay_ms: default_dispatch_delay_ms(),
            user_agent: default_user_agent(),
            trusted_domains: default_trusted_domains(),
        }
    }
}

/// Weights of the skill popularity score:
/// `resource_weight * total + rating_weight * avg_rating + learners / learner_divisor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityWeights {
    #[serde(default = "default_resource_weight")]
    pub resource_weight: f64,

    #[serde(default = "default_rating_weight")]
    pub rating_weight: f64,

    #[serde(default = "default_learner_divisor")]
    pub learner_divisor: f64,
}

fn default_resource_weight() -> f64 {
    10.0
}

fn default_rating_weight() -> f64 {
    20.0
}

fn default_learner_divisor() -> f64 {
    100.0
}

impl Default for PopularityWeights {
    fn default() -> Self {
        Self {
            resource_weight: default_resource_weight(),
            rating_weight: default_rating_weight(),
            learner_divisor: default_learner_divisor(),
        }
    }
}

impl PopularityWeights {
    pub fn score(&self, total_resources: u32, average_rating: f64, total_learners: u64) -> f64 {
        let learners = if self.learner_divisor > 0.0 {
            total_learners as f64 / self.learner_divisor
        } else {
            0.0
        };
        self.resource_weight * f64::from(total_resources)
            + self.rating_weight * average_rating
            + learners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CatalogConfig::default();
        assert_eq!(config.deployment_mode, DeploymentMode::Development);
        assert_eq!(config.verification.timeout_secs, 10);
        assert_eq!(config.verification.concurrency, 5);
        assert_eq!(config.verification.dispatch_delay_ms, 100);
        assert!(config
            .verification
            .trusted_domains
            .iter()
            .any(|d| d == "youtube.com"));
        assert_eq!(config.popularity, PopularityWeights::default());
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: CatalogConfig = toml::from_str("").unwrap();
        assert_eq!(config.verification.concurrency, 5);
        assert!((config.popularity.rating_weight - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_with_values() {
        let toml_str = r#"
deployment_mode = "production"

[verification]
timeout_secs = 3
trusted_domains = ["example.edu"]

[popularity]
resource_weight = 5.0
"#;
        let config: CatalogConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.deployment_mode, DeploymentMode::Production);
        assert_eq!(config.verification.timeout_secs, 3);
        assert_eq!(config.verification.concurrency, 5);
        assert_eq!(config.verification.trusted_domains, vec!["example.edu"]);
        assert!((config.popularity.resource_weight - 5.0).abs() < f64::EPSILON);
        assert!((config.popularity.learner_divisor - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_popularity_regression() {
        let weights = PopularityWeights::default();
        let score = weights.score(5, 4.0, 1000);
        assert!((score - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_popularity_zero_divisor_ignores_learners() {
        let weights = PopularityWeights {
            learner_divisor: 0.0,
            ..Default::default()
        };
        assert!((weights.score(1, 0.0, 10_000) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_deployment_mode_parse() {
        assert_eq!("prod".parse::<DeploymentMode>().unwrap(), DeploymentMode::Production);
        assert_eq!(" Development ".parse::<DeploymentMode>().unwrap(), DeploymentMode::Development);
        assert!(!DeploymentMode::Development.is_production());
        assert!("qa-cluster".parse::<DeploymentMode>().is_err());
    }
}
