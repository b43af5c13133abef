//! Catalog configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.learnhub/` by default)
//! and deserializes it into [`CatalogConfig`]. Falls back to defaults when
//! the file is missing or malformed. `LEARNHUB_ENV` overrides the file's
//! deployment mode.

use std::path::{Path, PathBuf};

use learnhub_types::config::{CatalogConfig, DeploymentMode};

/// Environment variable pointing at the data directory.
pub const DATA_DIR_ENV: &str = "LEARNHUB_DATA_DIR";

/// Environment variable selecting the deployment mode.
pub const DEPLOYMENT_ENV: &str = "LEARNHUB_ENV";

/// Resolve the data directory: `LEARNHUB_DATA_DIR`, else `~/.learnhub`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".learnhub"),
    }
}

/// Load `{data_dir}/config.toml`, then apply `LEARNHUB_ENV`.
pub async fn load_catalog_config(data_dir: &Path) -> CatalogConfig {
    let config = read_config_file(data_dir).await;
    apply_deployment_override(config, std::env::var(DEPLOYMENT_ENV).ok().as_deref())
}

async fn read_config_file(data_dir: &Path) -> CatalogConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return CatalogConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return CatalogConfig::default();
        }
    };

    match toml::from_str::<CatalogConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            CatalogConfig::default()
        }
    }
}

/// Apply a `LEARNHUB_ENV` value. `production`/`prod` selects production;
/// any other non-empty value selects development.
pub fn apply_deployment_override(mut config: CatalogConfig, env: Option<&str>) -> CatalogConfig {
    let Some(value) = env.map(str::trim).filter(|v| !v.is_empty()) else {
        return config;
    };

    config.deployment_mode = value.parse().unwrap_or_else(|_| {
        tracing::debug!(value, "Unrecognized {DEPLOYMENT_ENV}, treating as development");
        DeploymentMode::Development
    });
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.deployment_mode, DeploymentMode::Development);
        assert_eq!(config.verification.timeout_secs, 10);
        assert_eq!(config.popularity.resource_weight, 10.0);
    }

    #[tokio::test]
    async fn read_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
deployment_mode = "production"

[verification]
timeout_secs = 3
concurrency = 2
trusted_domains = ["example.edu"]

[popularity]
learner_divisor = 50.0
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.deployment_mode, DeploymentMode::Production);
        assert_eq!(config.verification.timeout_secs, 3);
        assert_eq!(config.verification.concurrency, 2);
        assert_eq!(config.verification.dispatch_delay_ms, 100);
        assert_eq!(config.verification.trusted_domains, vec!["example.edu"]);
        assert_eq!(config.popularity.learner_divisor, 50.0);
        assert_eq!(config.popularity.rating_weight, 20.0);
    }

    #[tokio::test]
    async fn read_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.deployment_mode, DeploymentMode::Development);
        assert!(!config.verification.trusted_domains.is_empty());
    }

    #[test]
    fn deployment_override() {
        let base = CatalogConfig::default();
        assert_eq!(
            apply_deployment_override(base.clone(), Some("production")).deployment_mode,
            DeploymentMode::Production
        );
        assert_eq!(
            apply_deployment_override(base.clone(), Some("PROD")).deployment_mode,
            DeploymentMode::Production
        );
        assert_eq!(
            apply_deployment_override(base.clone(), Some("anything-else")).deployment_mode,
            DeploymentMode::Development
        );

        let mut prod = CatalogConfig::default();
        prod.deployment_mode = DeploymentMode::Production;
        assert_eq!(
            apply_deployment_override(prod.clone(), None).deployment_mode,
            DeploymentMode::Production
        );
        assert_eq!(
            apply_deployment_override(prod, Some("  ")).deployment_mode,
            DeploymentMode::Production
        );
    }
}
