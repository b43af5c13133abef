//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/probe traits, but AppState pins them
//! to the concrete infra implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use learnhub_core::service::resource::ResourceService;
use learnhub_core::service::skill::SkillService;
use learnhub_core::service::verifier::TrustVerifier;
use learnhub_infra::config::{load_catalog_config, resolve_data_dir};
use learnhub_infra::probe::ReqwestUrlProbe;
use learnhub_infra::sqlite::pool::{DatabasePool, database_url};
use learnhub_infra::sqlite::resource::SqliteResourceRepository;
use learnhub_infra::sqlite::skill::SqliteSkillRepository;
use learnhub_types::config::CatalogConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteSkillService = SkillService<SqliteSkillRepository, SqliteResourceRepository>;

pub type ConcreteResourceService =
    ResourceService<SqliteSkillRepository, SqliteResourceRepository, ReqwestUrlProbe>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub skill_service: Arc<ConcreteSkillService>,
    pub resource_service: Arc<ConcreteResourceService>,
    pub config: Arc<CatalogConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state from the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_catalog_config(&data_dir).await;
        Self::open(&data_dir, config).await
    }

    /// Connect to `{data_dir}/learnhub.db` and wire services with `config`.
    pub async fn open(data_dir: &Path, config: CatalogConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let db_url = format!("{}?mode=rwc", database_url(data_dir));
        let db_pool = DatabasePool::new(&db_url).await?;

        let skill_repo = SqliteSkillRepository::new(db_pool.clone());
        let resource_repo = SqliteResourceRepository::new(db_pool.clone());

        let probe = ReqwestUrlProbe::new(
            config.deployment_mode,
            &config.verification.user_agent,
        )?;
        let verifier = TrustVerifier::from_config(&config.verification, probe);

        let resource_service = ResourceService::new(
            skill_repo.clone(),
            resource_repo.clone(),
            config.popularity.clone(),
            verifier,
        );
        let skill_service = SkillService::new(skill_repo, resource_repo);

        tracing::debug!(
            data_dir = %data_dir.display(),
            mode = %config.deployment_mode,
            trusted_domains = config.verification.trusted_domains.len(),
            "Application state ready"
        );

        Ok(Self {
            skill_service: Arc::new(skill_service),
            resource_service: Arc::new(resource_service),
            config: Arc::new(config),
            data_dir: data_dir.to_path_buf(),
            db_pool,
        })
    }
}
