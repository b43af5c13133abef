//! Skill repository trait definition.

use learnhub_types::error::RepositoryError;
use learnhub_types::resource::ResourceId;
use learnhub_types::skill::{Skill, SkillCategory, SkillId, SkillStatistics};

use super::SortOrder;

/// Filter criteria for listing skills.
#[derive(Debug, Clone, Default)]
pub struct SkillFilter {
    pub category: Option<SkillCategory>,
    /// Include soft-deleted skills.
    pub include_deleted: bool,
    /// Field to sort by (e.g., "name", "created_at", "popularity_score").
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository trait for skill persistence.
///
/// Implementations live in learnhub-infra (e.g., SqliteSkillRepository).
pub trait SkillRepository: Send + Sync {
    /// Create a new skill. Returns `Conflict` if the name or slug is taken.
    fn create(
        &self,
        skill: &Skill,
    ) -> impl std::future::Future<Output = Result<Skill, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &SkillId,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    /// Case-insensitive lookup by display name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    fn get_by_slug(
        &self,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    fn list(
        &self,
        filter: Option<SkillFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<Skill>, RepositoryError>> + Send;

    /// Persist an existing skill's editable fields.
    /// Membership and statistics are left alone; only `add_member`,
    /// `remove_member` and `update_statistics` write them.
    fn update(
        &self,
        skill: &Skill,
    ) -> impl std::future::Future<Output = Result<Skill, RepositoryError>> + Send;

    /// Overwrite only the cached statistics of a skill.
    fn update_statistics(
        &self,
        id: &SkillId,
        statistics: &SkillStatistics,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a resource to the membership list in one atomic write.
    /// Returns `false` when it was already a member.
    fn add_member(
        &self,
        id: &SkillId,
        resource_id: &ResourceId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Drop a resource from the membership list in one atomic write.
    /// Returns `false` when it was not a member.
    fn remove_member(
        &self,
        id: &SkillId,
        resource_id: &ResourceId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
