//! Resource repository trait definition.

use learnhub_types::error::RepositoryError;
use learnhub_types::resource::{LearningType, Resource, ResourceId, ResourceType};
use learnhub_types::skill::{SkillCategory, SkillId};

use super::SortOrder;

/// Activity/verification flag constraints. `None` means "either".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagFilter {
    pub active: Option<bool>,
    pub verified: Option<bool>,
}

impl FlagFilter {
    /// Resources visible to end users.
    pub const PUBLIC: FlagFilter = FlagFilter {
        active: Some(true),
        verified: Some(true),
    };

    pub const ACTIVE: FlagFilter = FlagFilter {
        active: Some(true),
        verified: None,
    };

    pub const ANY: FlagFilter = FlagFilter {
        active: None,
        verified: None,
    };

    pub fn matches(&self, resource: &Resource) -> bool {
        self.active.is_none_or(|a| resource.is_active == a)
            && self.verified.is_none_or(|v| resource.verified == v)
    }
}

/// Filter criteria for listing resources.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub skill_id: Option<SkillId>,
    pub category: Option<SkillCategory>,
    pub resource_type: Option<ResourceType>,
    pub learning_type: Option<LearningType>,
    pub flags: FlagFilter,
    /// Include soft-deleted resources.
    pub include_deleted: bool,
    /// Field to sort by (e.g., "created_at", "title", "rating").
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ResourceFilter {
    /// End-user listing: active and verified only.
    pub fn public() -> Self {
        Self {
            flags: FlagFilter::PUBLIC,
            ..Default::default()
        }
    }
}

/// Repository trait for resource persistence.
pub trait ResourceRepository: Send + Sync {
    fn create(
        &self,
        resource: &Resource,
    ) -> impl std::future::Future<Output = Result<Resource, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &ResourceId,
    ) -> impl std::future::Future<Output = Result<Option<Resource>, RepositoryError>> + Send;

    fn list(
        &self,
        filter: Option<ResourceFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<Resource>, RepositoryError>> + Send;

    /// All resources owned by a skill matching `flags`, in creation order.
    fn find_by_skill(
        &self,
        skill_id: &SkillId,
        flags: FlagFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Resource>, RepositoryError>> + Send;

    fn update(
        &self,
        resource: &Resource,
    ) -> impl std::future::Future<Output = Result<Resource, RepositoryError>> + Send;
}
