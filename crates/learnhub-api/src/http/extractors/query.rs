//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use learnhub_core::repository::SortOrder;
use learnhub_core::repository::resource::{FlagFilter, ResourceFilter};
use learnhub_core::repository::skill::SkillFilter;
use learnhub_types::resource::{LearningType, ResourceType};
use learnhub_types::skill::{SkillCategory, SkillId};

use crate::http::error::AppError;

/// Query parameters for the skill list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct SkillListQuery {
    /// Filter by audience category.
    pub category: Option<String>,
    /// Include soft-deleted skills.
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default = "default_sort")]
    pub sort: String,
    /// Sort order (asc, desc).
    #[serde(default = "default_order")]
    pub order: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SkillListQuery {
    pub fn into_filter(self) -> Result<SkillFilter, AppError> {
        Ok(SkillFilter {
            category: parse(self.category)?,
            include_deleted: self.include_deleted,
            sort_by: Some(self.sort),
            sort_order: Some(sort_order(&self.order)),
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Query parameters for the resource list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct ResourceListQuery {
    /// Owning skill ID.
    pub skill_id: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    /// Access model (free, premium, freemium).
    pub access: Option<String>,
    pub active: Option<bool>,
    pub verified: Option<bool>,
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ResourceListQuery {
    pub fn into_filter(self) -> Result<ResourceFilter, AppError> {
        let skill_id = self
            .skill_id
            .map(|s| {
                s.parse::<SkillId>()
                    .map_err(|_| AppError::Validation(format!("invalid skill_id: '{s}'")))
            })
            .transpose()?;

        Ok(ResourceFilter {
            skill_id,
            category: parse::<SkillCategory>(self.category)?,
            resource_type: parse::<ResourceType>(self.resource_type)?,
            learning_type: parse::<LearningType>(self.access)?,
            flags: FlagFilter {
                active: self.active,
                verified: self.verified,
            },
            include_deleted: self.include_deleted,
            sort_by: Some(self.sort),
            sort_order: Some(sort_order(&self.order)),
            limit: self.limit,
            offset: self.offset,
        })
    }

    /// The learner-facing variant: flags are forced to active+verified and
    /// deleted rows are never included.
    pub fn into_public_filter(self) -> Result<ResourceFilter, AppError> {
        let mut filter = self.into_filter()?;
        filter.flags = FlagFilter::PUBLIC;
        filter.include_deleted = false;
        Ok(filter)
    }
}

fn parse<T>(raw: Option<String>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    raw.map(|v| v.parse::<T>().map_err(AppError::Validation))
        .transpose()
}

fn sort_order(raw: &str) -> SortOrder {
    match raw.to_lowercase().as_str() {
        "asc" => SortOrder::Asc,
        _ => SortOrder::Desc,
    }
}

fn default_sort() -> String {
    "created_at".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}
