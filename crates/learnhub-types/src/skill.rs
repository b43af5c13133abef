use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::resource::ResourceId;

/// Unique identifier for a skill, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillId(pub Uuid);

impl SkillId {
    /// Create a new SkillId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SkillId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SkillId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A named topic grouping learning resources for an audience.
///
/// The skill owns the *membership* list of its resources, not their
/// lifecycle. `statistics` is a cached projection over the active and
/// verified members and is only ever written by the statistics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    /// Unique display name.
    pub name: String,
    /// URL-safe unique slug derived from name ("Web Development" -> "web-development").
    pub slug: String,
    pub description: String,
    /// Target audience.
    pub category: SkillCategory,
    /// Ordered membership list, never contains duplicates.
    pub resource_ids: Vec<ResourceId>,
    pub statistics: SkillStatistics,
    /// False once soft-deleted.
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Skill {
    /// Add a resource to the membership list. Returns false if it was already present.
    pub fn add_resource(&mut self, id: &ResourceId) -> bool {
        if self.resource_ids.contains(id) {
            return false;
        }
        self.resource_ids.push(id.clone());
        true
    }

    /// Remove a resource from the membership list. Returns false if it was absent.
    pub fn remove_resource(&mut self, id: &ResourceId) -> bool {
        let before = self.resource_ids.len();
        self.resource_ids.retain(|r| r != id);
        self.resource_ids.len() != before
    }
}

/// Aggregate counters cached on a skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillStatistics {
    pub total_resources: u32,
    pub free_resources: u32,
    pub premium_resources: u32,
    pub average_rating: f64,
    pub total_learners: u64,
    pub popularity_score: f64,
}

/// Audience categories for skills and resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Children,
    Students,
    SeniorCitizens,
    Professionals,
    All,
}

impl SkillCategory {
    pub const ALL_VARIANTS: [SkillCategory; 5] = [
        SkillCategory::Children,
        SkillCategory::Students,
        SkillCategory::SeniorCitizens,
        SkillCategory::Professionals,
        SkillCategory::All,
    ];
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillCategory::Children => write!(f, "children"),
            SkillCategory::Students => write!(f, "students"),
            SkillCategory::SeniorCitizens => write!(f, "senior_citizens"),
            SkillCategory::Professionals => write!(f, "professionals"),
            SkillCategory::All => write!(f, "all"),
        }
    }
}

impl FromStr for SkillCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "children" => Ok(SkillCategory::Children),
            "students" => Ok(SkillCategory::Students),
            "senior_citizens" => Ok(SkillCategory::SeniorCitizens),
            "professionals" => Ok(SkillCategory::Professionals),
            "all" => Ok(SkillCategory::All),
            other => Err(format!("invalid skill category: '{other}'")),
        }
    }
}

impl Default for SkillCategory {
    fn default() -> Self {
        SkillCategory::All
    }
}

/// Request to create a new skill. Only `name` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<SkillCategory>,
}

/// Partial update of a skill's editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSkillRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<SkillCategory>,
}

/// Generate a URL-safe slug from a display name.
///
/// Lowercases, replaces non-alphanumeric characters with hyphens, collapses
/// runs of hyphens and trims them from both ends.
///
/// ```
/// use learnhub_types::skill::slugify;
///
/// assert_eq!(slugify("Web Development"), "web-development");
/// assert_eq!(slugify("C++  for Kids!"), "c-for-kids");
/// ```
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_hyphen = true;
    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}
