use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::skill::{SkillCategory, SkillId};

/// Highest rating a resource can carry.
pub const MAX_RATING: f64 = 5.0;

/// Unique identifier for a resource, wrapping a UUID v7.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub Uuid);

impl ResourceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A single external learning item (video, course, article).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Owning skill (exactly one).
    pub skill_id: SkillId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: SkillCategory,
    pub resource_type: ResourceType,
    pub learning_type: LearningType,
    /// Weighted running average, always within `0.0..=5.0`.
    pub rating: f64,
    /// Number of ratings folded into `rating`. Never decreases.
    pub ratings_count: u32,
    /// Learners enrolled, when the source platform reports it.
    pub enrollment_count: Option<u64>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    /// Last verification warning shown to admins.
    pub verification_error: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Fold a new score into the running average.
    ///
    /// Returns `None` (leaving the resource untouched) if the score is not
    /// within `0.0..=5.0`.
    pub fn apply_rating(&mut self, score: f64) -> Option<f64> {
        if !is_valid_rating(score) {
            return None;
        }
        let count = f64::from(self.ratings_count);
        let updated = (self.rating * count + score) / (count + 1.0);
        self.rating = updated.clamp(0.0, MAX_RATING);
        self.ratings_count = self.ratings_count.saturating_add(1);
        Some(self.rating)
    }

    /// Whether end users may see this resource.
    pub fn is_public(&self) -> bool {
        self.is_active && self.verified
    }
}

pub fn is_valid_rating(score: f64) -> bool {
    score.is_finite() && (0.0..=MAX_RATING).contains(&score)
}

/// Content-source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Youtube,
    Coursera,
    Udemy,
    Edx,
    KhanAcademy,
    LinkedinLearning,
    Documentation,
    Article,
    Blog,
    Podcast,
    Book,
    Course,
    Other,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Youtube => "youtube",
            ResourceType::Coursera => "coursera",
            ResourceType::Udemy => "udemy",
            ResourceType::Edx => "edx",
            ResourceType::KhanAcademy => "khan_academy",
            ResourceType::LinkedinLearning => "linkedin_learning",
            ResourceType::Documentation => "documentation",
            ResourceType::Article => "article",
            ResourceType::Blog => "blog",
            ResourceType::Podcast => "podcast",
            ResourceType::Book => "book",
            ResourceType::Course => "course",
            ResourceType::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "youtube" => Ok(ResourceType::Youtube),
            "coursera" => Ok(ResourceType::Coursera),
            "udemy" => Ok(ResourceType::Udemy),
            "edx" => Ok(ResourceType::Edx),
            "khan_academy" => Ok(ResourceType::KhanAcademy),
            "linkedin_learning" => Ok(ResourceType::LinkedinLearning),
            "documentation" | "docs" => Ok(ResourceType::Documentation),
            "article" => Ok(ResourceType::Article),
            "blog" => Ok(ResourceType::Blog),
            "podcast" => Ok(ResourceType::Podcast),
            "book" => Ok(ResourceType::Book),
            "course" => Ok(ResourceType::Course),
            "other" => Ok(ResourceType::Other),
            other => Err(format!("invalid resource type: '{other}'")),
        }
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType::Other
    }
}

/// Pricing model of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningType {
    Free,
    Premium,
    Freemium,
}

impl fmt::Display for LearningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningType::Free => write!(f, "free"),
            LearningType::Premium => write!(f, "premium"),
            LearningType::Freemium => write!(f, "freemium"),
        }
    }
}

impl FromStr for LearningType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(LearningType::Free),
            "premium" | "paid" => Ok(LearningType::Premium),
            "freemium" => Ok(LearningType::Freemium),
            other => Err(format!("invalid learning type: '{other}'")),
        }
    }
}

impl Default for LearningType {
    fn default() -> Self {
        LearningType::Free
    }
}

/// Request to add a resource to a skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceRequest {
    pub skill_id: SkillId,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    /// Defaults to the owning skill's category.
    pub category: Option<SkillCategory>,
    pub resource_type: Option<ResourceType>,
    pub learning_type: Option<LearningType>,
    /// Initial rating seeded by the curator.
    pub rating: Option<f64>,
    pub enrollment_count: Option<u64>,
    pub tags: Option<Vec<String>>,
}

/// Partial update of a resource. Changing `url` re-triggers verification,
/// changing `skill_id` transfers ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateResourceRequest {
    pub skill_id: Option<SkillId>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub category: Option<SkillCategory>,
    pub resource_type: Option<ResourceType>,
    pub learning_type: Option<LearningType>,
    pub enrollment_count: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
