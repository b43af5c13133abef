//! Skill management service.
//!
//! Creation, lookup, editing and soft deletion of skills. Statistics are
//! never written here; they belong to the statistics engine.

use learnhub_types::error::{RepositoryError, SkillError};
use learnhub_types::skill::{
    CreateSkillRequest, Skill, SkillId, SkillStatistics, UpdateSkillRequest, slugify,
};

use crate::repository::resource::{FlagFilter, ResourceRepository};
use crate::repository::skill::{SkillFilter, SkillRepository};

fn storage(e: RepositoryError) -> SkillError {
    SkillError::StorageError(e.to_string())
}

/// Service orchestrating the skill lifecycle.
pub struct SkillService<S: SkillRepository, R: ResourceRepository> {
    skill_repo: S,
    resource_repo: R,
}

impl<S: SkillRepository, R: ResourceRepository> SkillService<S, R> {
    pub fn new(skill_repo: S, resource_repo: R) -> Self {
        Self {
            skill_repo,
            resource_repo,
        }
    }

    /// Create a new skill with empty statistics.
    ///
    /// Names are unique (case-insensitive), including names of soft-deleted
    /// skills. The slug gets a numeric suffix if another name slugifies the
    /// same way.
    pub async fn create_skill(&self, request: CreateSkillRequest) -> Result<Skill, SkillError> {
        let name = validate_name(&request.name)?;

        if self
            .skill_repo
            .get_by_name(&name)
            .await
            .map_err(storage)?
            .is_some()
        {
            return Err(SkillError::NameConflict(name));
        }

        let slug = self.ensure_unique_slug(&slugify(&name)).await?;
        let now = chrono::Utc::now();

        let skill = Skill {
            id: SkillId::new(),
            slug,
            description: request.description.unwrap_or_default(),
            category: request.category.unwrap_or_default(),
            resource_ids: Vec::new(),
            statistics: SkillStatistics::default(),
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            name,
        };

        let skill = self.skill_repo.create(&skill).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => SkillError::NameConflict(msg),
            other => storage(other),
        })?;

        tracing::info!(skill = %skill.name, slug = %skill.slug, "Created skill");
        Ok(skill)
    }

    async fn ensure_unique_slug(&self, base_slug: &str) -> Result<String, SkillError> {
        let mut slug = base_slug.to_string();
        let mut counter = 2;

        loop {
            let existing = self.skill_repo.get_by_slug(&slug).await.map_err(storage)?;
            if existing.is_none() {
                return Ok(slug);
            }

            slug = format!("{base_slug}-{counter}");
            counter += 1;

            if counter > 100 {
                return Err(SkillError::NameConflict(format!(
                    "could not generate unique slug from '{base_slug}'"
                )));
            }
        }
    }

    /// Get a skill by ID, including soft-deleted ones.
    pub async fn get_skill(&self, id: &SkillId) -> Result<Skill, SkillError> {
        self.skill_repo
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(SkillError::NotFound)
    }

    pub async fn get_skill_by_slug(&self, slug: &str) -> Result<Skill, SkillError> {
        self.skill_repo
            .get_by_slug(slug)
            .await
            .map_err(storage)?
            .ok_or(SkillError::NotFound)
    }

    /// Resolve a path segment that may be either a slug or a UUID.
    pub async fn resolve_skill(&self, id_or_slug: &str) -> Result<Skill, SkillError> {
        if let Ok(id) = id_or_slug.parse::<SkillId>() {
            return self.get_skill(&id).await;
        }
        self.get_skill_by_slug(id_or_slug).await
    }

    pub async fn list_skills(&self, filter: Option<SkillFilter>) -> Result<Vec<Skill>, SkillError> {
        self.skill_repo.list(filter).await.map_err(storage)
    }

    /// Update name, description or category. The slug stays stable.
    pub async fn update_skill(
        &self,
        id: &SkillId,
        request: UpdateSkillRequest,
    ) -> Result<Skill, SkillError> {
        let mut skill = self.get_skill(id).await?;

        if let Some(name) = request.name {
            let name = validate_name(&name)?;
            if !name.eq_ignore_ascii_case(&skill.name) {
                let clash = self.skill_repo.get_by_name(&name).await.map_err(storage)?;
                if clash.is_some_and(|other| other.id != skill.id) {
                    return Err(SkillError::NameConflict(name));
                }
            }
            skill.name = name;
        }
        if let Some(description) = request.description {
            skill.description = description;
        }
        if let Some(category) = request.category {
            skill.category = category;
        }

        skill.updated_at = chrono::Utc::now();

        self.skill_repo.update(&skill).await.map_err(|e| match e {
            RepositoryError::NotFound => SkillError::NotFound,
            RepositoryError::Conflict(msg) => SkillError::NameConflict(msg),
            other => storage(other),
        })
    }

    /// Soft-delete a skill. Refused while it still owns active resources.
    /// Deleting an already deleted skill is a no-op.
    pub async fn delete_skill(&self, id: &SkillId) -> Result<Skill, SkillError> {
        let mut skill = self.get_skill(id).await?;
        if !skill.is_active {
            return Ok(skill);
        }

        let active = self
            .resource_repo
            .find_by_skill(id, FlagFilter::ACTIVE)
            .await
            .map_err(storage)?;
        if !active.is_empty() {
            return Err(SkillError::HasActiveResources(active.len()));
        }

        let now = chrono::Utc::now();
        skill.is_active = false;
        skill.deleted_at = Some(now);
        skill.updated_at = now;

        let skill = self.skill_repo.update(&skill).await.map_err(storage)?;
        tracing::info!(skill = %skill.name, "Soft-deleted skill");
        Ok(skill)
    }
}

fn validate_name(raw: &str) -> Result<String, SkillError> {
    let name = raw.trim().to_string();
    if name.is_empty() {
        return Err(SkillError::InvalidName("name cannot be empty".to_string()));
    }
    if slugify(&name).is_empty() {
        return Err(SkillError::InvalidName(
            "name must contain at least one alphanumeric character".to_string(),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryResourceRepository, InMemorySkillRepository, make_resource};
    use learnhub_types::resource::LearningType;
    use learnhub_types::skill::SkillCategory;

    fn service() -> (
        SkillService<InMemorySkillRepository, InMemoryResourceRepository>,
        InMemoryResourceRepository,
    ) {
        let resources = InMemoryResourceRepository::default();
        (
            SkillService::new(InMemorySkillRepository::default(), resources.clone()),
            resources,
        )
    }

    fn request(name: &str) -> CreateSkillRequest {
        CreateSkillRequest {
            name: name.to_string(),
            description: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_create_skill_defaults() {
        let (svc, _) = service();
        let skill = svc.create_skill(request("  Web Development ")).await.unwrap();
        assert_eq!(skill.name, "Web Development");
        assert_eq!(skill.slug, "web-development");
        assert_eq!(skill.category, SkillCategory::All);
        assert!(skill.is_active);
        assert_eq!(skill.statistics, SkillStatistics::default());
    }

    #[tokio::test]
    async fn test_create_skill_rejects_blank_and_duplicate_names() {
        let (svc, _) = service();
        assert!(matches!(
            svc.create_skill(request("   ")).await.unwrap_err(),
            SkillError::InvalidName(_)
        ));
        assert!(matches!(
            svc.create_skill(request("!!!")).await.unwrap_err(),
            SkillError::InvalidName(_)
        ));

        svc.create_skill(request("Python")).await.unwrap();
        assert!(matches!(
            svc.create_skill(request("python")).await.unwrap_err(),
            SkillError::NameConflict(_)
        ));
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix() {
        let (svc, _) = service();
        let c = svc.create_skill(request("C")).await.unwrap();
        let cpp = svc.create_skill(request("C++")).await.unwrap();
        assert_eq!(c.slug, "c");
        assert_eq!(cpp.slug, "c-2");
    }

    #[tokio::test]
    async fn test_resolve_by_slug_or_id() {
        let (svc, _) = service();
        let skill = svc.create_skill(request("Data Science")).await.unwrap();
        assert_eq!(svc.resolve_skill("data-science").await.unwrap().id, skill.id);
        assert_eq!(
            svc.resolve_skill(&skill.id.to_string()).await.unwrap().slug,
            "data-science"
        );
        assert!(matches!(
            svc.resolve_skill("nope").await.unwrap_err(),
            SkillError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_update_skill() {
        let (svc, _) = service();
        let skill = svc.create_skill(request("Excel")).await.unwrap();
        svc.create_skill(request("Sheets")).await.unwrap();

        let updated = svc
            .update_skill(
                &skill.id,
                UpdateSkillRequest {
                    name: Some("Excel Basics".to_string()),
                    category: Some(SkillCategory::SeniorCitizens),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Excel Basics");
        assert_eq!(updated.slug, "excel");
        assert_eq!(updated.category, SkillCategory::SeniorCitizens);

        let err = svc
            .update_skill(
                &skill.id,
                UpdateSkillRequest {
                    name: Some("sheets".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::NameConflict(_)));
    }

    #[tokio::test]
    async fn test_delete_refused_with_active_resources() {
        let (svc, resources) = service();
        let skill = svc.create_skill(request("Photography")).await.unwrap();
        let mut unverified = make_resource(&skill.id, LearningType::Free, 3.0);
        unverified.verified = false;
        resources.create(&unverified).await.unwrap();

        let err = svc.delete_skill(&skill.id).await.unwrap_err();
        assert!(matches!(err, SkillError::HasActiveResources(1)));

        let mut inactive = unverified.clone();
        inactive.is_active = false;
        resources.update(&inactive).await.unwrap();

        let deleted = svc.delete_skill(&skill.id).await.unwrap();
        assert!(!deleted.is_active);
        assert!(deleted.deleted_at.is_some());

        // Still retrievable for admins, and deleting again is a no-op.
        assert!(!svc.get_skill(&skill.id).await.unwrap().is_active);
        let again = svc.delete_skill(&skill.id).await.unwrap();
        assert_eq!(again.deleted_at, deleted.deleted_at);
    }

    #[tokio::test]
    async fn test_list_hides_deleted_by_default() {
        let (svc, _) = service();
        let keep = svc.create_skill(request("Yoga")).await.unwrap();
        let gone = svc.create_skill(request("Pilates")).await.unwrap();
        svc.delete_skill(&gone.id).await.unwrap();

        let listed = svc.list_skills(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);

        let all = svc
            .list_skills(Some(SkillFilter {
                include_deleted: true,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
