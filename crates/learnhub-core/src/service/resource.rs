//! Resource management service.
//!
//! Every mutation here that can change a skill's statistics inputs ends by
//! asking the statistics engine to refresh the affected skill(s). URL
//! verification never blocks a mutation: a failed check is stored on the
//! resource and surfaced as a warning.
//!
//! Two verification policies coexist:
//! - create/update: sticky. A failed re-check after a URL edit records the
//!   error but never flips an already verified resource back to unverified.
//! - explicit re-verify (`verify_resource`, `reverify_all`): authoritative.
//!   The fresh outcome overwrites the stored flag, so it can demote.

use std::collections::HashSet;

use serde::Serialize;
use url::Url;

use learnhub_types::error::{RepositoryError, ResourceError};
use learnhub_types::resource::{
    CreateResourceRequest, Resource, ResourceId, ResourceType, UpdateResourceRequest,
    is_valid_rating,
};
use learnhub_types::skill::{Skill, SkillId};
use learnhub_types::verification::{UrlCheck, VerificationDecision};

use crate::repository::resource::{ResourceFilter, ResourceRepository};
use crate::repository::skill::SkillRepository;
use crate::service::probe::UrlProbe;
use crate::service::statistics::StatisticsEngine;
use crate::service::verifier::{TrustVerifier, canonical_url};

fn storage(e: RepositoryError) -> ResourceError {
    ResourceError::StorageError(e.to_string())
}

/// Result of a mutation that ran a verification decision.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceOutcome {
    pub resource: Resource,
    /// The decision taken during this call, if one was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<VerificationDecision>,
    /// Human-readable warning for admins when verification failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ResourceOutcome {
    fn new(resource: Resource, decision: Option<VerificationDecision>) -> Self {
        let warning = decision
            .as_ref()
            .filter(|d| !d.verified)
            .map(|d| match &d.error {
                Some(error) => format!("URL verification failed: {error}"),
                None => "URL verification failed".to_string(),
            });
        Self {
            resource,
            decision,
            warning,
        }
    }
}

/// Per-item result of a bulk operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<ResourceId>,
    pub failed: Vec<(ResourceId, String)>,
}

/// Summary of a re-verification sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub checked: usize,
    pub verified: usize,
    /// Previously unverified, now verified.
    pub promoted: usize,
    /// Previously verified, now unverified.
    pub demoted: usize,
    pub failures: Vec<(ResourceId, String)>,
}

/// Guess the content source from the URL host.
pub fn infer_resource_type(url: &str) -> ResourceType {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
    else {
        return ResourceType::Other;
    };

    let table = [
        ("youtube.com", ResourceType::Youtube),
        ("youtu.be", ResourceType::Youtube),
        ("coursera.org", ResourceType::Coursera),
        ("udemy.com", ResourceType::Udemy),
        ("edx.org", ResourceType::Edx),
        ("khanacademy.org", ResourceType::KhanAcademy),
        ("linkedin.com", ResourceType::LinkedinLearning),
        ("medium.com", ResourceType::Blog),
        ("dev.to", ResourceType::Blog),
    ];
    for (domain, kind) in table {
        if host == domain || host.ends_with(&format!(".{domain}")) {
            return kind;
        }
    }
    if host.starts_with("docs.") || host.starts_with("developer.") {
        return ResourceType::Documentation;
    }
    ResourceType::Other
}

fn validate_title(raw: &str) -> Result<String, ResourceError> {
    let title = raw.trim().to_string();
    if title.is_empty() {
        return Err(ResourceError::InvalidTitle(
            "title cannot be empty".to_string(),
        ));
    }
    Ok(title)
}

/// Service orchestrating resource CRUD, verification and ownership.
pub struct ResourceService<S: SkillRepository, R: ResourceRepository, P: UrlProbe> {
    skill_repo: S,
    resource_repo: R,
    stats: StatisticsEngine<S, R>,
    verifier: TrustVerifier<P>,
}

impl<S, R, P> ResourceService<S, R, P>
where
    S: SkillRepository + Clone,
    R: ResourceRepository + Clone,
    P: UrlProbe,
{
    pub fn new(
        skill_repo: S,
        resource_repo: R,
        weights: learnhub_types::config::PopularityWeights,
        verifier: TrustVerifier<P>,
    ) -> Self {
        let stats = StatisticsEngine::new(skill_repo.clone(), resource_repo.clone(), weights);
        Self {
            skill_repo,
            resource_repo,
            stats,
            verifier,
        }
    }
}

impl<S: SkillRepository, R: ResourceRepository, P: UrlProbe> ResourceService<S, R, P> {
    pub fn stats(&self) -> &StatisticsEngine<S, R> {
        &self.stats
    }

    pub fn verifier(&self) -> &TrustVerifier<P> {
        &self.verifier
    }

    async fn active_skill(&self, id: &SkillId) -> Result<Skill, ResourceError> {
        self.skill_repo
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|s| s.is_active)
            .ok_or(ResourceError::SkillNotFound)
    }

    /// Load a resource that has not been soft-deleted.
    async fn live_resource(&self, id: &ResourceId) -> Result<Resource, ResourceError> {
        self.resource_repo
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|r| r.deleted_at.is_none())
            .ok_or(ResourceError::NotFound)
    }

    async fn refresh(&self, skill_id: &SkillId) -> Result<(), ResourceError> {
        self.stats.refresh_statistics(skill_id).await?;
        Ok(())
    }

    /// Add a resource to an active skill.
    ///
    /// The URL is verified before the row is written, but an unreachable URL
    /// still produces a resource (unverified, hidden from end users) plus a
    /// warning.
    pub async fn create_resource(
        &self,
        request: CreateResourceRequest,
    ) -> Result<ResourceOutcome, ResourceError> {
        let title = validate_title(&request.title)?;
        if let Some(rating) = request.rating.filter(|r| !is_valid_rating(*r)) {
            return Err(ResourceError::InvalidRating(rating));
        }

        let skill = self.active_skill(&request.skill_id).await?;

        let url = canonical_url(&request.url);
        let decision = self.verifier.decide_verification(&url).await;
        let now = chrono::Utc::now();

        let resource = Resource {
            id: ResourceId::new(),
            skill_id: skill.id.clone(),
            title,
            description: request.description.unwrap_or_default(),
            category: request.category.unwrap_or(skill.category),
            resource_type: request
                .resource_type
                .unwrap_or_else(|| infer_resource_type(&url)),
            learning_type: request.learning_type.unwrap_or_default(),
            rating: request.rating.unwrap_or(0.0),
            ratings_count: u32::from(request.rating.is_some()),
            enrollment_count: request.enrollment_count,
            verified: decision.verified,
            verified_at: decision.verified.then_some(now),
            verification_error: decision.error.clone(),
            is_active: true,
            deleted_at: None,
            tags: request.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            url,
        };

        let resource = self.resource_repo.create(&resource).await.map_err(storage)?;

        self.skill_repo
            .add_member(&skill.id, &resource.id)
            .await
            .map_err(storage)?;
        self.refresh(&skill.id).await?;

        if decision.verified {
            tracing::info!(
                resource_id = %resource.id,
                skill = %skill.name,
                method = %decision.method,
                "Created verified resource"
            );
        } else {
            tracing::warn!(
                resource_id = %resource.id,
                skill = %skill.name,
                url = %resource.url,
                error = ?decision.error,
                "Created resource with failed URL verification"
            );
        }

        Ok(ResourceOutcome::new(resource, Some(decision)))
    }

    /// Get a resource by ID, including soft-deleted ones.
    pub async fn get_resource(&self, id: &ResourceId) -> Result<Resource, ResourceError> {
        self.resource_repo
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(ResourceError::NotFound)
    }

    pub async fn list_resources(
        &self,
        filter: Option<ResourceFilter>,
    ) -> Result<Vec<Resource>, ResourceError> {
        self.resource_repo.list(filter).await.map_err(storage)
    }

    /// Apply a partial update.
    ///
    /// A changed URL is re-decided with sticky semantics. A changed
    /// `skill_id` transfers ownership and refreshes both skills.
    pub async fn update_resource(
        &self,
        id: &ResourceId,
        request: UpdateResourceRequest,
    ) -> Result<ResourceOutcome, ResourceError> {
        let mut resource = self.live_resource(id).await?;

        let new_owner = match request.skill_id {
            Some(skill_id) if skill_id != resource.skill_id => {
                self.active_skill(&skill_id).await?;
                Some(skill_id)
            }
            _ => None,
        };

        if let Some(title) = request.title {
            resource.title = validate_title(&title)?;
        }
        if let Some(description) = request.description {
            resource.description = description;
        }
        if let Some(category) = request.category {
            resource.category = category;
        }
        if let Some(resource_type) = request.resource_type {
            resource.resource_type = resource_type;
        }
        if let Some(learning_type) = request.learning_type {
            resource.learning_type = learning_type;
        }
        if let Some(enrollment_count) = request.enrollment_count {
            resource.enrollment_count = Some(enrollment_count);
        }
        if let Some(tags) = request.tags {
            resource.tags = tags;
        }
        if let Some(is_active) = request.is_active {
            resource.is_active = is_active;
        }

        let now = chrono::Utc::now();
        let mut decision = None;
        if let Some(raw) = request.url {
            let url = canonical_url(&raw);
            if url != resource.url {
                let decided = self.verifier.decide_verification(&url).await;
                resource.url = url;
                if decided.verified {
                    resource.verified = true;
                    resource.verified_at = Some(now);
                    resource.verification_error = None;
                } else {
                    // Sticky: keep the existing flag, record the warning.
                    resource.verification_error = decided.error.clone();
                }
                decision = Some(decided);
            }
        }

        resource.updated_at = now;
        let mut resource = self.resource_repo.update(&resource).await.map_err(|e| match e {
            RepositoryError::NotFound => ResourceError::NotFound,
            other => storage(other),
        })?;

        match new_owner {
            Some(to) => {
                let from = resource.skill_id.clone();
                self.stats.move_resource(id, &from, &to).await?;
                resource = self.get_resource(id).await?;
            }
            None => self.refresh(&resource.skill_id).await?,
        }

        Ok(ResourceOutcome::new(resource, decision))
    }

    /// Soft-delete without refreshing; returns the owner when something changed.
    async fn soft_delete(&self, id: &ResourceId) -> Result<Option<SkillId>, ResourceError> {
        let mut resource = self.get_resource(id).await?;
        if resource.deleted_at.is_some() {
            return Ok(None);
        }

        let now = chrono::Utc::now();
        resource.is_active = false;
        resource.deleted_at = Some(now);
        resource.updated_at = now;
        self.resource_repo.update(&resource).await.map_err(storage)?;

        match self.skill_repo.remove_member(&resource.skill_id, id).await {
            Ok(_) | Err(RepositoryError::NotFound) => {}
            Err(e) => return Err(storage(e)),
        }

        tracing::info!(resource_id = %id, skill_id = %resource.skill_id, "Soft-deleted resource");
        Ok(Some(resource.skill_id))
    }

    /// Soft-delete a resource and drop it from its skill. Deleting twice is a no-op.
    pub async fn delete_resource(&self, id: &ResourceId) -> Result<Resource, ResourceError> {
        if let Some(skill_id) = self.soft_delete(id).await? {
            self.refresh(&skill_id).await?;
        }
        self.get_resource(id).await
    }

    /// Toggle without refreshing; returns the owner when the flag changed.
    async fn toggle_active(
        &self,
        id: &ResourceId,
        active: bool,
    ) -> Result<Option<SkillId>, ResourceError> {
        let mut resource = self.live_resource(id).await?;
        if resource.is_active == active {
            return Ok(None);
        }
        resource.is_active = active;
        resource.updated_at = chrono::Utc::now();
        self.resource_repo.update(&resource).await.map_err(storage)?;
        Ok(Some(resource.skill_id))
    }

    pub async fn set_resource_active(
        &self,
        id: &ResourceId,
        active: bool,
    ) -> Result<Resource, ResourceError> {
        if let Some(skill_id) = self.toggle_active(id, active).await? {
            self.refresh(&skill_id).await?;
        }
        self.get_resource(id).await
    }

    /// Fold a learner rating into the resource's weighted average.
    pub async fn rate_resource(
        &self,
        id: &ResourceId,
        score: f64,
    ) -> Result<Resource, ResourceError> {
        let mut resource = self.live_resource(id).await?;
        resource
            .apply_rating(score)
            .ok_or(ResourceError::InvalidRating(score))?;
        resource.updated_at = chrono::Utc::now();

        let resource = self.resource_repo.update(&resource).await.map_err(storage)?;
        self.refresh(&resource.skill_id).await?;

        tracing::debug!(
            resource_id = %id,
            rating = resource.rating,
            ratings_count = resource.ratings_count,
            "Recorded rating"
        );
        Ok(resource)
    }

    /// Explicit re-verification. The fresh outcome overwrites the stored flag.
    pub async fn verify_resource(&self, id: &ResourceId) -> Result<ResourceOutcome, ResourceError> {
        let mut resource = self.live_resource(id).await?;
        let decision = self.verifier.decide_verification(&resource.url).await;

        let was_verified = resource.verified;
        apply_authoritative(&mut resource, &decision);

        let resource = self.resource_repo.update(&resource).await.map_err(storage)?;
        self.refresh(&resource.skill_id).await?;

        if was_verified && !resource.verified {
            tracing::warn!(resource_id = %id, error = ?decision.error, "Resource demoted after re-verification");
        }
        Ok(ResourceOutcome::new(resource, Some(decision)))
    }

    /// Transfer a resource to another active skill.
    pub async fn move_resource(
        &self,
        id: &ResourceId,
        to: &SkillId,
    ) -> Result<Resource, ResourceError> {
        let resource = self.live_resource(id).await?;
        self.active_skill(to).await?;
        self.stats.move_resource(id, &resource.skill_id, to).await?;
        self.get_resource(id).await
    }

    pub async fn bulk_delete(&self, ids: &[ResourceId]) -> Result<BulkOutcome, ResourceError> {
        let mut outcome = BulkOutcome::default();
        let mut touched = Vec::new();
        for id in ids {
            match self.soft_delete(id).await {
                Ok(owner) => {
                    touched.extend(owner);
                    outcome.succeeded.push(id.clone());
                }
                Err(e) => outcome.failed.push((id.clone(), e.to_string())),
            }
        }
        self.stats.refresh_skills(&touched).await?;
        Ok(outcome)
    }

    pub async fn bulk_set_active(
        &self,
        ids: &[ResourceId],
        active: bool,
    ) -> Result<BulkOutcome, ResourceError> {
        let mut outcome = BulkOutcome::default();
        let mut touched = Vec::new();
        for id in ids {
            match self.toggle_active(id, active).await {
                Ok(owner) => {
                    touched.extend(owner);
                    outcome.succeeded.push(id.clone());
                }
                Err(e) => outcome.failed.push((id.clone(), e.to_string())),
            }
        }
        self.stats.refresh_skills(&touched).await?;
        Ok(outcome)
    }

    /// Re-verify every non-deleted resource matching `filter`.
    ///
    /// Trusted-platform URLs are accepted without probing; the rest go
    /// through `verify_many`. Each skill whose public subset changed is
    /// refreshed once.
    pub async fn reverify_all(
        &self,
        filter: Option<ResourceFilter>,
    ) -> Result<SweepReport, ResourceError> {
        let mut filter = filter.unwrap_or_default();
        filter.include_deleted = false;
        let resources = self.resource_repo.list(Some(filter)).await.map_err(storage)?;

        let (trusted, to_probe): (Vec<Resource>, Vec<Resource>) = resources
            .into_iter()
            .partition(|r| self.verifier.is_known_authentic_platform(&r.url));

        let urls: Vec<String> = to_probe.iter().map(|r| r.url.clone()).collect();
        let checks = self.verifier.verify_many(&urls).await;

        let decided = trusted
            .into_iter()
            .map(|r| (r, VerificationDecision::allow_listed()))
            .chain(
                to_probe
                    .into_iter()
                    .zip(checks)
                    .map(|(r, (_, check)): (Resource, (String, UrlCheck))| {
                        (r, VerificationDecision::from_check(check))
                    }),
            );

        let mut report = SweepReport::default();
        let mut touched = Vec::new();
        for (mut resource, decision) in decided {
            report.checked += 1;
            let was_verified = resource.verified;
            let previous_error = resource.verification_error.clone();
            apply_authoritative(&mut resource, &decision);

            if decision.verified {
                report.verified += 1;
            } else {
                report.failures.push((
                    resource.id.clone(),
                    decision.error.clone().unwrap_or_default(),
                ));
            }
            match (was_verified, resource.verified) {
                (false, true) => report.promoted += 1,
                (true, false) => report.demoted += 1,
                _ => {}
            }

            let flag_changed = was_verified != resource.verified;
            if flag_changed || previous_error != resource.verification_error || resource.verified {
                self.resource_repo.update(&resource).await.map_err(storage)?;
            }
            if flag_changed {
                touched.push(resource.skill_id.clone());
            }
        }

        let unique: HashSet<&SkillId> = touched.iter().collect();
        tracing::info!(
            checked = report.checked,
            verified = report.verified,
            promoted = report.promoted,
            demoted = report.demoted,
            skills = unique.len(),
            "Re-verification sweep finished"
        );

        self.stats.refresh_skills(&touched).await?;
        Ok(report)
    }
}

fn apply_authoritative(resource: &mut Resource, decision: &VerificationDecision) {
    let now = chrono::Utc::now();
    resource.verified = decision.verified;
    resource.verification_error = decision.error.clone();
    if decision.verified {
        resource.verified_at = Some(now);
    }
    resource.updated_at = now;
}
