//! Catalog statistics engine.
//!
//! Recomputes a skill's cached `statistics` from the authoritative resource
//! rows. Pull-based: callers invoke `refresh_statistics` after every mutation
//! that could change its inputs (membership, `is_active`, `verified`,
//! `rating`, `learning_type`). Recomputation is deterministic, so running it
//! twice over the same resources yields identical numbers.

use std::collections::HashSet;

use learnhub_types::config::PopularityWeights;
use learnhub_types::error::{RepositoryError, ResourceError, SkillError};
use learnhub_types::resource::{LearningType, Resource, ResourceId};
use learnhub_types::skill::{SkillId, SkillStatistics};

use crate::repository::resource::{FlagFilter, ResourceRepository};
use crate::repository::skill::SkillRepository;

/// Project statistics over the public (active and verified) subset of `resources`.
pub fn compute_statistics(resources: &[Resource], weights: &PopularityWeights) -> SkillStatistics {
    let mut total: u32 = 0;
    let mut free: u32 = 0;
    let mut premium: u32 = 0;
    let mut rating_sum = 0.0_f64;
    let mut learners: u64 = 0;

    for resource in resources.iter().filter(|r| r.is_public()) {
        total += 1;
        match resource.learning_type {
            LearningType::Free => free += 1,
            LearningType::Premium => premium += 1,
            LearningType::Freemium => {}
        }
        rating_sum += resource.rating;
        learners = learners.saturating_add(resource.enrollment_count.unwrap_or(0));
    }

    let average_rating = if total == 0 {
        0.0
    } else {
        rating_sum / f64::from(total)
    };

    SkillStatistics {
        total_resources: total,
        free_resources: free,
        premium_resources: premium,
        average_rating,
        total_learners: learners,
        popularity_score: weights.score(total, average_rating, learners),
    }
}

fn storage(e: RepositoryError) -> SkillError {
    SkillError::StorageError(e.to_string())
}

/// Keeps skill statistics consistent with their resources.
pub struct StatisticsEngine<S: SkillRepository, R: ResourceRepository> {
    skill_repo: S,
    resource_repo: R,
    weights: PopularityWeights,
}

impl<S: SkillRepository, R: ResourceRepository> StatisticsEngine<S, R> {
    pub fn new(skill_repo: S, resource_repo: R, weights: PopularityWeights) -> Self {
        Self {
            skill_repo,
            resource_repo,
            weights,
        }
    }

    pub fn weights(&self) -> &PopularityWeights {
        &self.weights
    }

    /// Recompute and persist a skill's statistics.
    ///
    /// Safe on any existing skill, including one with no resources. The only
    /// failure besides storage errors is `SkillError::NotFound`.
    pub async fn refresh_statistics(&self, skill_id: &SkillId) -> Result<SkillStatistics, SkillError> {
        let skill = self
            .skill_repo
            .get_by_id(skill_id)
            .await
            .map_err(storage)?
            .ok_or(SkillError::NotFound)?;

        let resources = self
            .resource_repo
            .find_by_skill(skill_id, FlagFilter::PUBLIC)
            .await
            .map_err(storage)?;

        let statistics = compute_statistics(&resources, &self.weights);

        self.skill_repo
            .update_statistics(skill_id, &statistics)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => SkillError::NotFound,
                other => storage(other),
            })?;

        tracing::debug!(
            skill = %skill.name,
            skill_id = %skill_id,
            total = statistics.total_resources,
            popularity = statistics.popularity_score,
            "Refreshed skill statistics"
        );

        Ok(statistics)
    }

    /// Refresh each distinct skill once, in first-seen order.
    pub async fn refresh_skills<'a, I>(&self, skill_ids: I) -> Result<(), SkillError>
    where
        I: IntoIterator<Item = &'a SkillId>,
    {
        let mut seen = HashSet::new();
        for id in skill_ids {
            if seen.insert(id.clone()) {
                self.refresh_statistics(id).await?;
            }
        }
        Ok(())
    }

    /// Transfer a resource between skills and refresh both owners.
    ///
    /// Membership is updated idempotently: the id is appended to `to` only if
    /// absent, removed from `from`, and the resource's owner pointer is
    /// rewritten. Each membership edit is a single atomic repository write;
    /// the move as a whole is not transactional.
    pub async fn move_resource(
        &self,
        resource_id: &ResourceId,
        from: &SkillId,
        to: &SkillId,
    ) -> Result<(), ResourceError> {
        let mut resource = self
            .resource_repo
            .get_by_id(resource_id)
            .await
            .map_err(|e| ResourceError::StorageError(e.to_string()))?
            .ok_or(ResourceError::NotFound)?;

        let membership = |e: RepositoryError| match e {
            RepositoryError::NotFound => ResourceError::SkillNotFound,
            other => ResourceError::StorageError(other.to_string()),
        };

        self.skill_repo
            .add_member(to, resource_id)
            .await
            .map_err(membership)?;
        if from != to {
            self.skill_repo
                .remove_member(from, resource_id)
                .await
                .map_err(membership)?;
        }

        if resource.skill_id != *to {
            resource.skill_id = to.clone();
            resource.updated_at = chrono::Utc::now();
            self.resource_repo
                .update(&resource)
                .await
                .map_err(|e| ResourceError::StorageError(e.to_string()))?;
        }

        tracing::info!(
            resource_id = %resource_id,
            from = %from,
            to = %to,
            "Moved resource between skills"
        );

        self.refresh_skills([from, to]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        InMemoryResourceRepository, InMemorySkillRepository, make_resource, make_skill,
    };

    fn engine(
        skills: &InMemorySkillRepository,
        resources: &InMemoryResourceRepository,
    ) -> StatisticsEngine<InMemorySkillRepository, InMemoryResourceRepository> {
        StatisticsEngine::new(skills.clone(), resources.clone(), PopularityWeights::default())
    }

    #[test]
    fn test_compute_empty_set_is_all_zero() {
        let stats = compute_statistics(&[], &PopularityWeights::default());
        assert_eq!(stats, SkillStatistics::default());
        assert_eq!(stats.average_rating, 0.0);
    }

    #[test]
    fn test_compute_regression_score() {
        let skill = SkillId::new();
        let resources: Vec<Resource> = (0..5)
            .map(|_| {
                let mut r = make_resource(&skill, LearningType::Free, 4.0);
                r.enrollment_count = Some(200);
                r
            })
            .collect();
        let stats = compute_statistics(&resources, &PopularityWeights::default());
        assert_eq!(stats.total_resources, 5);
        assert_eq!(stats.total_learners, 1000);
        assert!((stats.average_rating - 4.0).abs() < 1e-12);
        assert!((stats.popularity_score - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_counts_by_learning_type() {
        let skill = SkillId::new();
        let resources = vec![
            make_resource(&skill, LearningType::Free, 5.0),
            make_resource(&skill, LearningType::Premium, 3.0),
            make_resource(&skill, LearningType::Freemium, 4.0),
        ];
        let stats = compute_statistics(&resources, &PopularityWeights::default());
        assert_eq!(stats.total_resources, 3);
        assert_eq!(stats.free_resources, 1);
        assert_eq!(stats.premium_resources, 1);
        assert!((stats.average_rating - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_compute_ignores_hidden_resources() {
        let skill = SkillId::new();
        let mut inactive = make_resource(&skill, LearningType::Free, 1.0);
        inactive.is_active = false;
        let mut unverified = make_resource(&skill, LearningType::Free, 1.0);
        unverified.verified = false;
        let visible = make_resource(&skill, LearningType::Free, 5.0);

        let stats = compute_statistics(&[inactive, unverified, visible], &PopularityWeights::default());
        assert_eq!(stats.total_resources, 1);
        assert!((stats.average_rating - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_popularity_monotone() {
        let skill = SkillId::new();
        let weights = PopularityWeights::default();
        let mut resources = vec![make_resource(&skill, LearningType::Free, 3.0)];
        let one = compute_statistics(&resources, &weights).popularity_score;
        resources.push(make_resource(&skill, LearningType::Free, 3.0));
        let two = compute_statistics(&resources, &weights).popularity_score;
        assert!(two >= one);

        for r in resources.iter_mut() {
            r.rating = 4.5;
        }
        let higher_rated = compute_statistics(&resources, &weights).popularity_score;
        assert!(higher_rated >= two);
    }

    #[tokio::test]
    async fn test_refresh_counts_active_verified_members() {
        let skills = InMemorySkillRepository::default();
        let resources = InMemoryResourceRepository::default();
        let skill = make_skill("Rust");
        skills.create(&skill).await.unwrap();

        let mut hidden = make_resource(&skill.id, LearningType::Free, 2.0);
        hidden.verified = false;
        resources.create(&hidden).await.unwrap();
        resources
            .create(&make_resource(&skill.id, LearningType::Premium, 4.0))
            .await
            .unwrap();
        // Another skill's resource must not leak in.
        resources
            .create(&make_resource(&SkillId::new(), LearningType::Free, 5.0))
            .await
            .unwrap();

        let stats = engine(&skills, &resources)
            .refresh_statistics(&skill.id)
            .await
            .unwrap();
        assert_eq!(stats.total_resources, 1);
        assert_eq!(stats.premium_resources, 1);

        let stored = skills.get_by_id(&skill.id).await.unwrap().unwrap();
        assert_eq!(stored.statistics, stats);
    }

    #[tokio::test]
    async fn test_refresh_empty_skill() {
        let skills = InMemorySkillRepository::default();
        let resources = InMemoryResourceRepository::default();
        let skill = make_skill("Knitting");
        skills.create(&skill).await.unwrap();

        let stats = engine(&skills, &resources)
            .refresh_statistics(&skill.id)
            .await
            .unwrap();
        assert_eq!(stats.total_resources, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.popularity_score, 0.0);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let skills = InMemorySkillRepository::default();
        let resources = InMemoryResourceRepository::default();
        let skill = make_skill("Statistics");
        skills.create(&skill).await.unwrap();
        for rating in [1.1, 2.7, 4.9] {
            let mut r = make_resource(&skill.id, LearningType::Free, rating);
            r.enrollment_count = Some(333);
            resources.create(&r).await.unwrap();
        }

        let engine = engine(&skills, &resources);
        let first = engine.refresh_statistics(&skill.id).await.unwrap();
        let second = engine.refresh_statistics(&skill.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.popularity_score.to_bits(),
            second.popularity_score.to_bits()
        );
    }

    #[tokio::test]
    async fn test_refresh_missing_skill_is_not_found() {
        let engine = engine(
            &InMemorySkillRepository::default(),
            &InMemoryResourceRepository::default(),
        );
        let err = engine.refresh_statistics(&SkillId::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::NotFound));
    }

    #[tokio::test]
    async fn test_move_resource_updates_both_owners() {
        let skills = InMemorySkillRepository::default();
        let resources = InMemoryResourceRepository::default();
        let mut from = make_skill("Drawing");
        let mut to = make_skill("Painting");

        let resource = make_resource(&from.id, LearningType::Free, 5.0);
        from.add_resource(&resource.id);
        // Pre-existing membership on the target must not be duplicated.
        to.add_resource(&resource.id);
        skills.create(&from).await.unwrap();
        skills.create(&to).await.unwrap();
        resources.create(&resource).await.unwrap();

        let engine = engine(&skills, &resources);
        engine.refresh_statistics(&from.id).await.unwrap();
        engine
            .move_resource(&resource.id, &from.id, &to.id)
            .await
            .unwrap();

        let from = skills.get_by_id(&from.id).await.unwrap().unwrap();
        let to = skills.get_by_id(&to.id).await.unwrap().unwrap();
        assert!(from.resource_ids.is_empty());
        assert_eq!(to.resource_ids, vec![resource.id.clone()]);
        assert_eq!(from.statistics.total_resources, 0);
        assert_eq!(to.statistics.total_resources, 1);

        let moved = resources.get_by_id(&resource.id).await.unwrap().unwrap();
        assert_eq!(moved.skill_id, to.id);
    }

    #[tokio::test]
    async fn test_move_resource_to_missing_skill() {
        let skills = InMemorySkillRepository::default();
        let resources = InMemoryResourceRepository::default();
        let mut from = make_skill("Chess");
        let resource = make_resource(&from.id, LearningType::Free, 3.0);
        from.add_resource(&resource.id);
        skills.create(&from).await.unwrap();
        resources.create(&resource).await.unwrap();

        let err = engine(&skills, &resources)
            .move_resource(&resource.id, &from.id, &SkillId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::SkillNotFound));

        // Nothing was written before the target lookup failed.
        let from = skills.get_by_id(&from.id).await.unwrap().unwrap();
        assert_eq!(from.resource_ids, vec![resource.id.clone()]);
    }

    #[tokio::test]
    async fn test_refresh_skills_dedupes() {
        let skills = InMemorySkillRepository::default();
        let resources = InMemoryResourceRepository::default();
        let skill = make_skill("Go");
        skills.create(&skill).await.unwrap();

        engine(&skills, &resources)
            .refresh_skills([&skill.id, &skill.id, &skill.id])
            .await
            .unwrap();
        assert_eq!(skills.statistics_writes.get(), 1);
    }
}
