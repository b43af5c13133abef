//! In-memory repositories and fake probes shared by the core unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use url::Url;

use learnhub_types::error::RepositoryError;
use learnhub_types::resource::{LearningType, Resource, ResourceId, ResourceType};
use learnhub_types::skill::{Skill, SkillCategory, SkillId, SkillStatistics, slugify};
use learnhub_types::verification::ProbeOutcome;

use crate::repository::resource::{FlagFilter, ResourceFilter, ResourceRepository};
use crate::repository::skill::{SkillFilter, SkillRepository};
use crate::service::probe::UrlProbe;

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn incr(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn decr(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }

    fn raise_to(&self, value: usize) {
        self.0.fetch_max(value, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct SeenUrls(Arc<Mutex<Vec<String>>>);

impl SeenUrls {
    pub fn urls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Probe answering from a per-host table, counting calls.
pub struct FakeProbe {
    default: ProbeOutcome,
    by_host: HashMap<String, ProbeOutcome>,
    calls: Counter,
    seen: SeenUrls,
}

impl FakeProbe {
    pub fn new(default: ProbeOutcome) -> Self {
        Self {
            default,
            by_host: HashMap::new(),
            calls: Counter::default(),
            seen: SeenUrls::default(),
        }
    }

    pub fn with_host(mut self, host: &str, outcome: ProbeOutcome) -> Self {
        self.by_host.insert(host.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> Counter {
        self.calls.clone()
    }

    pub fn seen(&self) -> SeenUrls {
        self.seen.clone()
    }
}

impl UrlProbe for FakeProbe {
    async fn probe(&self, url: &Url, _timeout: Duration) -> ProbeOutcome {
        self.calls.incr();
        self.seen.0.lock().unwrap().push(url.to_string());
        url.host_str()
            .and_then(|h| self.by_host.get(h))
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Probe that answers 200 after a fixed delay, tracking peak concurrency.
pub struct SlowProbe {
    delay: Duration,
    in_flight: Counter,
    peak: Counter,
}

impl SlowProbe {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: Counter::default(),
            peak: Counter::default(),
        }
    }

    pub fn peak(&self) -> Counter {
        self.peak.clone()
    }
}

impl UrlProbe for SlowProbe {
    async fn probe(&self, _url: &Url, _timeout: Duration) -> ProbeOutcome {
        let now = self.in_flight.incr();
        self.peak.raise_to(now);
        tokio::time::sleep(self.delay).await;
        self.in_flight.decr();
        ProbeOutcome::Status(200)
    }
}

#[derive(Clone, Default)]
pub struct InMemorySkillRepository {
    skills: Arc<Mutex<Vec<Skill>>>,
    pub statistics_writes: Counter,
}

impl SkillRepository for InMemorySkillRepository {
    async fn create(&self, skill: &Skill) -> Result<Skill, RepositoryError> {
        let mut skills = self.skills.lock().unwrap();
        if skills
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(&skill.name) || s.slug == skill.slug)
        {
            return Err(RepositoryError::Conflict(skill.name.clone()));
        }
        skills.push(skill.clone());
        Ok(skill.clone())
    }

    async fn get_by_id(&self, id: &SkillId) -> Result<Option<Skill>, RepositoryError> {
        Ok(self.skills.lock().unwrap().iter().find(|s| &s.id == id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Skill>, RepositoryError> {
        Ok(self
            .skills
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Skill>, RepositoryError> {
        Ok(self.skills.lock().unwrap().iter().find(|s| s.slug == slug).cloned())
    }

    async fn list(&self, filter: Option<SkillFilter>) -> Result<Vec<Skill>, RepositoryError> {
        let filter = filter.unwrap_or_default();
        Ok(self
            .skills
            .lock()
            .unwrap()
            .iter()
            .filter(|s| filter.include_deleted || s.is_active)
            .filter(|s| filter.category.is_none_or(|c| s.category == c))
            .cloned()
            .collect())
    }

    async fn update(&self, skill: &Skill) -> Result<Skill, RepositoryError> {
        let mut skills = self.skills.lock().unwrap();
        let slot = skills
            .iter_mut()
            .find(|s| s.id == skill.id)
            .ok_or(RepositoryError::NotFound)?;
        let statistics = slot.statistics.clone();
        let resource_ids = slot.resource_ids.clone();
        *slot = skill.clone();
        slot.statistics = statistics;
        slot.resource_ids = resource_ids;
        Ok(slot.clone())
    }

    async fn update_statistics(
        &self,
        id: &SkillId,
        statistics: &SkillStatistics,
    ) -> Result<(), RepositoryError> {
        let mut skills = self.skills.lock().unwrap();
        let slot = skills
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or(RepositoryError::NotFound)?;
        slot.statistics = statistics.clone();
        self.statistics_writes.incr();
        Ok(())
    }

    async fn add_member(
        &self,
        id: &SkillId,
        resource_id: &ResourceId,
    ) -> Result<bool, RepositoryError> {
        let mut skills = self.skills.lock().unwrap();
        let slot = skills
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(slot.add_resource(resource_id))
    }

    async fn remove_member(
        &self,
        id: &SkillId,
        resource_id: &ResourceId,
    ) -> Result<bool, RepositoryError> {
        let mut skills = self.skills.lock().unwrap();
        let slot = skills
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(slot.remove_resource(resource_id))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryResourceRepository {
    resources: Arc<Mutex<Vec<Resource>>>,
}

impl ResourceRepository for InMemoryResourceRepository {
    async fn create(&self, resource: &Resource) -> Result<Resource, RepositoryError> {
        self.resources.lock().unwrap().push(resource.clone());
        Ok(resource.clone())
    }

    async fn get_by_id(&self, id: &ResourceId) -> Result<Option<Resource>, RepositoryError> {
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.id == id)
            .cloned())
    }

    async fn list(&self, filter: Option<ResourceFilter>) -> Result<Vec<Resource>, RepositoryError> {
        let filter = filter.unwrap_or_default();
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.include_deleted || r.deleted_at.is_none())
            .filter(|r| filter.skill_id.as_ref().is_none_or(|s| &r.skill_id == s))
            .filter(|r| filter.category.is_none_or(|c| r.category == c))
            .filter(|r| filter.resource_type.is_none_or(|t| r.resource_type == t))
            .filter(|r| filter.learning_type.is_none_or(|t| r.learning_type == t))
            .filter(|r| filter.flags.matches(r))
            .cloned()
            .collect())
    }

    async fn find_by_skill(
        &self,
        skill_id: &SkillId,
        flags: FlagFilter,
    ) -> Result<Vec<Resource>, RepositoryError> {
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.skill_id == skill_id && flags.matches(r))
            .cloned()
            .collect())
    }

    async fn update(&self, resource: &Resource) -> Result<Resource, RepositoryError> {
        let mut resources = self.resources.lock().unwrap();
        let slot = resources
            .iter_mut()
            .find(|r| r.id == resource.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = resource.clone();
        Ok(resource.clone())
    }
}

pub fn make_skill(name: &str) -> Skill {
    let now = Utc::now();
    Skill {
        id: SkillId::new(),
        name: name.to_string(),
        slug: slugify(name),
        description: String::new(),
        category: SkillCategory::All,
        resource_ids: Vec::new(),
        statistics: SkillStatistics::default(),
        is_active: true,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn make_resource(skill_id: &SkillId, learning_type: LearningType, rating: f64) -> Resource {
    let now = Utc::now();
    Resource {
        id: ResourceId::new(),
        skill_id: skill_id.clone(),
        title: "Resource".to_string(),
        description: String::new(),
        url: "https://example.com/".to_string(),
        category: SkillCategory::All,
        resource_type: ResourceType::Article,
        learning_type,
        rating,
        ratings_count: 1,
        enrollment_count: None,
        verified: true,
        verified_at: Some(now),
        verification_error: None,
        is_active: true,
        deleted_at: None,
        tags: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
