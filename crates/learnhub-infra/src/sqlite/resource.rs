//! SQLite resource repository implementation.

use learnhub_core::repository::SortOrder;
use learnhub_core::repository::resource::{FlagFilter, ResourceFilter, ResourceRepository};
use learnhub_types::error::RepositoryError;
use learnhub_types::resource::{LearningType, Resource, ResourceId, ResourceType};
use learnhub_types::skill::{SkillCategory, SkillId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `ResourceRepository`.
#[derive(Clone)]
pub struct SqliteResourceRepository {
    pool: DatabasePool,
}

impl SqliteResourceRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ResourceRow {
    id: String,
    skill_id: String,
    title: String,
    description: String,
    url: String,
    category: String,
    resource_type: String,
    learning_type: String,
    rating: f64,
    ratings_count: i64,
    enrollment_count: Option<i64>,
    verified: bool,
    verified_at: Option<String>,
    verification_error: Option<String>,
    is_active: bool,
    deleted_at: Option<String>,
    tags: String,
    created_at: String,
    updated_at: String,
}

impl ResourceRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            skill_id: row.try_get("skill_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            url: row.try_get("url")?,
            category: row.try_get("category")?,
            resource_type: row.try_get("resource_type")?,
            learning_type: row.try_get("learning_type")?,
            rating: row.try_get("rating")?,
            ratings_count: row.try_get("ratings_count")?,
            enrollment_count: row.try_get("enrollment_count")?,
            verified: row.try_get("verified")?,
            verified_at: row.try_get("verified_at")?,
            verification_error: row.try_get("verification_error")?,
            is_active: row.try_get("is_active")?,
            deleted_at: row.try_get("deleted_at")?,
            tags: row.try_get("tags")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_resource(self) -> Result<Resource, RepositoryError> {
        let id = self
            .id
            .parse::<ResourceId>()
            .map_err(|e| RepositoryError::Query(format!("invalid resource id: {e}")))?;
        let skill_id = self
            .skill_id
            .parse::<SkillId>()
            .map_err(|e| RepositoryError::Query(format!("invalid skill id: {e}")))?;

        let category: SkillCategory = self.category.parse().map_err(RepositoryError::Query)?;
        let resource_type: ResourceType =
            self.resource_type.parse().map_err(RepositoryError::Query)?;
        let learning_type: LearningType =
            self.learning_type.parse().map_err(RepositoryError::Query)?;

        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| RepositoryError::Query(format!("invalid tags JSON: {e}")))?;

        Ok(Resource {
            id,
            skill_id,
            title: self.title,
            description: self.description,
            url: self.url,
            category,
            resource_type,
            learning_type,
            rating: self.rating,
            ratings_count: u32::try_from(self.ratings_count).unwrap_or(0),
            enrollment_count: self.enrollment_count.map(|n| n.max(0) as u64),
            verified: self.verified,
            verified_at: self.verified_at.as_deref().map(parse_datetime).transpose()?,
            verification_error: self.verification_error,
            is_active: self.is_active,
            deleted_at: self.deleted_at.as_deref().map(parse_datetime).transpose()?,
            tags,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn flag_conditions(flags: FlagFilter, conditions: &mut Vec<String>) {
    if let Some(active) = flags.active {
        conditions.push(format!("is_active = {}", i32::from(active)));
    }
    if let Some(verified) = flags.verified {
        conditions.push(format!("verified = {}", i32::from(verified)));
    }
}

fn enrollment(resource: &Resource) -> Option<i64> {
    resource
        .enrollment_count
        .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
}

fn rows_to_resources(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Resource>, RepositoryError> {
    let mut resources = Vec::with_capacity(rows.len());
    for row in rows {
        let resource_row = ResourceRow::from_row(row).map_err(query_error)?;
        resources.push(resource_row.into_resource()?);
    }
    Ok(resources)
}

impl ResourceRepository for SqliteResourceRepository {
    async fn create(&self, resource: &Resource) -> Result<Resource, RepositoryError> {
        let tags = serde_json::to_string(&resource.tags)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO resources (id, skill_id, title, description, url, category, resource_type, learning_type, rating, ratings_count, enrollment_count, verified, verified_at, verification_error, is_active, deleted_at, tags, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(resource.id.to_string())
        .bind(resource.skill_id.to_string())
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.url)
        .bind(resource.category.to_string())
        .bind(resource.resource_type.to_string())
        .bind(resource.learning_type.to_string())
        .bind(resource.rating)
        .bind(i64::from(resource.ratings_count))
        .bind(enrollment(resource))
        .bind(resource.verified)
        .bind(resource.verified_at.as_ref().map(format_datetime))
        .bind(&resource.verification_error)
        .bind(resource.is_active)
        .bind(resource.deleted_at.as_ref().map(format_datetime))
        .bind(&tags)
        .bind(format_datetime(&resource.created_at))
        .bind(format_datetime(&resource.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(resource.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("FOREIGN KEY") => {
                Err(RepositoryError::Conflict(format!(
                    "skill '{}' does not exist",
                    resource.skill_id
                )))
            }
            Err(e) => Err(query_error(e)),
        }
    }

    async fn get_by_id(&self, id: &ResourceId) -> Result<Option<Resource>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM resources WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let resource_row = ResourceRow::from_row(&row).map_err(query_error)?;
                Ok(Some(resource_row.into_resource()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, filter: Option<ResourceFilter>) -> Result<Vec<Resource>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM resources");
        let mut conditions: Vec<String> = Vec::new();

        let filter = filter.unwrap_or_default();

        if !filter.include_deleted {
            conditions.push("deleted_at IS NULL".to_string());
        }
        if let Some(ref skill_id) = filter.skill_id {
            // SkillId renders as a UUID, safe to inline.
            conditions.push(format!("skill_id = '{skill_id}'"));
        }
        if let Some(category) = filter.category {
            conditions.push(format!("category = '{category}'"));
        }
        if let Some(resource_type) = filter.resource_type {
            conditions.push(format!("resource_type = '{resource_type}'"));
        }
        if let Some(learning_type) = filter.learning_type {
            conditions.push(format!("learning_type = '{learning_type}'"));
        }
        flag_conditions(filter.flags, &mut conditions);

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let sort_field = filter.sort_by.as_deref().unwrap_or("created_at");
        // Whitelist allowed sort fields to prevent SQL injection
        let safe_sort = match sort_field {
            "title" | "rating" | "ratings_count" | "enrollment_count" | "created_at"
            | "updated_at" | "verified_at" => sort_field,
            _ => "created_at",
        };
        let order = match filter.sort_order.unwrap_or_default() {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY {safe_sort} {order}, rowid {order}"));

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = filter.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows_to_resources(&rows)
    }

    async fn find_by_skill(
        &self,
        skill_id: &SkillId,
        flags: FlagFilter,
    ) -> Result<Vec<Resource>, RepositoryError> {
        let mut conditions = vec!["skill_id = ?".to_string()];
        flag_conditions(flags, &mut conditions);
        let sql = format!(
            "SELECT * FROM resources WHERE {} ORDER BY created_at ASC, rowid ASC",
            conditions.join(" AND ")
        );

        let rows = sqlx::query(&sql)
            .bind(skill_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows_to_resources(&rows)
    }

    async fn update(&self, resource: &Resource) -> Result<Resource, RepositoryError> {
        let tags = serde_json::to_string(&resource.tags)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE resources SET skill_id = ?, title = ?, description = ?, url = ?, category = ?, resource_type = ?, learning_type = ?, rating = ?, ratings_count = ?, enrollment_count = ?, verified = ?, verified_at = ?, verification_error = ?, is_active = ?, deleted_at = ?, tags = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(resource.skill_id.to_string())
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.url)
        .bind(resource.category.to_string())
        .bind(resource.resource_type.to_string())
        .bind(resource.learning_type.to_string())
        .bind(resource.rating)
        .bind(i64::from(resource.ratings_count))
        .bind(enrollment(resource))
        .bind(resource.verified)
        .bind(resource.verified_at.as_ref().map(format_datetime))
        .bind(&resource.verification_error)
        .bind(resource.is_active)
        .bind(resource.deleted_at.as_ref().map(format_datetime))
        .bind(&tags)
        .bind(format_datetime(&resource.updated_at))
        .bind(resource.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(resource.clone())
    }
}
