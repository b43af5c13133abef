//! SQLite skill repository implementation.
//!
//! Implements `SkillRepository` from `learnhub-core`. Membership and cached
//! statistics are stored as JSON columns; `popularity_score` is duplicated
//! into its own column so listings can sort on it.

use learnhub_core::repository::SortOrder;
use learnhub_core::repository::skill::{SkillFilter, SkillRepository};
use learnhub_types::error::RepositoryError;
use learnhub_types::resource::ResourceId;
use learnhub_types::skill::{Skill, SkillCategory, SkillId, SkillStatistics};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `SkillRepository`.
#[derive(Clone)]
pub struct SqliteSkillRepository {
    pool: DatabasePool,
}

impl SqliteSkillRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Skill>, RepositoryError> {
        let sql = format!("SELECT * FROM skills WHERE {clause}");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let skill_row = SkillRow::from_row(&row).map_err(query_error)?;
                Ok(Some(skill_row.into_skill()?))
            }
            None => Ok(None),
        }
    }

    async fn ensure_exists(&self, id: &SkillId) -> Result<(), RepositoryError> {
        let found = sqlx::query("SELECT 1 FROM skills WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;
        found.map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

/// Internal row type for mapping SQLite rows to domain Skill.
struct SkillRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    category: String,
    resource_ids: String,
    statistics: String,
    is_active: bool,
    deleted_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SkillRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            resource_ids: row.try_get("resource_ids")?,
            statistics: row.try_get("statistics")?,
            is_active: row.try_get("is_active")?,
            deleted_at: row.try_get("deleted_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_skill(self) -> Result<Skill, RepositoryError> {
        let id = self
            .id
            .parse::<SkillId>()
            .map_err(|e| RepositoryError::Query(format!("invalid skill id: {e}")))?;

        let category: SkillCategory = self.category.parse().map_err(RepositoryError::Query)?;

        let resource_ids: Vec<ResourceId> = serde_json::from_str(&self.resource_ids)
            .map_err(|e| RepositoryError::Query(format!("invalid resource_ids JSON: {e}")))?;

        // Rows written before the first refresh hold '{}'.
        let statistics: SkillStatistics = if self.statistics.trim() == "{}" {
            SkillStatistics::default()
        } else {
            serde_json::from_str(&self.statistics)
                .map_err(|e| RepositoryError::Query(format!("invalid statistics JSON: {e}")))?
        };

        Ok(Skill {
            id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            category,
            resource_ids,
            statistics,
            is_active: self.is_active,
            deleted_at: self.deleted_at.as_deref().map(parse_datetime).transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Query(e.to_string()))
}

impl SkillRepository for SqliteSkillRepository {
    async fn create(&self, skill: &Skill) -> Result<Skill, RepositoryError> {
        let resource_ids = to_json(&skill.resource_ids)?;
        let statistics = to_json(&skill.statistics)?;

        let result = sqlx::query(
            "INSERT INTO skills (id, name, slug, description, category, resource_ids, statistics, popularity_score, is_active, deleted_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(skill.id.to_string())
        .bind(&skill.name)
        .bind(&skill.slug)
        .bind(&skill.description)
        .bind(skill.category.to_string())
        .bind(&resource_ids)
        .bind(&statistics)
        .bind(skill.statistics.popularity_score)
        .bind(skill.is_active)
        .bind(skill.deleted_at.as_ref().map(format_datetime))
        .bind(format_datetime(&skill.created_at))
        .bind(format_datetime(&skill.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(skill.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("skill '{}' already exists", skill.name)),
            ),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn get_by_id(&self, id: &SkillId) -> Result<Option<Skill>, RepositoryError> {
        self.fetch_one_where("id = ?", &id.to_string()).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Skill>, RepositoryError> {
        // The column is declared COLLATE NOCASE.
        self.fetch_one_where("name = ?", name.trim()).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Skill>, RepositoryError> {
        self.fetch_one_where("slug = ?", slug).await
    }

    async fn list(&self, filter: Option<SkillFilter>) -> Result<Vec<Skill>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM skills");
        let mut conditions: Vec<String> = Vec::new();

        let filter = filter.unwrap_or_default();

        if !filter.include_deleted {
            conditions.push("is_active = 1".to_string());
        }
        if let Some(category) = filter.category {
            conditions.push(format!("category = '{category}'"));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let sort_field = filter.sort_by.as_deref().unwrap_or("created_at");
        // Whitelist allowed sort fields to prevent SQL injection
        let safe_sort = match sort_field {
            "name" | "slug" | "category" | "created_at" | "updated_at" | "popularity_score" => {
                sort_field
            }
            "popularity" => "popularity_score",
            _ => "created_at",
        };
        let order = match filter.sort_order.unwrap_or_default() {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY {safe_sort} {order}"));

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

        let mut skills = Vec::with_capacity(rows.len());
        for row in &rows {
            let skill_row = SkillRow::from_row(row).map_err(query_error)?;
            skills.push(skill_row.into_skill()?);
        }

        Ok(skills)
    }

    async fn update(&self, skill: &Skill) -> Result<Skill, RepositoryError> {
        let result = sqlx::query(
            "UPDATE skills SET name = ?, slug = ?, description = ?, category = ?, is_active = ?, deleted_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&skill.name)
        .bind(&skill.slug)
        .bind(&skill.description)
        .bind(skill.category.to_string())
        .bind(skill.is_active)
        .bind(skill.deleted_at.as_ref().map(format_datetime))
        .bind(format_datetime(&skill.updated_at))
        .bind(skill.id.to_string())
        .execute(&self.pool.writer)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                return Err(RepositoryError::Conflict(format!(
                    "skill '{}' already exists",
                    skill.name
                )));
            }
            Err(e) => return Err(query_error(e)),
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(&skill.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_statistics(
        &self,
        id: &SkillId,
        statistics: &SkillStatistics,
    ) -> Result<(), RepositoryError> {
        let json = to_json(statistics)?;

        let result =
            sqlx::query("UPDATE skills SET statistics = ?, popularity_score = ? WHERE id = ?")
                .bind(&json)
                .bind(statistics.popularity_score)
                .bind(id.to_string())
                .execute(&self.pool.writer)
                .await
                .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn add_member(
        &self,
        id: &SkillId,
        resource_id: &ResourceId,
    ) -> Result<bool, RepositoryError> {
        let member = resource_id.to_string();

        // One statement, so concurrent appends cannot overwrite each other.
        let result = sqlx::query(
            "UPDATE skills
             SET resource_ids = json_insert(resource_ids, '$[#]', ?), updated_at = ?
             WHERE id = ?
               AND NOT EXISTS (SELECT 1 FROM json_each(skills.resource_ids) WHERE value = ?)",
        )
        .bind(&member)
        .bind(format_datetime(&chrono::Utc::now()))
        .bind(id.to_string())
        .bind(&member)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            self.ensure_exists(id).await?;
            return Ok(false);
        }
        Ok(true)
    }

    async fn remove_member(
        &self,
        id: &SkillId,
        resource_id: &ResourceId,
    ) -> Result<bool, RepositoryError> {
        let member = resource_id.to_string();

        let result = sqlx::query(
            "UPDATE skills
             SET resource_ids = (
                    SELECT json_group_array(value) FROM json_each(skills.resource_ids)
                    WHERE value != ?
                 ),
                 updated_at = ?
             WHERE id = ?
               AND EXISTS (SELECT 1 FROM json_each(skills.resource_ids) WHERE value = ?)",
        )
        .bind(&member)
        .bind(format_datetime(&chrono::Utc::now()))
        .bind(id.to_string())
        .bind(&member)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            self.ensure_exists(id).await?;
            return Ok(false);
        }
        Ok(true)
    }
}
