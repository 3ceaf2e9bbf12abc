//! Description template operations
//!
//! CRUD and lookup for user-editable description templates. At most one
//! default exists per generator type; writing a new default unsets the
//! others in the same transaction.

use super::models::DescriptionTemplateRecord;
use super::{Database, StoreError, StoreResult};
use serde::Serialize;

/// Per-generator-type template statistics.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorTypeStats {
    pub generator_type: String,
    pub template_count: i64,
    pub has_default: bool,
}

/// Extension trait for description-template database operations
pub trait TemplateOps {
    fn get_template(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<DescriptionTemplateRecord>, sqlx::Error>> + Send;

    fn list_templates(
        &self,
        generator_type: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<DescriptionTemplateRecord>, sqlx::Error>> + Send;

    /// The active default template for a generator type, if any.
    fn default_template(
        &self,
        generator_type: &str,
    ) -> impl std::future::Future<Output = Result<Option<DescriptionTemplateRecord>, sqlx::Error>> + Send;

    fn create_template(
        &self,
        template: &DescriptionTemplateRecord,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    fn update_template(
        &self,
        template: &DescriptionTemplateRecord,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    fn delete_template(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    fn generator_type_stats(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<GeneratorTypeStats>, sqlx::Error>> + Send;
}

impl TemplateOps for Database {
    async fn get_template(&self, id: &str) -> Result<Option<DescriptionTemplateRecord>, sqlx::Error> {
        sqlx::query_as::<_, DescriptionTemplateRecord>(
            "SELECT * FROM description_templates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
    }

    async fn list_templates(
        &self,
        generator_type: Option<&str>,
    ) -> Result<Vec<DescriptionTemplateRecord>, sqlx::Error> {
        if let Some(generator_type) = generator_type {
            sqlx::query_as::<_, DescriptionTemplateRecord>(
                "SELECT * FROM description_templates WHERE generator_type = ? ORDER BY name",
            )
            .bind(generator_type)
            .fetch_all(self.pool())
            .await
        } else {
            sqlx::query_as::<_, DescriptionTemplateRecord>(
                "SELECT * FROM description_templates ORDER BY generator_type, name",
            )
            .fetch_all(self.pool())
            .await
        }
    }

    async fn default_template(
        &self,
        generator_type: &str,
    ) -> Result<Option<DescriptionTemplateRecord>, sqlx::Error> {
        sqlx::query_as::<_, DescriptionTemplateRecord>(
            r#"
            SELECT * FROM description_templates
            WHERE generator_type = ? AND is_default = 1 AND is_active = 1
            "#,
        )
        .bind(generator_type)
        .fetch_optional(self.pool())
        .await
    }

    async fn create_template(&self, template: &DescriptionTemplateRecord) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;

        if template.is_default {
            sqlx::query("UPDATE description_templates SET is_default = 0 WHERE generator_type = ?")
                .bind(&template.generator_type)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO description_templates
            (id, name, generator_type, template, description, is_active, is_default,
             created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&template.generator_type)
        .bind(&template.template)
        .bind(&template.description)
        .bind(template.is_active)
        .bind(template.is_default)
        .bind(&template.created_at)
        .bind(&template.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_template(&self, template: &DescriptionTemplateRecord) -> StoreResult<()> {
        if self.get_template(&template.id).await?.is_none() {
            return Err(StoreError::NotFound {
                entity: "description template",
                id: template.id.clone(),
            });
        }

        let mut tx = self.pool().begin().await?;

        if template.is_default {
            sqlx::query(
                "UPDATE description_templates SET is_default = 0 WHERE generator_type = ? AND id != ?",
            )
            .bind(&template.generator_type)
            .bind(&template.id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE description_templates
            SET name = ?, generator_type = ?, template = ?, description = ?,
                is_active = ?, is_default = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&template.name)
        .bind(&template.generator_type)
        .bind(&template.template)
        .bind(&template.description)
        .bind(template.is_active)
        .bind(template.is_default)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&template.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM description_templates WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "description template",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn generator_type_stats(&self) -> Result<Vec<GeneratorTypeStats>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, i64, i64)>(
            r#"
            SELECT generator_type, COUNT(*), MAX(is_default)
            FROM description_templates
            GROUP BY generator_type
            ORDER BY generator_type
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(generator_type, template_count, has_default)| GeneratorTypeStats {
                generator_type,
                template_count,
                has_default: has_default > 0,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_default_unsets_previous_default() {
        let db = Database::in_memory().await.unwrap();

        let mut template =
            DescriptionTemplateRecord::new("Heroic Intro", "adventurer", "{race} {class}");
        template.is_default = true;
        db.create_template(&template).await.unwrap();

        let defaults: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM description_templates WHERE generator_type = 'adventurer' AND is_default = 1",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(defaults, 1);

        let current = db.default_template("adventurer").await.unwrap().unwrap();
        assert_eq!(current.id, template.id);
    }

    #[tokio::test]
    async fn non_default_create_keeps_existing_default() {
        let db = Database::in_memory().await.unwrap();
        let template = DescriptionTemplateRecord::new("Alt Intro", "anime", "{species}");
        db.create_template(&template).await.unwrap();

        let current = db.default_template("anime").await.unwrap().unwrap();
        assert_eq!(current.id, "tmpl-anime-default");
    }

    #[tokio::test]
    async fn inactive_default_is_not_returned() {
        let db = Database::in_memory().await.unwrap();
        sqlx::query("UPDATE description_templates SET is_active = 0 WHERE id = 'tmpl-anime-default'")
            .execute(db.pool())
            .await
            .unwrap();
        assert!(db.default_template("anime").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_template_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let template = DescriptionTemplateRecord::new("Ghost", "base", "{gender}");
        let err = db.update_template(&template).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn stats_report_counts_and_defaults() {
        let db = Database::in_memory().await.unwrap();
        let stats = db.generator_type_stats().await.unwrap();
        assert_eq!(stats.len(), 4);
        assert!(stats.iter().all(|s| s.has_default));

        let template = DescriptionTemplateRecord::new("Extra", "anime", "{species}");
        db.create_template(&template).await.unwrap();
        let stats = db.generator_type_stats().await.unwrap();
        let anime = stats.iter().find(|s| s.generator_type == "anime").unwrap();
        assert_eq!(anime.template_count, 2);
    }
}
