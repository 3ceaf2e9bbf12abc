//! Attribute catalog operations
//!
//! Weighted lookup of named attribute values per category, plus the admin
//! write path. Reads filter on `is_active`; a category with no rows is an
//! empty result, not an error.

use super::models::AttributeOptionRecord;
use super::{Database, StoreError, StoreResult};
use crate::core::random;

/// Extension trait for attribute-catalog database operations
pub trait AttributeOps {
    /// Weighted draw of up to `count` active options, without replacement.
    fn get_random_by_category(
        &self,
        category: &str,
        count: usize,
    ) -> impl std::future::Future<Output = Result<Vec<AttributeOptionRecord>, sqlx::Error>> + Send;

    /// Full active set for a category, alphabetical by name.
    fn get_by_category(
        &self,
        category: &str,
    ) -> impl std::future::Future<Output = Result<Vec<AttributeOptionRecord>, sqlx::Error>> + Send;

    /// Output values of the active set, for option lists in API responses.
    fn category_values(
        &self,
        category: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, sqlx::Error>> + Send;

    /// Distinct category keys present in the catalog.
    fn list_categories(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, sqlx::Error>> + Send;

    fn get_attribute(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<AttributeOptionRecord>, sqlx::Error>> + Send;

    /// Insert a new option; rejects a duplicate `(name, value)` within the
    /// category.
    fn create_attribute(
        &self,
        option: &AttributeOptionRecord,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Update an existing option; same duplicate rule, excluding itself.
    fn update_attribute(
        &self,
        option: &AttributeOptionRecord,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    fn delete_attribute(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;
}

impl AttributeOps for Database {
    async fn get_random_by_category(
        &self,
        category: &str,
        count: usize,
    ) -> Result<Vec<AttributeOptionRecord>, sqlx::Error> {
        let options = self.get_by_category(category).await?;
        let picked = random::weighted_pick_many_by(&options, count, |o| o.draw_weight());
        Ok(picked.into_iter().cloned().collect())
    }

    async fn get_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<AttributeOptionRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttributeOptionRecord>(
            "SELECT * FROM attribute_options WHERE category = ? AND is_active = 1 ORDER BY name",
        )
        .bind(category)
        .fetch_all(self.pool())
        .await
    }

    async fn category_values(&self, category: &str) -> Result<Vec<String>, sqlx::Error> {
        let options = self.get_by_category(category).await?;
        Ok(options.iter().map(|o| o.output_value().to_string()).collect())
    }

    async fn list_categories(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM attribute_options ORDER BY category",
        )
        .fetch_all(self.pool())
        .await
    }

    async fn get_attribute(&self, id: &str) -> Result<Option<AttributeOptionRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttributeOptionRecord>("SELECT * FROM attribute_options WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn create_attribute(&self, option: &AttributeOptionRecord) -> StoreResult<()> {
        ensure_unique(self, option, None).await?;

        sqlx::query(
            r#"
            INSERT INTO attribute_options (id, category, name, value, weight, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&option.id)
        .bind(&option.category)
        .bind(&option.name)
        .bind(&option.value)
        .bind(option.weight)
        .bind(option.is_active)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn update_attribute(&self, option: &AttributeOptionRecord) -> StoreResult<()> {
        if self.get_attribute(&option.id).await?.is_none() {
            return Err(StoreError::NotFound {
                entity: "attribute option",
                id: option.id.clone(),
            });
        }
        ensure_unique(self, option, Some(&option.id)).await?;

        sqlx::query(
            r#"
            UPDATE attribute_options
            SET category = ?, name = ?, value = ?, weight = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&option.category)
        .bind(&option.name)
        .bind(&option.value)
        .bind(option.weight)
        .bind(option.is_active)
        .bind(&option.id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_attribute(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM attribute_options WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "attribute option",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// Reject an option whose name or emitted token already exists in the
/// category. Rows without a `value` emit their `name`, so the comparison
/// coalesces on both sides.
async fn ensure_unique(
    db: &Database,
    option: &AttributeOptionRecord,
    exclude_id: Option<&str>,
) -> StoreResult<()> {
    let existing: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM attribute_options
        WHERE category = ? AND (name = ? OR COALESCE(value, name) = ?)
          AND id != ?
        "#,
    )
    .bind(&option.category)
    .bind(&option.name)
    .bind(option.output_value())
    .bind(exclude_id.unwrap_or(""))
    .fetch_one(db.pool())
    .await?;

    if existing > 0 {
        return Err(StoreError::Duplicate {
            entity: "attribute option",
            name: option.name.clone(),
            scope: format!("category '{}'", option.category),
        });
    }
    Ok(())
}
