//! Species catalog operations
//!
//! Lookup of generation subjects (anime species, alien species, adventurer
//! classes) per generator type. Random selection is weighted among active
//! rows; an empty type yields `None` and the caller raises the domain
//! error.

use super::models::SpeciesRecord;
use super::{Database, StoreError, StoreResult};
use crate::core::random;

/// Extension trait for species-catalog database operations
pub trait SpeciesOps {
    /// Weighted pick among active species of a type.
    fn random_by_type(
        &self,
        species_type: &str,
    ) -> impl std::future::Future<Output = Result<Option<SpeciesRecord>, sqlx::Error>> + Send;

    fn find_by_name_and_type(
        &self,
        name: &str,
        species_type: &str,
    ) -> impl std::future::Future<Output = Result<Option<SpeciesRecord>, sqlx::Error>> + Send;

    fn get_species(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<SpeciesRecord>, sqlx::Error>> + Send;

    fn list_by_type(
        &self,
        species_type: &str,
    ) -> impl std::future::Future<Output = Result<Vec<SpeciesRecord>, sqlx::Error>> + Send;

    fn list_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SpeciesRecord>, sqlx::Error>> + Send;

    /// Distinct species types present in the catalog.
    fn all_types(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, sqlx::Error>> + Send;

    /// Insert or replace a species row.
    fn save_species(
        &self,
        species: &SpeciesRecord,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;

    fn delete_species(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;
}

impl SpeciesOps for Database {
    async fn random_by_type(
        &self,
        species_type: &str,
    ) -> Result<Option<SpeciesRecord>, sqlx::Error> {
        let candidates = self.list_by_type(species_type).await?;
        Ok(random::weighted_pick_by(&candidates, |s| s.draw_weight()).cloned())
    }

    async fn find_by_name_and_type(
        &self,
        name: &str,
        species_type: &str,
    ) -> Result<Option<SpeciesRecord>, sqlx::Error> {
        sqlx::query_as::<_, SpeciesRecord>(
            r#"
            SELECT * FROM species
            WHERE name = ? COLLATE NOCASE AND species_type = ? AND is_active = 1
            "#,
        )
        .bind(name)
        .bind(species_type)
        .fetch_optional(self.pool())
        .await
    }

    async fn get_species(&self, id: &str) -> Result<Option<SpeciesRecord>, sqlx::Error> {
        sqlx::query_as::<_, SpeciesRecord>("SELECT * FROM species WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn list_by_type(&self, species_type: &str) -> Result<Vec<SpeciesRecord>, sqlx::Error> {
        sqlx::query_as::<_, SpeciesRecord>(
            "SELECT * FROM species WHERE species_type = ? AND is_active = 1 ORDER BY name",
        )
        .bind(species_type)
        .fetch_all(self.pool())
        .await
    }

    async fn list_all(&self) -> Result<Vec<SpeciesRecord>, sqlx::Error> {
        sqlx::query_as::<_, SpeciesRecord>(
            "SELECT * FROM species WHERE is_active = 1 ORDER BY species_type, name",
        )
        .fetch_all(self.pool())
        .await
    }

    async fn all_types(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT species_type FROM species ORDER BY species_type",
        )
        .fetch_all(self.pool())
        .await
    }

    async fn save_species(&self, species: &SpeciesRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO species
            (id, name, species_type, features_json, personality_json, visual_descriptors_json,
             ears, tail, wings, species_class, climate, equipment_config_json,
             negative_prompt, description_template_id, weight, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&species.id)
        .bind(&species.name)
        .bind(&species.species_type)
        .bind(&species.features_json)
        .bind(&species.personality_json)
        .bind(&species.visual_descriptors_json)
        .bind(&species.ears)
        .bind(&species.tail)
        .bind(&species.wings)
        .bind(&species.species_class)
        .bind(&species.climate)
        .bind(&species.equipment_config_json)
        .bind(&species.negative_prompt)
        .bind(&species.description_template_id)
        .bind(species.weight)
        .bind(species.is_active)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_species(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM species WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "species",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn random_by_type_misses_empty_type() {
        let db = Database::in_memory().await.unwrap();
        let species = db.random_by_type("mecha").await.unwrap();
        assert!(species.is_none());
    }

    #[tokio::test]
    async fn random_by_type_returns_matching_type() {
        let db = Database::in_memory().await.unwrap();
        for _ in 0..20 {
            let species = db.random_by_type("alien").await.unwrap().unwrap();
            assert_eq!(species.species_type, "alien");
        }
    }

    #[tokio::test]
    async fn find_by_name_is_case_insensitive() {
        let db = Database::in_memory().await.unwrap();
        let species = db.find_by_name_and_type("nekomata", "anime").await.unwrap();
        assert_eq!(species.unwrap().name, "Nekomata");
    }

    #[tokio::test]
    async fn all_types_covers_seeded_generators() {
        let db = Database::in_memory().await.unwrap();
        let types = db.all_types().await.unwrap();
        assert_eq!(types, vec!["adventurer", "alien", "anime"]);
    }

    #[tokio::test]
    async fn inactive_species_is_not_selectable() {
        let db = Database::in_memory().await.unwrap();
        sqlx::query("UPDATE species SET is_active = 0 WHERE species_type = 'anime'")
            .execute(db.pool())
            .await
            .unwrap();
        assert!(db.random_by_type("anime").await.unwrap().is_none());
        assert!(db
            .find_by_name_and_type("Nekomata", "anime")
            .await
            .unwrap()
            .is_none());
    }
}
