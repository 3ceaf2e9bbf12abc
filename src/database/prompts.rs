//! Generated prompt persistence
//!
//! The alien generation flow stores each successful item; other flows
//! return results without persisting. There is no update path, only
//! insert and read.

use super::models::GeneratedPromptRecord;
use super::Database;

/// Extension trait for persisted-prompt database operations
pub trait PromptOps {
    fn save_prompt(
        &self,
        prompt: &GeneratedPromptRecord,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;

    fn get_prompt(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<GeneratedPromptRecord>, sqlx::Error>> + Send;

    /// Most recently created prompts first.
    fn list_recent_prompts(
        &self,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<GeneratedPromptRecord>, sqlx::Error>> + Send;
}

impl PromptOps for Database {
    async fn save_prompt(&self, prompt: &GeneratedPromptRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO generated_prompts
            (id, title, description, negative_prompt, tags_json, species_id, prompt_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&prompt.id)
        .bind(&prompt.title)
        .bind(&prompt.description)
        .bind(&prompt.negative_prompt)
        .bind(&prompt.tags_json)
        .bind(&prompt.species_id)
        .bind(&prompt.prompt_type)
        .bind(&prompt.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn get_prompt(&self, id: &str) -> Result<Option<GeneratedPromptRecord>, sqlx::Error> {
        sqlx::query_as::<_, GeneratedPromptRecord>("SELECT * FROM generated_prompts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn list_recent_prompts(
        &self,
        limit: i64,
    ) -> Result<Vec<GeneratedPromptRecord>, sqlx::Error> {
        sqlx::query_as::<_, GeneratedPromptRecord>(
            "SELECT * FROM generated_prompts ORDER BY created_at DESC, id LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str) -> GeneratedPromptRecord {
        GeneratedPromptRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: "a description".to_string(),
            negative_prompt: "blurry".to_string(),
            tags_json: r#"["alien","female"]"#.to_string(),
            species_id: None,
            prompt_type: "alien".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn save_and_read_back() {
        let db = Database::in_memory().await.unwrap();
        let prompt = sample("First Contact");
        db.save_prompt(&prompt).await.unwrap();

        let loaded = db.get_prompt(&prompt.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "First Contact");
        assert_eq!(loaded.tags(), vec!["alien", "female"]);
    }

    #[tokio::test]
    async fn recent_list_is_bounded() {
        let db = Database::in_memory().await.unwrap();
        for i in 0..5 {
            db.save_prompt(&sample(&format!("p{i}"))).await.unwrap();
        }
        let listed = db.list_recent_prompts(3).await.unwrap();
        assert_eq!(listed.len(), 3);
    }
}
