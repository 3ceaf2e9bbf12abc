//! User session operations
//!
//! Favorites, a capped most-recent-first history, and merge-on-write
//! preferences, keyed by `session_id`. Every mutation is read-modify-write
//! with last-write-wins semantics; the session row is created on first
//! touch.

use super::models::{HistoryEntry, UserSessionRecord};
use super::Database;

/// Extension trait for user-session database operations
pub trait SessionOps {
    /// Load the session, creating an empty one on first touch.
    fn get_or_create_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<UserSessionRecord, sqlx::Error>> + Send;

    /// Add a prompt id to favorites (idempotent).
    fn add_favorite(
        &self,
        session_id: &str,
        prompt_id: &str,
    ) -> impl std::future::Future<Output = Result<UserSessionRecord, sqlx::Error>> + Send;

    fn remove_favorite(
        &self,
        session_id: &str,
        prompt_id: &str,
    ) -> impl std::future::Future<Output = Result<UserSessionRecord, sqlx::Error>> + Send;

    /// Prepend a timestamped history entry, truncating to the cap.
    fn push_history(
        &self,
        session_id: &str,
        prompt_id: &str,
    ) -> impl std::future::Future<Output = Result<UserSessionRecord, sqlx::Error>> + Send;

    /// Merge keys into preferences; existing keys are overwritten, others
    /// kept.
    fn merge_preferences(
        &self,
        session_id: &str,
        updates: serde_json::Map<String, serde_json::Value>,
    ) -> impl std::future::Future<Output = Result<UserSessionRecord, sqlx::Error>> + Send;
}

impl SessionOps for Database {
    async fn get_or_create_session(
        &self,
        session_id: &str,
    ) -> Result<UserSessionRecord, sqlx::Error> {
        if let Some(session) =
            sqlx::query_as::<_, UserSessionRecord>("SELECT * FROM user_sessions WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(self.pool())
                .await?
        {
            return Ok(session);
        }

        let session = UserSessionRecord::new(session_id);
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_sessions
            (session_id, favorites_json, history_json, preferences_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.favorites_json)
        .bind(&session.history_json)
        .bind(&session.preferences_json)
        .bind(&session.created_at)
        .bind(&session.updated_at)
        .execute(self.pool())
        .await?;
        Ok(session)
    }

    async fn add_favorite(
        &self,
        session_id: &str,
        prompt_id: &str,
    ) -> Result<UserSessionRecord, sqlx::Error> {
        let session = self.get_or_create_session(session_id).await?;
        let mut favorites = session.favorites();
        if !favorites.iter().any(|f| f == prompt_id) {
            favorites.push(prompt_id.to_string());
        }
        write_session(self, session, |s| {
            s.favorites_json = serde_json::to_string(&favorites).unwrap_or_else(|_| "[]".into());
        })
        .await
    }

    async fn remove_favorite(
        &self,
        session_id: &str,
        prompt_id: &str,
    ) -> Result<UserSessionRecord, sqlx::Error> {
        let session = self.get_or_create_session(session_id).await?;
        let favorites: Vec<String> = session
            .favorites()
            .into_iter()
            .filter(|f| f != prompt_id)
            .collect();
        write_session(self, session, |s| {
            s.favorites_json = serde_json::to_string(&favorites).unwrap_or_else(|_| "[]".into());
        })
        .await
    }

    async fn push_history(
        &self,
        session_id: &str,
        prompt_id: &str,
    ) -> Result<UserSessionRecord, sqlx::Error> {
        let session = self.get_or_create_session(session_id).await?;
        let mut history = session.history();
        history.insert(
            0,
            HistoryEntry {
                prompt_id: prompt_id.to_string(),
                viewed_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        history.truncate(UserSessionRecord::HISTORY_LIMIT);
        write_session(self, session, |s| {
            s.history_json = serde_json::to_string(&history).unwrap_or_else(|_| "[]".into());
        })
        .await
    }

    async fn merge_preferences(
        &self,
        session_id: &str,
        updates: serde_json::Map<String, serde_json::Value>,
    ) -> Result<UserSessionRecord, sqlx::Error> {
        let session = self.get_or_create_session(session_id).await?;
        let mut preferences = session.preferences();
        for (key, value) in updates {
            preferences.insert(key, value);
        }
        write_session(self, session, |s| {
            s.preferences_json =
                serde_json::to_string(&preferences).unwrap_or_else(|_| "{}".into());
        })
        .await
    }
}

/// Apply a mutation and persist the whole row (last-write-wins).
async fn write_session<F>(
    db: &Database,
    mut session: UserSessionRecord,
    mutate: F,
) -> Result<UserSessionRecord, sqlx::Error>
where
    F: FnOnce(&mut UserSessionRecord),
{
    mutate(&mut session);
    session.updated_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE user_sessions
        SET favorites_json = ?, history_json = ?, preferences_json = ?, updated_at = ?
        WHERE session_id = ?
        "#,
    )
    .bind(&session.favorites_json)
    .bind(&session.history_json)
    .bind(&session.preferences_json)
    .bind(&session.updated_at)
    .bind(&session.session_id)
    .execute(db.pool())
    .await?;
    Ok(session)
}
