use chrono::{DateTime, Utc};
use sqlx::Row;

use tailorlink_core::SessionId;

use super::{RepositoryError, SessionRecord, SessionRepository};
use crate::DbPool;

pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT session_id, created_at FROM chat_session WHERE session_id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at_raw = row.get::<String, _>("created_at");
        let created_at = created_at_raw
            .parse::<DateTime<Utc>>()
            .map_err(|error| RepositoryError::Decode(format!("created_at: {error}")))?;

        Ok(Some(SessionRecord { id: SessionId(row.get::<String, _>("session_id")), created_at }))
    }

    async fn save(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_session (session_id, created_at) VALUES (?1, ?2) \
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(record.id.as_str())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tailorlink_core::SessionId;

    use crate::repositories::{SessionRecord, SessionRepository, SqlSessionRepository};
    use crate::{connect_with_settings, migrations};

    async fn pool() -> crate::DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect in-memory");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn session_round_trip() {
        let repo = SqlSessionRepository::new(pool().await);
        let record = SessionRecord::new(SessionId::generate());

        repo.save(record.clone()).await.expect("save session");
        let found = repo.find_by_id(&record.id).await.expect("find session");

        let found = found.expect("session should exist");
        assert_eq!(found.id, record.id);
        assert_eq!(found.created_at.timestamp(), record.created_at.timestamp());
    }

    #[tokio::test]
    async fn saving_an_existing_session_keeps_the_original_record() {
        let repo = SqlSessionRepository::new(pool().await);
        let original = SessionRecord::new(SessionId::generate());
        repo.save(original.clone()).await.expect("save session");

        let mut later = original.clone();
        later.created_at = later.created_at + chrono::Duration::hours(1);
        repo.save(later).await.expect("second save is a no-op");

        let found =
            repo.find_by_id(&original.id).await.expect("find session").expect("session exists");
        assert_eq!(found.created_at.timestamp(), original.created_at.timestamp());
    }

    #[tokio::test]
    async fn missing_session_reads_as_none() {
        let repo = SqlSessionRepository::new(pool().await);
        let found =
            repo.find_by_id(&SessionId("sess_missing".to_string())).await.expect("query runs");
        assert!(found.is_none());
    }
}
