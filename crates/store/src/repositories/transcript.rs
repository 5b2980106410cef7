use chrono::Utc;
use sqlx::Row;

use tailorlink_core::{SessionId, Transcript};

use super::{RepositoryError, TranscriptRepository};
use crate::DbPool;

/// Stores each session's transcript as one JSON blob row, the storage model
/// the widget expects: a single serialized message log per session key.
pub struct SqlTranscriptRepository {
    pool: DbPool,
}

impl SqlTranscriptRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TranscriptRepository for SqlTranscriptRepository {
    async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, RepositoryError> {
        let row = sqlx::query("SELECT payload FROM chat_transcript WHERE session_id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload = row.get::<String, _>("payload");
        let transcript = serde_json::from_str::<Transcript>(&payload)
            .map_err(|error| RepositoryError::Decode(format!("transcript payload: {error}")))?;

        Ok(Some(transcript))
    }

    async fn save(&self, id: &SessionId, transcript: &Transcript) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(transcript)
            .map_err(|error| RepositoryError::Decode(format!("transcript payload: {error}")))?;

        sqlx::query(
            "INSERT INTO chat_transcript (session_id, payload, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT (session_id) DO UPDATE \
             SET payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(id.as_str())
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chat_transcript WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
