use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use tailorlink_core::{SessionId, Transcript};

pub mod memory;
pub mod session;
pub mod transcript;

pub use memory::{InMemorySessionRepository, InMemoryTranscriptRepository};
pub use session::SqlSessionRepository;
pub use transcript::SqlTranscriptRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// One widget installation as stored. The id outlives transcript clears.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: SessionId) -> Self {
        Self { id, created_at: Utc::now() }
    }
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError>;
    /// Idempotent: saving an existing session keeps the original record.
    async fn save(&self, record: SessionRecord) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TranscriptRepository: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, RepositoryError>;
    async fn save(&self, id: &SessionId, transcript: &Transcript) -> Result<(), RepositoryError>;
    /// Removes only the transcript blob; the session row stays.
    async fn clear(&self, id: &SessionId) -> Result<(), RepositoryError>;
}
