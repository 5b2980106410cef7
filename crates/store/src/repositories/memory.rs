use std::collections::HashMap;

use tokio::sync::RwLock;

use tailorlink_core::{SessionId, Transcript};

use super::{RepositoryError, SessionRecord, SessionRepository, TranscriptRepository};

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

#[async_trait::async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id.as_str()).cloned())
    }

    async fn save(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.entry(record.id.as_str().to_string()).or_insert(record);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTranscriptRepository {
    transcripts: RwLock<HashMap<String, Transcript>>,
}

#[async_trait::async_trait]
impl TranscriptRepository for InMemoryTranscriptRepository {
    async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, RepositoryError> {
        let transcripts = self.transcripts.read().await;
        Ok(transcripts.get(id.as_str()).cloned())
    }

    async fn save(&self, id: &SessionId, transcript: &Transcript) -> Result<(), RepositoryError> {
        let mut transcripts = self.transcripts.write().await;
        transcripts.insert(id.as_str().to_string(), transcript.clone());
        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut transcripts = self.transcripts.write().await;
        transcripts.remove(id.as_str());
        Ok(())
    }
}
