use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::warn;

use tailorlink_core::{SessionId, Transcript};

use crate::repositories::TranscriptRepository;

/// Coalesces rapid transcript saves into one write per quiet period. Writes
/// are best-effort: a failure is logged and the in-memory transcript stays
/// the source of truth for the session.
pub struct DebouncedTranscriptWriter {
    repository: Arc<dyn TranscriptRepository>,
    delay: Duration,
    pending: Arc<Mutex<HashMap<String, (SessionId, Transcript)>>>,
}

impl DebouncedTranscriptWriter {
    pub fn new(repository: Arc<dyn TranscriptRepository>, delay: Duration) -> Self {
        Self { repository, delay, pending: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Record the latest snapshot for `id` and schedule a flush if none is
    /// pending. A snapshot queued while a flush is scheduled replaces the
    /// older one; only the newest reaches the database.
    pub async fn queue(&self, id: &SessionId, transcript: Transcript) {
        let schedule = {
            let mut pending = self.pending.lock().await;
            let first_for_session = !pending.contains_key(id.as_str());
            pending.insert(id.as_str().to_string(), (id.clone(), transcript));
            first_for_session
        };

        if !schedule {
            return;
        }

        let repository = Arc::clone(&self.repository);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        let key = id.as_str().to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let entry = pending.lock().await.remove(&key);
            if let Some((id, transcript)) = entry {
                write_snapshot(repository.as_ref(), &id, &transcript).await;
            }
        });
    }

    /// Write any pending snapshot for `id` immediately.
    pub async fn flush(&self, id: &SessionId) {
        let entry = self.pending.lock().await.remove(id.as_str());
        if let Some((id, transcript)) = entry {
            write_snapshot(self.repository.as_ref(), &id, &transcript).await;
        }
    }

    /// Drop a pending snapshot. Used after a clear so a stale scheduled
    /// write cannot resurrect the log.
    pub async fn cancel(&self, id: &SessionId) {
        self.pending.lock().await.remove(id.as_str());
    }

    /// The newest queued snapshot for `id`, when one has not been flushed
    /// yet. Readers consult this before the database so turns landing inside
    /// one quiet period see each other.
    pub async fn pending_snapshot(&self, id: &SessionId) -> Option<Transcript> {
        self.pending.lock().await.get(id.as_str()).map(|(_, transcript)| transcript.clone())
    }
}

async fn write_snapshot(
    repository: &dyn TranscriptRepository,
    id: &SessionId,
    transcript: &Transcript,
) {
    if let Err(error) = repository.save(id, transcript).await {
        warn!(
            event_name = "store.transcript.write_failed",
            session_id = %id,
            error = %error,
            "transcript write failed, keeping in-memory log"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tailorlink_core::{Message, SessionId, Transcript};

    use super::DebouncedTranscriptWriter;
    use crate::repositories::{
        InMemoryTranscriptRepository, RepositoryError, TranscriptRepository,
    };

    struct CountingRepository {
        inner: InMemoryTranscriptRepository,
        saves: AtomicUsize,
    }

    impl CountingRepository {
        fn new() -> Self {
            Self { inner: InMemoryTranscriptRepository::default(), saves: AtomicUsize::new(0) }
        }
    }

    #[async_trait::async_trait]
    impl TranscriptRepository for CountingRepository {
        async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, RepositoryError> {
            self.inner.load(id).await
        }

        async fn save(
            &self,
            id: &SessionId,
            transcript: &Transcript,
        ) -> Result<(), RepositoryError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(id, transcript).await
        }

        async fn clear(&self, id: &SessionId) -> Result<(), RepositoryError> {
            self.inner.clear(id).await
        }
    }

    struct FailingRepository;

    #[async_trait::async_trait]
    impl TranscriptRepository for FailingRepository {
        async fn load(&self, _id: &SessionId) -> Result<Option<Transcript>, RepositoryError> {
            Ok(None)
        }

        async fn save(
            &self,
            _id: &SessionId,
            _transcript: &Transcript,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("disk full".to_string()))
        }

        async fn clear(&self, _id: &SessionId) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    fn transcript_with(texts: &[&str]) -> Transcript {
        let mut transcript = Transcript::new();
        for text in texts {
            transcript.append(Message::from_bot(*text));
        }
        transcript
    }

    #[tokio::test]
    async fn rapid_saves_coalesce_into_one_write() {
        let repository = Arc::new(CountingRepository::new());
        // Long delay keeps the background task parked; flush drives the write.
        let writer =
            DebouncedTranscriptWriter::new(repository.clone(), Duration::from_secs(30));
        let id = SessionId::generate();

        writer.queue(&id, transcript_with(&["one"])).await;
        writer.queue(&id, transcript_with(&["one", "two"])).await;
        writer.flush(&id).await;

        assert_eq!(repository.saves.load(Ordering::SeqCst), 1);
        let stored = repository.load(&id).await.expect("load").expect("stored");
        assert_eq!(stored.len(), 2, "only the newest snapshot reaches the database");
    }

    #[tokio::test]
    async fn background_flush_fires_after_the_quiet_period() {
        let repository = Arc::new(CountingRepository::new());
        let writer =
            DebouncedTranscriptWriter::new(repository.clone(), Duration::from_millis(10));
        let id = SessionId::generate();

        writer.queue(&id, transcript_with(&["one"])).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(repository.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_drops_the_pending_snapshot() {
        let repository = Arc::new(CountingRepository::new());
        let writer =
            DebouncedTranscriptWriter::new(repository.clone(), Duration::from_secs(30));
        let id = SessionId::generate();

        writer.queue(&id, transcript_with(&["one"])).await;
        writer.cancel(&id).await;
        writer.flush(&id).await;

        assert_eq!(repository.saves.load(Ordering::SeqCst), 0);
        assert!(repository.load(&id).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn pending_snapshot_is_visible_until_flushed() {
        let repository = Arc::new(CountingRepository::new());
        let writer =
            DebouncedTranscriptWriter::new(repository.clone(), Duration::from_secs(30));
        let id = SessionId::generate();

        assert!(writer.pending_snapshot(&id).await.is_none());

        writer.queue(&id, transcript_with(&["one", "two"])).await;
        let pending = writer.pending_snapshot(&id).await.expect("snapshot pending");
        assert_eq!(pending.len(), 2);

        writer.flush(&id).await;
        assert!(writer.pending_snapshot(&id).await.is_none());
    }

    #[tokio::test]
    async fn write_failures_are_swallowed() {
        let writer =
            DebouncedTranscriptWriter::new(Arc::new(FailingRepository), Duration::from_secs(30));
        let id = SessionId::generate();

        writer.queue(&id, transcript_with(&["one"])).await;
        writer.flush(&id).await;
        // Reaching this point is the assertion: the failure never escaped.
    }
}
