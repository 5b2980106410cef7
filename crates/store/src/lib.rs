pub mod connection;
pub mod debounce;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use debounce::DebouncedTranscriptWriter;
pub use repositories::{
    InMemorySessionRepository, InMemoryTranscriptRepository, RepositoryError, SessionRecord,
    SessionRepository, SqlSessionRepository, SqlTranscriptRepository, TranscriptRepository,
};
