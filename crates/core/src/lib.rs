pub mod config;
pub mod domain;
pub mod errors;

pub use domain::message::{Message, MessageId, MessageKind, MessagePayload, Transcript};
pub use domain::order::{Measurement, OrderSnapshot, OrderStage};
pub use domain::session::SessionId;
pub use domain::tailor::{Coordinates, TailorSummary};
pub use errors::{ApplicationError, DomainError, InterfaceError};
