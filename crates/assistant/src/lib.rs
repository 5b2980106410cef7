//! Conversation brain of the TailorLink support widget.
//!
//! This crate turns free-text customer input into bot replies:
//! 1. **Intent classification** (`intent`) - ordered regex table, first match
//!    wins, fixed confidence tiers
//! 2. **Response catalog** (`catalog`) - canned texts and quick replies per
//!    intent, plus the templated order/tailor/location/download messages
//! 3. **Conversation engine** (`conversation`) - branches on the classified
//!    intent, calls the order/tailor backends behind trait seams, and appends
//!    the turn's messages to the transcript
//!
//! # Determinism
//!
//! Classification is pure and synchronous and never fails; `unknown` is the
//! floor. Pattern order is part of the contract - ambiguous input resolves by
//! list position, so reordering the table silently changes outcomes.
//!
//! External fetches are the only fallible operations, and their failures are
//! converted into apologetic bot messages with recovery quick replies. No
//! turn ever surfaces an error to the user.

pub mod catalog;
pub mod conversation;
pub mod intent;
