//! # Runtime Errors
//!
//! This module defines the error types shared by the runtime, its routers and clients.
//! Most failure modes of the dispatch core are deliberately *not* errors: unhandled
//! messages are reported to a diagnostic hook, interceptor type mismatches bypass the
//! interceptor and deliveries to stopped actors are dropped. What remains here are the
//! configuration and communication failures a caller can act on.

use std::time::Duration;

/// Errors that can occur within the behavior runtime itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped reply before answering")]
    ActorDropped,
    #[error("No reply within {0:?}")]
    AskTimeout(Duration),
    #[error("Router needs at least one routee")]
    EmptyRouteeSet,
    #[error("FSM initialized without a start state")]
    MissingInitialState,
    #[error("Behavior `{0}` is a directive and cannot be spawned")]
    InvalidInitialBehavior(&'static str),
    #[error("Actor system `{0}` is terminated")]
    SystemTerminated(String),
    #[error("Spawn requires a running Tokio runtime")]
    NoRuntime,
}

/// Errors reported by a [`Journal`](crate::persistence::Journal).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JournalError {
    #[error("Sequence conflict for {persistence_id}: expected {expected}, found {found}")]
    SequenceConflict {
        persistence_id: String,
        expected: u64,
        found: u64,
    },
    #[error("Journal unavailable: {0}")]
    Unavailable(String),
}
