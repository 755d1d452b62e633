//! Error types for the Account actor.

use behavior_runtime::RuntimeError;
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccountError {
    /// The account refused the command, e.g. an overdraft.
    #[error("Account rejected command: {0}")]
    Rejected(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<RuntimeError> for AccountError {
    fn from(e: RuntimeError) -> Self {
        AccountError::ActorCommunicationError(e.to_string())
    }
}
