use behavior_runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatsError {
    #[error("Stats job failed: {0}")]
    JobFailed(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<RuntimeError> for StatsError {
    fn from(e: RuntimeError) -> Self {
        StatsError::ActorCommunicationError(e.to_string())
    }
}
