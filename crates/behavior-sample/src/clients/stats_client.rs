//! # Stats Client
//!
//! Provides a high-level API for the stats service.
use crate::model::{StatsJob, StatsResult};
use crate::stats_actor::StatsError;
use async_trait::async_trait;
use behavior_runtime::{ActorClient, ActorRef, RuntimeError};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct StatsClient {
    target: ActorRef<StatsJob>,
    timeout: Duration,
}

impl StatsClient {
    /// `timeout` bounds the whole request and should exceed the service's job timeout, so
    /// a slow job reports [`StatsError::JobFailed`] rather than an ask timeout.
    pub fn new(target: ActorRef<StatsJob>, timeout: Duration) -> Self {
        Self { target, timeout }
    }
}

#[async_trait]
impl ActorClient for StatsClient {
    type Command = StatsJob;
    type Error = StatsError;

    fn target(&self) -> &ActorRef<StatsJob> {
        &self.target
    }

    fn map_error(e: RuntimeError) -> Self::Error {
        StatsError::from(e)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl StatsClient {
    /// Mean word length of `text`.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn mean_word_length(&self, text: &str) -> Result<f64, StatsError> {
        let text = text.to_string();
        debug!("Sending request");
        match self.request(move |reply_to| StatsJob { text, reply_to }).await? {
            StatsResult::Completed { mean_word_length } => Ok(mean_word_length),
            StatsResult::JobFailed { reason } => Err(StatsError::JobFailed(reason)),
        }
    }
}
