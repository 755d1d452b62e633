//! # Stats Service
//!
//! Computes the mean word length of a text by fanning its words out to a pool of workers.
//!
//! ## Structure
//!
//! - [`worker`] - [`StatsWorker`], computes and caches word lengths
//! - [`aggregator`] - one short-lived child per job that collects the lengths
//! - [`error`] - [`StatsError`] returned by the [`StatsClient`](crate::clients::StatsClient)
//! - [`new()`] - the service behavior
//!
//! ## Flow
//!
//! ```text
//! StatsJob ──▶ service ──spawn──▶ aggregator ◀── WordLength ── worker
//!                 │                                              ▲
//!                 └──── ProcessWord (hashed by word) ──▶ pool ───┘
//! ```
//!
//! The worker pool routes by consistent hashing on the word, so repeated words land on the
//! worker that already cached them.

pub mod aggregator;
pub mod error;
pub mod worker;

pub use aggregator::aggregator;
pub use error::*;
pub use worker::StatsWorker;

use crate::model::{ProcessWord, StatsJob, StatsResult};
use behavior_runtime::{behaviors, Behavior, Context, Routers};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Tuning for the stats service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsSettings {
    pub workers: usize,
    pub virtual_nodes_factor: usize,
    #[serde(with = "duration_millis")]
    pub job_timeout: Duration,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            virtual_nodes_factor: 10,
            job_timeout: Duration::from_secs(3),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Behavior of the stats service.
pub fn new(settings: StatsSettings) -> Behavior<StatsJob> {
    behaviors::setup(move |ctx: &mut Context<StatsJob>| {
        let pool = match Routers::pool(settings.workers, StatsWorker::behavior) {
            Ok(pool) => pool.with_consistent_hash_routing(
                settings.virtual_nodes_factor,
                |msg: &ProcessWord| msg.word.clone(),
            ),
            Err(e) => {
                warn!(error = %e, "Invalid worker pool, stopping stats service");
                return behaviors::stopped();
            }
        };
        let workers = match ctx.spawn(Behavior::from(pool), "workers") {
            Ok(workers) => workers,
            Err(e) => {
                warn!(error = %e, "Failed to spawn workers, stopping stats service");
                return behaviors::stopped();
            }
        };
        info!(workers = settings.workers, "Stats service started");

        let job_timeout = settings.job_timeout;
        behaviors::receive(move |ctx, job: StatsJob| {
            let StatsJob { text, reply_to } = job;
            let words: Vec<&str> = text.split_whitespace().collect();
            if words.is_empty() {
                reply_to.tell(StatsResult::JobFailed {
                    reason: "Empty text".to_string(),
                });
                return behaviors::same();
            }

            let collector = aggregator(words.len(), reply_to.clone(), job_timeout);
            let collector = match ctx.spawn_anonymous(collector) {
                Ok(collector) => collector,
                Err(e) => {
                    warn!(error = %e, "Failed to spawn aggregator");
                    reply_to.tell(StatsResult::JobFailed {
                        reason: e.to_string(),
                    });
                    return behaviors::same();
                }
            };
            for word in words {
                workers.tell(ProcessWord {
                    word: word.to_string(),
                    reply_to: collector.clone(),
                });
            }
            behaviors::same()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_read_job_timeout_in_millis() {
        let settings: StatsSettings = toml::from_str(
            r#"
            workers = 8
            job_timeout = 1500
            "#,
        )
        .unwrap();

        assert_eq!(settings.workers, 8);
        assert_eq!(settings.virtual_nodes_factor, 10);
        assert_eq!(settings.job_timeout, Duration::from_millis(1500));
    }
}
