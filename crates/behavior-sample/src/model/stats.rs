use behavior_runtime::ActorRef;
use serde::{Deserialize, Serialize};

/// A request to compute the mean word length of `text`.
#[derive(Debug)]
pub struct StatsJob {
    pub text: String,
    pub reply_to: ActorRef<StatsResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatsResult {
    Completed { mean_word_length: f64 },
    JobFailed { reason: String },
}

/// One word of a job, sent to a worker. Workers answer the aggregator in `reply_to`.
#[derive(Debug, Clone)]
pub struct ProcessWord {
    pub word: String,
    pub reply_to: ActorRef<AggregatorEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorEvent {
    WordLength(usize),
}
