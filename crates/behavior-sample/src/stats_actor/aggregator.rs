use crate::model::{AggregatorEvent, StatsResult};
use behavior_runtime::{behaviors, ActorRef, Behavior, Context, ExtensibleBehavior, Signal};
use std::time::Duration;
use tracing::{debug, warn};

const JOB_TIMEOUT: &str = "job-timeout";

/// Collects `expected` word lengths and replies with their mean, then stops.
///
/// If the lengths do not all arrive within `timeout`, the job fails instead.
pub fn aggregator(
    expected: usize,
    reply_to: ActorRef<StatsResult>,
    timeout: Duration,
) -> Behavior<AggregatorEvent> {
    behaviors::setup(move |ctx| {
        ctx.timers().start_signal_timer(JOB_TIMEOUT, timeout);
        Behavior::extensible(Aggregator {
            expected,
            received: 0,
            total_length: 0,
            reply_to,
        })
    })
}

struct Aggregator {
    expected: usize,
    received: usize,
    total_length: usize,
    reply_to: ActorRef<StatsResult>,
}

impl ExtensibleBehavior<AggregatorEvent> for Aggregator {
    fn receive(
        &mut self,
        ctx: &mut Context<AggregatorEvent>,
        msg: AggregatorEvent,
    ) -> Behavior<AggregatorEvent> {
        let AggregatorEvent::WordLength(length) = msg;
        self.received += 1;
        self.total_length += length;
        if self.received < self.expected {
            return behaviors::same();
        }
        let mean_word_length = self.total_length as f64 / self.received as f64;
        debug!(job = ctx.path(), mean_word_length, "Job completed");
        self.reply_to.tell(StatsResult::Completed { mean_word_length });
        behaviors::stopped()
    }

    fn receive_signal(
        &mut self,
        ctx: &mut Context<AggregatorEvent>,
        signal: &Signal,
    ) -> Behavior<AggregatorEvent> {
        match signal {
            Signal::Timeout(key) if key.as_str() == JOB_TIMEOUT => {
                warn!(
                    job = ctx.path(),
                    received = self.received,
                    expected = self.expected,
                    "Job timed out"
                );
                self.reply_to.tell(StatsResult::JobFailed {
                    reason: "Service unavailable, try again later".to_string(),
                });
                behaviors::stopped()
            }
            _ => behaviors::unhandled(),
        }
    }
}
