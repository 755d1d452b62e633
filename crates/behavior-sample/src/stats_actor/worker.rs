use crate::model::{AggregatorEvent, ProcessWord};
use behavior_runtime::{behaviors, Behavior, Context, ExtensibleBehavior};
use std::collections::HashMap;
use tracing::trace;

/// Computes word lengths, remembering every word it has seen.
///
/// Routed by consistent hashing on the word, so each worker only caches its own share.
#[derive(Debug, Default)]
pub struct StatsWorker {
    cache: HashMap<String, usize>,
}

impl StatsWorker {
    pub fn behavior() -> Behavior<ProcessWord> {
        Behavior::extensible(Self::default())
    }
}

impl ExtensibleBehavior<ProcessWord> for StatsWorker {
    fn receive(
        &mut self,
        ctx: &mut Context<ProcessWord>,
        msg: ProcessWord,
    ) -> Behavior<ProcessWord> {
        let ProcessWord { word, reply_to } = msg;
        let length = match self.cache.get(&word) {
            Some(length) => *length,
            None => {
                let length = word.chars().count();
                trace!(worker = ctx.path(), %word, length, "Cached word");
                self.cache.insert(word, length);
                length
            }
        };
        reply_to.tell(AggregatorEvent::WordLength(length));
        behaviors::same()
    }
}
