//! # Timers
//!
//! Each actor owns a [`TimerScheduler`]. A timer is a background task that sleeps and then
//! enqueues a fire into the owner's mailbox, so timer deliveries are ordered with every other
//! message the actor receives.
//!
//! Every start of a key bumps its *generation*. A fire carries the generation it was
//! scheduled with and the owner drops fires whose generation is no longer current, which
//! makes `cancel` effective even when the fire is already sitting in the mailbox.

use crate::actor_ref::ActorRef;
use crate::message::{Envelope, Message, TimerKey, TimerPayload};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

struct ActiveTimer {
    generation: u64,
    repeating: bool,
    cancel: CancellationToken,
}

pub struct TimerScheduler<M> {
    owner: ActorRef<M>,
    timers: HashMap<TimerKey, ActiveTimer>,
    generation: u64,
}

impl<M: Message> TimerScheduler<M> {
    pub(crate) fn new(owner: ActorRef<M>) -> Self {
        Self {
            owner,
            timers: HashMap::new(),
            generation: 0,
        }
    }

    /// Delivers `msg` once after `delay`. Replaces any timer with the same key.
    pub fn start_single_timer(&mut self, key: impl Into<TimerKey>, msg: M, delay: Duration) {
        let mut msg = Some(msg);
        self.schedule(key.into(), delay, None, move || {
            msg.take().map(TimerPayload::Message)
        });
    }

    /// Delivers [`Signal::Timeout`](crate::Signal::Timeout) once after `delay`.
    pub fn start_signal_timer(&mut self, key: impl Into<TimerKey>, delay: Duration) {
        self.schedule(key.into(), delay, None, || Some(TimerPayload::Signal));
    }

    pub fn cancel(&mut self, key: impl Into<TimerKey>) {
        let key = key.into();
        if let Some(timer) = self.timers.remove(&key) {
            timer.cancel.cancel();
            trace!(%key, "Timer cancelled");
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.cancel.cancel();
        }
    }

    pub fn is_timer_active(&self, key: impl Into<TimerKey>) -> bool {
        self.timers.contains_key(&key.into())
    }

    /// Checks a fire against the current generation of its key.
    ///
    /// Returns `false` for stale fires. A valid single-shot fire retires its key.
    pub(crate) fn accept(&mut self, key: &TimerKey, generation: u64) -> bool {
        match self.timers.get(key) {
            Some(timer) if timer.generation == generation => {
                if !timer.repeating {
                    self.timers.remove(key);
                }
                true
            }
            _ => false,
        }
    }

    fn schedule<F>(
        &mut self,
        key: TimerKey,
        delay: Duration,
        interval: Option<Duration>,
        mut next: F,
    )
    where
        F: FnMut() -> Option<TimerPayload<M>> + Send + 'static,
    {
        self.cancel(key.clone());
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();

        let owner = self.owner.clone();
        let owner_stopped = owner.termination_token();
        let stop = cancel.clone();
        let fire_key = key.clone();
        tokio::spawn(async move {
            let mut wait = delay;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = owner_stopped.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {
                        let Some(payload) = next() else { break };
                        let envelope = Envelope::Timer {
                            key: fire_key.clone(),
                            generation,
                            payload,
                        };
                        if !owner.enqueue(envelope) {
                            break;
                        }
                        match interval {
                            Some(interval) => wait = interval,
                            None => break,
                        }
                    }
                }
            }
        });

        debug!(%key, ?delay, ?interval, "Timer started");
        self.timers.insert(
            key,
            ActiveTimer {
                generation,
                repeating: interval.is_some(),
                cancel,
            },
        );
    }
}

impl<M: Message + Clone> TimerScheduler<M> {
    /// Delivers `msg` every `interval`, starting after one interval.
    pub fn start_timer_with_fixed_delay(
        &mut self,
        key: impl Into<TimerKey>,
        msg: M,
        interval: Duration,
    ) {
        self.schedule(key.into(), interval, Some(interval), move || {
            Some(TimerPayload::Message(msg.clone()))
        });
    }
}
