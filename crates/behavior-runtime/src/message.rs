//! # Messages, Signals and Envelopes
//!
//! User messages and lifecycle signals travel through the same mailbox but reach a
//! behavior through separate entry points. The [`Envelope`] is the mailbox item that
//! carries either of them, plus the runtime's own control items (timer fires and stop
//! requests).

use crate::actor_ref::ActorId;
use std::borrow::Cow;
use std::fmt::{Debug, Display};

/// Marker for values that can be delivered to an actor.
///
/// Every `Debug + Send + 'static` type qualifies. The `Debug` bound is what lets the
/// runtime name messages in diagnostics without knowing anything else about them.
pub trait Message: Debug + Send + 'static {}

impl<T: Debug + Send + 'static> Message for T {}

/// Lifecycle notifications delivered through a behavior's signal entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Delivered exactly once to the last behavior of an actor that stopped.
    PostStop,
    /// A watched actor terminated.
    Terminated(ActorId),
    /// A signal timer started with [`TimerScheduler::start_signal_timer`] fired.
    ///
    /// [`TimerScheduler::start_signal_timer`]: crate::timer::TimerScheduler::start_signal_timer
    Timeout(TimerKey),
}

/// Name of a scheduled timer, unique within one actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey(Cow<'static, str>);

impl TimerKey {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TimerKey {
    fn from(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }
}

impl From<String> for TimerKey {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

impl Display for TimerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Item stored in an actor's mailbox.
pub(crate) enum Envelope<M> {
    Message(M),
    Signal(Signal),
    /// A timer fired. Stale generations are discarded by the receiving actor, which makes
    /// cancellation race-free even when the fire is already queued.
    Timer {
        key: TimerKey,
        generation: u64,
        payload: TimerPayload<M>,
    },
    /// External stop request, processed in mailbox order.
    Stop,
}

pub(crate) enum TimerPayload<M> {
    Message(M),
    Signal,
}

impl<M> Envelope<M> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Envelope::Message(_) => "message",
            Envelope::Signal(_) => "signal",
            Envelope::Timer { .. } => "timer",
            Envelope::Stop => "stop",
        }
    }
}

/// Diagnostic record published when a behavior leaves a message unhandled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledMessage {
    pub actor: ActorId,
    pub path: String,
    pub message_type: &'static str,
}
