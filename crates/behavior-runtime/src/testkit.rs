//! # Test Kit
//!
//! Tools for testing behaviors, in two flavors:
//!
//! | Tool | Runs | Use Case |
//! |------|------|----------|
//! | [`TestProbe`] | Inside a real system | Observing what actors send, asserting on timing and termination |
//! | [`EventSourcedTestKit`] | Synchronously, no actors | Unit testing an [`EventSourcedEntity`] command by command |
//!
//! The assertions panic with a descriptive message, like `assert!`, so they are meant for
//! test code only.
//!
//! ## Probe Example
//!
//! ```rust
//! use behavior_runtime::testkit::TestProbe;
//! use behavior_runtime::{behaviors, ActorSystem};
//!
//! #[tokio::main]
//! async fn main() {
//!     let system = ActorSystem::new("docs");
//!     let mut probe = TestProbe::<String>::new();
//!     let reply_to = probe.actor_ref();
//!     let echo = system
//!         .spawn(behaviors::receive_message(move |msg: String| {
//!             reply_to.tell(msg);
//!             behaviors::same()
//!         }), "echo")
//!         .unwrap();
//!
//!     echo.tell("hello".to_string());
//!     probe.expect_message("hello".to_string()).await;
//!     system.terminate().await;
//! }
//! ```

use crate::actor_ref::ActorRef;
use crate::message::{Envelope, Message};
use crate::persistence::{
    CommandOutcome, EventSourcedEntity, EventSourcedRunner, InMemoryJournal, Journal,
    PersistenceId,
};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default time a probe waits for a message.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// A mailbox read by the test instead of by an actor.
pub struct TestProbe<M> {
    actor_ref: ActorRef<M>,
    receiver: mpsc::UnboundedReceiver<Envelope<M>>,
    timeout: Duration,
}

impl<M: Message> Default for TestProbe<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> TestProbe<M> {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let (actor_ref, receiver) = ActorRef::detached("probe");
        Self {
            actor_ref,
            receiver,
            timeout,
        }
    }

    /// Reference to hand to the actors under test.
    pub fn actor_ref(&self) -> ActorRef<M> {
        self.actor_ref.clone()
    }

    /// Waits for the next message.
    pub async fn receive_message(&mut self) -> M {
        let timeout = self.timeout;
        match self.next_message(timeout).await {
            Some(msg) => msg,
            None => panic!("timeout ({timeout:?}) while waiting for a message"),
        }
    }

    /// Waits for the next message and asserts it equals `expected`.
    pub async fn expect_message(&mut self, expected: M) -> M
    where
        M: PartialEq,
    {
        let received = self.receive_message().await;
        assert_eq!(received, expected, "unexpected message");
        received
    }

    /// Waits for the next message and asserts it satisfies `predicate`.
    pub async fn expect_message_matching<F>(&mut self, description: &str, predicate: F) -> M
    where
        F: FnOnce(&M) -> bool,
    {
        let received = self.receive_message().await;
        assert!(
            predicate(&received),
            "expected {description}, received {received:?}"
        );
        received
    }

    /// Waits for `n` messages, each within the probe timeout.
    pub async fn receive_messages(&mut self, n: usize) -> Vec<M> {
        let mut received = Vec::with_capacity(n);
        for _ in 0..n {
            received.push(self.receive_message().await);
        }
        received
    }

    /// Asserts nothing arrives within `within`.
    pub async fn expect_no_message(&mut self, within: Duration) {
        if let Some(msg) = self.next_message(within).await {
            panic!("expected no message within {within:?}, received {msg:?}");
        }
    }

    /// Waits until `actor` has terminated.
    pub async fn expect_terminated<T: Message>(&self, actor: &ActorRef<T>) {
        if tokio::time::timeout(self.timeout, actor.terminated())
            .await
            .is_err()
        {
            panic!(
                "timeout ({:?}) while waiting for {} to terminate",
                self.timeout,
                actor.path()
            );
        }
    }

    async fn next_message(&mut self, within: Duration) -> Option<M> {
        let receiver = &mut self.receiver;
        tokio::time::timeout(within, async {
            while let Some(envelope) = receiver.recv().await {
                if let Envelope::Message(msg) = envelope {
                    return Some(msg);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }
}

impl<M> Drop for TestProbe<M> {
    fn drop(&mut self) {
        self.receiver.close();
    }
}

/// Result of [`EventSourcedTestKit::run_command`].
#[derive(Debug)]
pub struct CommandResult<E, S> {
    pub events: Vec<E>,
    pub state: S,
    pub unhandled: bool,
}

impl<E: Debug, S> CommandResult<E, S> {
    /// The single event the command persisted.
    pub fn event(&self) -> &E {
        match self.events.as_slice() {
            [event] => event,
            events => panic!("expected exactly one event, got {events:?}"),
        }
    }

    pub fn has_no_events(&self) -> bool {
        self.events.is_empty()
    }
}

/// Result of [`EventSourcedTestKit::run_command_with_reply`].
#[derive(Debug)]
pub struct CommandResultWithReply<E, S, R> {
    pub events: Vec<E>,
    pub state: S,
    pub reply: Option<R>,
}

impl<E: Debug, S, R: Debug> CommandResultWithReply<E, S, R> {
    pub fn event(&self) -> &E {
        match self.events.as_slice() {
            [event] => event,
            events => panic!("expected exactly one event, got {events:?}"),
        }
    }

    pub fn has_no_events(&self) -> bool {
        self.events.is_empty()
    }

    /// The reply the command sent.
    pub fn reply(&self) -> &R {
        match &self.reply {
            Some(reply) => reply,
            None => panic!("expected a reply, none was sent"),
        }
    }
}

/// Runs an [`EventSourcedEntity`] synchronously against an in-memory journal.
pub struct EventSourcedTestKit<T: EventSourcedEntity> {
    runner: EventSourcedRunner<T>,
    journal: Arc<InMemoryJournal<T::Event>>,
}

impl<T> EventSourcedTestKit<T>
where
    T: EventSourcedEntity + Clone,
    T::State: Clone,
{
    pub fn new(persistence_id: PersistenceId, entity: T) -> Self {
        let journal = Arc::new(InMemoryJournal::new());
        let runner = Self::recover(entity, persistence_id, &journal);
        Self { runner, journal }
    }

    pub fn state(&self) -> &T::State {
        self.runner.state()
    }

    /// Every event persisted so far.
    pub fn persisted_events(&self) -> Vec<T::Event> {
        self.journal.events(self.runner.persistence_id())
    }

    pub fn run_command(&mut self, command: T::Command) -> CommandResult<T::Event, T::State> {
        let (events, unhandled) = self.process(command);
        CommandResult {
            events,
            state: self.runner.state().clone(),
            unhandled,
        }
    }

    /// Builds the command around a reply reference and captures what is sent to it.
    pub fn run_command_with_reply<R, F>(
        &mut self,
        make_command: F,
    ) -> CommandResultWithReply<T::Event, T::State, R>
    where
        R: Message,
        F: FnOnce(ActorRef<R>) -> T::Command,
    {
        let (reply_to, mut replies) = ActorRef::<R>::detached("reply");
        let (events, _) = self.process(make_command(reply_to));
        let reply = match replies.try_recv() {
            Ok(Envelope::Message(reply)) => Some(reply),
            _ => None,
        };
        CommandResultWithReply {
            events,
            state: self.runner.state().clone(),
            reply,
        }
    }

    /// Recovers a fresh entity from the journal, as a restarted actor would.
    pub fn restart(&mut self, entity: T) {
        let persistence_id = self.runner.persistence_id().clone();
        self.runner = Self::recover(entity, persistence_id, &self.journal);
    }

    /// Drops all persisted events and resets the state.
    pub fn clear(&mut self, entity: T) {
        self.journal.clear(self.runner.persistence_id());
        self.restart(entity);
    }

    fn process(&mut self, command: T::Command) -> (Vec<T::Event>, bool) {
        match self.runner.process(command) {
            CommandOutcome::Applied { events, .. } => (events, false),
            CommandOutcome::Unhandled => (Vec::new(), true),
            CommandOutcome::Failed(e) => panic!("journal failed: {e}"),
        }
    }

    fn recover(
        entity: T,
        persistence_id: PersistenceId,
        journal: &Arc<InMemoryJournal<T::Event>>,
    ) -> EventSourcedRunner<T> {
        let journal: Arc<dyn Journal<T::Event>> = journal.clone();
        match EventSourcedRunner::recover(entity, persistence_id, journal) {
            Ok(runner) => runner,
            Err(e) => panic!("recovery failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_receives_in_order() {
        let mut probe = TestProbe::<u32>::new();
        let target = probe.actor_ref();
        for n in 1..=3 {
            target.tell(n);
        }
        assert_eq!(probe.receive_messages(3).await, vec![1, 2, 3]);
        probe.expect_no_message(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    #[should_panic(expected = "timeout")]
    async fn probe_times_out() {
        let mut probe = TestProbe::<u32>::with_timeout(Duration::from_millis(10));
        probe.receive_message().await;
    }

    #[tokio::test]
    async fn dropped_probe_is_closed() {
        let probe = TestProbe::<u32>::new();
        let target = probe.actor_ref();
        drop(probe);
        assert!(target.is_terminated());
    }
}
