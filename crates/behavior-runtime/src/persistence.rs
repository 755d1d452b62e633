//! # Event-Sourced Behaviors
//!
//! An [`EventSourcedEntity`] defines a stateful actor whose state is never written directly.
//! Commands are turned into events, events are appended to a [`Journal`], and the state is
//! the fold of all events over an empty state.
//!
//! # Architecture Note
//! Writing the command handler and the event handler *once* in the entity trait lets the
//! runtime own everything around them: recovery on start, the append, the fold and the
//! replies. Associated types keep commands, events and state of different entities apart at
//! compile time.
//!
//! ## Lifecycle
//!
//! 1. **Recovery** – on start, the journal is replayed through `apply_event`.
//! 2. **Command** – `handle_command` inspects the current state and returns an [`Effect`].
//! 3. **Persist** – the effect's events are appended; on success they are applied in order.
//! 4. **Side effects** – `then_reply` / `then_run` callbacks see the updated state.
//!
//! A journal failure stops the actor. Its state is then unknown and a fresh incarnation
//! recovers from whatever the journal holds.

use crate::actor_ref::ActorRef;
use crate::behavior::{Behavior, ExtensibleBehavior};
use crate::behaviors;
use crate::context::Context;
use crate::error::JournalError;
use crate::message::Message;
use dashmap::DashMap;
use std::fmt::{Debug, Display};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stable identity of an event stream: `{entity_type}|{entity_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersistenceId(String);

impl PersistenceId {
    pub fn of(entity_type: &str, entity_id: &str) -> Self {
        Self(format!("{entity_type}|{entity_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PersistenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only event storage.
pub trait Journal<E>: Send + Sync {
    /// Appends `events` after `expected_sequence_nr` events and returns the new sequence
    /// number. Fails with [`JournalError::SequenceConflict`] if the stream moved on.
    fn append(
        &self,
        persistence_id: &PersistenceId,
        expected_sequence_nr: u64,
        events: &[E],
    ) -> Result<u64, JournalError>;

    fn replay(&self, persistence_id: &PersistenceId) -> Result<Vec<E>, JournalError>;
}

/// Process-local journal, shared by cloning the `Arc` it is created in.
pub struct InMemoryJournal<E> {
    streams: DashMap<PersistenceId, Vec<E>>,
}

impl<E> Default for InMemoryJournal<E> {
    fn default() -> Self {
        Self {
            streams: DashMap::new(),
        }
    }
}

impl<E: Clone + Send + Sync> InMemoryJournal<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self, persistence_id: &PersistenceId) -> Vec<E> {
        self.streams
            .get(persistence_id)
            .map(|stream| stream.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, persistence_id: &PersistenceId) {
        self.streams.remove(persistence_id);
    }
}

impl<E: Clone + Send + Sync> Journal<E> for InMemoryJournal<E> {
    fn append(
        &self,
        persistence_id: &PersistenceId,
        expected_sequence_nr: u64,
        events: &[E],
    ) -> Result<u64, JournalError> {
        let mut stream = self.streams.entry(persistence_id.clone()).or_default();
        let found = stream.len() as u64;
        if found != expected_sequence_nr {
            return Err(JournalError::SequenceConflict {
                persistence_id: persistence_id.to_string(),
                expected: expected_sequence_nr,
                found,
            });
        }
        stream.extend_from_slice(events);
        Ok(stream.len() as u64)
    }

    fn replay(&self, persistence_id: &PersistenceId) -> Result<Vec<E>, JournalError> {
        Ok(self.events(persistence_id))
    }
}

type Callback<S> = Box<dyn FnOnce(&S) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EffectKind {
    Persist,
    None,
    Unhandled,
}

/// What a command handler asks the runtime to do.
pub struct Effect<E, S> {
    kind: EffectKind,
    events: Vec<E>,
    callbacks: Vec<Callback<S>>,
    stop: bool,
}

impl<E, S: 'static> Effect<E, S> {
    fn with(kind: EffectKind, events: Vec<E>) -> Self {
        Self {
            kind,
            events,
            callbacks: Vec::new(),
            stop: false,
        }
    }

    pub fn persist(event: E) -> Self {
        Self::with(EffectKind::Persist, vec![event])
    }

    pub fn persist_all(events: Vec<E>) -> Self {
        Self::with(EffectKind::Persist, events)
    }

    /// Changes nothing. Callbacks still run.
    pub fn none() -> Self {
        Self::with(EffectKind::None, Vec::new())
    }

    pub fn unhandled() -> Self {
        Self::with(EffectKind::Unhandled, Vec::new())
    }

    /// Replies without persisting anything.
    pub fn reply<R: Message>(reply_to: ActorRef<R>, reply: R) -> Self {
        Self::none().then_run(move |_| reply_to.tell(reply))
    }

    /// Runs `callback` with the state after the events were applied.
    pub fn then_run(mut self, callback: impl FnOnce(&S) + Send + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn then_reply<R, F>(self, reply_to: ActorRef<R>, reply: F) -> Self
    where
        R: Message,
        F: FnOnce(&S) -> R + Send + 'static,
    {
        self.then_run(move |state| reply_to.tell(reply(state)))
    }

    /// Stops the actor once events and callbacks are done.
    pub fn then_stop(self) -> Self {
        Self { stop: true, ..self }
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }
}

/// Contract of an event-sourced actor.
pub trait EventSourcedEntity: Send + 'static {
    type Command: Message;
    type Event: Clone + Debug + Send + Sync + 'static;
    type State: Debug + Send + 'static;

    fn empty_state(&self) -> Self::State;

    /// Decides what a command does. Must not change anything itself.
    fn handle_command(
        &self,
        state: &Self::State,
        command: Self::Command,
    ) -> Effect<Self::Event, Self::State>;

    /// Derives the next state from a persisted event.
    fn apply_event(&self, state: Self::State, event: &Self::Event) -> Self::State;
}

pub(crate) enum CommandOutcome<E> {
    Applied { events: Vec<E>, stop: bool },
    Unhandled,
    Failed(JournalError),
}

/// Command processing shared by the actor and the test kit.
pub(crate) struct EventSourcedRunner<T: EventSourcedEntity> {
    entity: T,
    persistence_id: PersistenceId,
    journal: Arc<dyn Journal<T::Event>>,
    state: T::State,
    sequence_nr: u64,
}

impl<T: EventSourcedEntity> EventSourcedRunner<T> {
    pub(crate) fn recover(
        entity: T,
        persistence_id: PersistenceId,
        journal: Arc<dyn Journal<T::Event>>,
    ) -> Result<Self, JournalError> {
        let events = journal.replay(&persistence_id)?;
        let sequence_nr = events.len() as u64;
        let state = events
            .iter()
            .fold(entity.empty_state(), |state, event| entity.apply_event(state, event));
        Ok(Self {
            entity,
            persistence_id,
            journal,
            state,
            sequence_nr,
        })
    }

    pub(crate) fn state(&self) -> &T::State {
        &self.state
    }

    pub(crate) fn persistence_id(&self) -> &PersistenceId {
        &self.persistence_id
    }

    pub(crate) fn sequence_nr(&self) -> u64 {
        self.sequence_nr
    }

    pub(crate) fn process(&mut self, command: T::Command) -> CommandOutcome<T::Event> {
        debug!(persistence_id = %self.persistence_id, ?command, "Command");
        let Effect {
            kind,
            events,
            callbacks,
            stop,
        } = self.entity.handle_command(&self.state, command);

        if kind == EffectKind::Unhandled {
            return CommandOutcome::Unhandled;
        }

        if !events.is_empty() {
            match self
                .journal
                .append(&self.persistence_id, self.sequence_nr, &events)
            {
                Ok(sequence_nr) => self.sequence_nr = sequence_nr,
                Err(e) => return CommandOutcome::Failed(e),
            }
            let state = std::mem::replace(&mut self.state, self.entity.empty_state());
            let entity = &self.entity;
            self.state = events
                .iter()
                .fold(state, |state, event| entity.apply_event(state, event));
            debug!(
                persistence_id = %self.persistence_id,
                persisted = events.len(),
                sequence_nr = self.sequence_nr,
                "Persisted"
            );
        }

        for callback in callbacks {
            callback(&self.state);
        }
        CommandOutcome::Applied { events, stop }
    }
}

/// Behavior of an actor backed by `entity`, recovering from and persisting to `journal`.
pub fn event_sourced<T: EventSourcedEntity>(
    persistence_id: PersistenceId,
    entity: T,
    journal: Arc<dyn Journal<T::Event>>,
) -> Behavior<T::Command> {
    behaviors::setup(move |_ctx| {
        match EventSourcedRunner::recover(entity, persistence_id.clone(), journal) {
            Ok(runner) => {
                info!(
                    persistence_id = %runner.persistence_id(),
                    sequence_nr = runner.sequence_nr(),
                    "Recovered"
                );
                Behavior::extensible(EventSourcedBehavior { runner })
            }
            Err(e) => {
                warn!(%persistence_id, error = %e, "Recovery failed");
                behaviors::stopped()
            }
        }
    })
}

struct EventSourcedBehavior<T: EventSourcedEntity> {
    runner: EventSourcedRunner<T>,
}

impl<T: EventSourcedEntity> ExtensibleBehavior<T::Command> for EventSourcedBehavior<T> {
    fn receive(
        &mut self,
        _ctx: &mut Context<T::Command>,
        command: T::Command,
    ) -> Behavior<T::Command> {
        match self.runner.process(command) {
            CommandOutcome::Applied { stop: true, .. } => behaviors::stopped(),
            CommandOutcome::Applied { .. } => behaviors::same(),
            CommandOutcome::Unhandled => behaviors::unhandled(),
            CommandOutcome::Failed(e) => {
                warn!(
                    persistence_id = %self.runner.persistence_id(),
                    error = %e,
                    "Persist failed, stopping"
                );
                behaviors::stopped()
            }
        }
    }
}
