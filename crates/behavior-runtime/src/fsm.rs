//! # Finite State Machines
//!
//! [`FsmBuilder`] describes an actor as a set of named states, a data value carried between
//! them and one handler per state. Building it with [`FsmBuilder::initialize`] yields an
//! ordinary [`Behavior`].
//!
//! ## Semantics
//!
//! * Handlers see the event and the current data and answer with a [`Transition`]:
//!   `goto`, `stay`, `stop` or `unhandled`, optionally with new data (`using`) and a state
//!   timeout (`for_max`).
//! * State and data change together, before any transition observer runs.
//! * Observers run once per `goto`, including `goto` to the current state. `stay` never
//!   notifies them.
//! * When the actor starts, observers see `(initial, initial)` before any message.
//! * An event whose state has no handler, or whose handler answers `unhandled`, goes to the
//!   `when_unhandled` handler if there is one; otherwise it is reported as unhandled.
//! * A state timeout is an [`FsmEvent::StateTimeout`] delivered when the state receives no
//!   event for the configured duration. Every handled event restarts it.
//!
//! ```rust
//! use behavior_runtime::fsm::{self, FsmBuilder, FsmEvent, Transition};
//!
//! let behavior = FsmBuilder::<&'static str, String, String>::new()
//!     .start_with("start", "data".to_string())
//!     .when("start", |_ctx, event| match event.event {
//!         FsmEvent::Message(msg) if msg == "next" => Transition::goto("next"),
//!         _ => Transition::unhandled(),
//!     })
//!     .when("next", fsm::null_handler)
//!     .initialize()
//!     .unwrap();
//! # let _ = behavior;
//! ```

use crate::behavior::{Behavior, ExtensibleBehavior};
use crate::behaviors;
use crate::context::Context;
use crate::error::RuntimeError;
use crate::message::{Message, Signal};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const STATE_TIMEOUT: &str = "fsm-state-timeout";

/// Bounds required of FSM state names.
pub trait FsmState: Debug + Clone + Eq + Hash + Send + Sync + 'static {}

impl<T: Debug + Clone + Eq + Hash + Send + Sync + 'static> FsmState for T {}

#[derive(Debug)]
pub enum FsmEvent<M> {
    Message(M),
    StateTimeout,
}

/// What a state handler sees: the event and the current state data.
pub struct Event<'a, M, D> {
    pub event: &'a FsmEvent<M>,
    pub state_data: &'a D,
}

impl<M, D> Clone for Event<'_, M, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, D> Copy for Event<'_, M, D> {}

impl<'a, M, D> Event<'a, M, D> {
    /// The message, unless this is a state timeout.
    pub fn message(&self) -> Option<&'a M> {
        match self.event {
            FsmEvent::Message(msg) => Some(msg),
            FsmEvent::StateTimeout => None,
        }
    }
}

#[derive(Debug)]
enum Target<S> {
    Goto(S),
    Stay,
    Stop,
    Unhandled,
}

/// A handler's answer to an event.
#[derive(Debug)]
pub struct Transition<S, D> {
    target: Target<S>,
    data: Option<D>,
    timeout: Option<Duration>,
}

impl<S, D> Transition<S, D> {
    fn to(target: Target<S>) -> Self {
        Self {
            target,
            data: None,
            timeout: None,
        }
    }

    pub fn goto(state: S) -> Self {
        Self::to(Target::Goto(state))
    }

    pub fn stay() -> Self {
        Self::to(Target::Stay)
    }

    pub fn stop() -> Self {
        Self::to(Target::Stop)
    }

    pub fn unhandled() -> Self {
        Self::to(Target::Unhandled)
    }

    /// Replaces the state data along with the transition.
    pub fn using(self, data: D) -> Self {
        Self {
            data: Some(data),
            ..self
        }
    }

    /// Overrides the state timeout of the target state for this visit.
    pub fn for_max(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn is_unhandled(&self) -> bool {
        matches!(self.target, Target::Unhandled)
    }
}

type StateHandler<S, D, M> =
    Arc<dyn Fn(&mut Context<M>, Event<'_, M, D>) -> Transition<S, D> + Send + Sync>;
type TransitionObserver<S> = Arc<dyn Fn(&S, &S) + Send + Sync>;
type TerminationHook<S, D> = Arc<dyn Fn(&S, &D) + Send + Sync>;

fn state_handler<S, D, M, F>(handler: F) -> StateHandler<S, D, M>
where
    F: Fn(&mut Context<M>, Event<'_, M, D>) -> Transition<S, D> + Send + Sync + 'static,
{
    Arc::new(handler)
}

struct StateEntry<S, D, M> {
    handler: StateHandler<S, D, M>,
    timeout: Option<Duration>,
}

/// Handler that accepts nothing: every event is unhandled.
pub fn null_handler<S, D, M: Message>(
    _ctx: &mut Context<M>,
    _event: Event<'_, M, D>,
) -> Transition<S, D> {
    Transition::unhandled()
}

pub struct FsmBuilder<S, D, M> {
    initial: Option<(S, D)>,
    states: HashMap<S, StateEntry<S, D, M>>,
    unhandled: Option<StateHandler<S, D, M>>,
    observers: Vec<TransitionObserver<S>>,
    termination: Vec<TerminationHook<S, D>>,
}

impl<S, D, M> Default for FsmBuilder<S, D, M>
where
    S: FsmState,
    D: Send + 'static,
    M: Message,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, D, M> FsmBuilder<S, D, M>
where
    S: FsmState,
    D: Send + 'static,
    M: Message,
{
    pub fn new() -> Self {
        Self {
            initial: None,
            states: HashMap::new(),
            unhandled: None,
            observers: Vec::new(),
            termination: Vec::new(),
        }
    }

    pub fn start_with(self, state: S, data: D) -> Self {
        Self {
            initial: Some((state, data)),
            ..self
        }
    }

    /// Registers the handler of `state`.
    ///
    /// Registering a second handler for the same state chains them: the later handler sees
    /// the events the earlier one left unhandled.
    pub fn when<F>(self, state: S, handler: F) -> Self
    where
        F: Fn(&mut Context<M>, Event<'_, M, D>) -> Transition<S, D> + Send + Sync + 'static,
    {
        self.register(state, state_handler(handler), None)
    }

    /// Like [`when`](Self::when), with a state timeout for `state`.
    pub fn when_with_timeout<F>(self, state: S, timeout: Duration, handler: F) -> Self
    where
        F: Fn(&mut Context<M>, Event<'_, M, D>) -> Transition<S, D> + Send + Sync + 'static,
    {
        self.register(state, state_handler(handler), Some(timeout))
    }

    /// Fallback for events that no state handler accepted.
    pub fn when_unhandled<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Context<M>, Event<'_, M, D>) -> Transition<S, D> + Send + Sync + 'static,
    {
        Self {
            unhandled: Some(state_handler(handler)),
            ..self
        }
    }

    /// Adds an observer called with `(from, to)` after every `goto`.
    pub fn on_transition<F>(mut self, observer: F) -> Self
    where
        F: Fn(&S, &S) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Adds a hook called with the final state and data when the FSM stops.
    pub fn on_termination<F>(mut self, hook: F) -> Self
    where
        F: Fn(&S, &D) + Send + Sync + 'static,
    {
        self.termination.push(Arc::new(hook));
        self
    }

    /// Produces the FSM's behavior. Fails if no start state was set.
    pub fn initialize(self) -> Result<Behavior<M>, RuntimeError> {
        let (state, data) = self.initial.ok_or(RuntimeError::MissingInitialState)?;
        let definition = Arc::new(FsmDefinition {
            states: self.states,
            unhandled: self.unhandled,
            observers: self.observers,
            termination: self.termination,
        });

        Ok(behaviors::setup(move |ctx| {
            let fsm = FsmBehavior {
                definition,
                state,
                data,
                terminated: false,
            };
            info!(state = ?fsm.state, "FSM initialized");
            fsm.notify(&fsm.state, &fsm.state);
            fsm.schedule_timeout(ctx, None);
            Behavior::extensible(fsm)
        }))
    }

    fn register(
        mut self,
        state: S,
        handler: StateHandler<S, D, M>,
        timeout: Option<Duration>,
    ) -> Self {
        let entry = match self.states.remove(&state) {
            Some(previous) => {
                let first = previous.handler;
                let chained = state_handler(move |ctx, event| {
                    let transition = first(ctx, event);
                    if transition.is_unhandled() {
                        handler(ctx, event)
                    } else {
                        transition
                    }
                });
                StateEntry {
                    handler: chained,
                    timeout: timeout.or(previous.timeout),
                }
            }
            None => StateEntry { handler, timeout },
        };
        self.states.insert(state, entry);
        self
    }
}

struct FsmDefinition<S, D, M> {
    states: HashMap<S, StateEntry<S, D, M>>,
    unhandled: Option<StateHandler<S, D, M>>,
    observers: Vec<TransitionObserver<S>>,
    termination: Vec<TerminationHook<S, D>>,
}

struct FsmBehavior<S, D, M> {
    definition: Arc<FsmDefinition<S, D, M>>,
    state: S,
    data: D,
    terminated: bool,
}

impl<S, D, M> FsmBehavior<S, D, M>
where
    S: FsmState,
    D: Send + 'static,
    M: Message,
{
    fn handle(&mut self, ctx: &mut Context<M>, event: FsmEvent<M>) -> Behavior<M> {
        let definition = Arc::clone(&self.definition);
        let transition = {
            let event = Event {
                event: &event,
                state_data: &self.data,
            };
            let transition = match definition.states.get(&self.state) {
                Some(entry) => (entry.handler)(ctx, event),
                None => {
                    debug!(state = ?self.state, "No handler for state");
                    Transition::unhandled()
                }
            };
            match &definition.unhandled {
                Some(fallback) if transition.is_unhandled() => fallback(ctx, event),
                _ => transition,
            }
        };
        self.apply(ctx, transition)
    }

    fn apply(&mut self, ctx: &mut Context<M>, transition: Transition<S, D>) -> Behavior<M> {
        let Transition {
            target,
            data,
            timeout,
        } = transition;
        if let Some(data) = data {
            self.data = data;
        }

        match target {
            Target::Goto(next) => {
                let previous = std::mem::replace(&mut self.state, next);
                debug!(from = ?previous, to = ?self.state, "Transition");
                self.notify(&previous, &self.state);
                self.schedule_timeout(ctx, timeout);
                behaviors::same()
            }
            Target::Stay => {
                self.schedule_timeout(ctx, timeout);
                behaviors::same()
            }
            Target::Unhandled => {
                self.schedule_timeout(ctx, None);
                behaviors::unhandled()
            }
            Target::Stop => {
                debug!(state = ?self.state, "FSM stopping");
                self.terminate();
                behaviors::stopped()
            }
        }
    }

    fn notify(&self, from: &S, to: &S) {
        for observer in &self.definition.observers {
            observer(from, to);
        }
    }

    fn schedule_timeout(&self, ctx: &mut Context<M>, explicit: Option<Duration>) {
        let timeout = explicit.or_else(|| {
            self.definition
                .states
                .get(&self.state)
                .and_then(|entry| entry.timeout)
        });
        match timeout {
            Some(timeout) => ctx.timers().start_signal_timer(STATE_TIMEOUT, timeout),
            None => ctx.timers().cancel(STATE_TIMEOUT),
        }
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        for hook in &self.definition.termination {
            hook(&self.state, &self.data);
        }
    }
}

impl<S, D, M> ExtensibleBehavior<M> for FsmBehavior<S, D, M>
where
    S: FsmState,
    D: Send + 'static,
    M: Message,
{
    fn receive(&mut self, ctx: &mut Context<M>, msg: M) -> Behavior<M> {
        self.handle(ctx, FsmEvent::Message(msg))
    }

    fn receive_signal(&mut self, ctx: &mut Context<M>, signal: &Signal) -> Behavior<M> {
        match signal {
            Signal::Timeout(key) if key.as_str() == STATE_TIMEOUT => {
                debug!(state = ?self.state, "State timeout");
                self.handle(ctx, FsmEvent::StateTimeout)
            }
            Signal::PostStop => {
                self.terminate();
                behaviors::same()
            }
            _ => behaviors::unhandled(),
        }
    }
}
