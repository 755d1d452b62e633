//! # Actor Context
//!
//! The [`Context`] is handed to every handler invocation. It is the actor's view of the
//! runtime: its own reference, the system it lives in, its children, its watches and its
//! timers. A context is only ever touched by the actor's own task.

use crate::actor_ref::{ActorId, ActorRef, StopHandle};
use crate::behavior::Behavior;
use crate::error::RuntimeError;
use crate::message::{Message, Signal};
use crate::system::ActorSystem;
use crate::timer::TimerScheduler;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct Context<M> {
    self_ref: ActorRef<M>,
    system: ActorSystem,
    children: HashMap<ActorId, StopHandle>,
    watching: HashMap<ActorId, CancellationToken>,
    timers: TimerScheduler<M>,
    anonymous: u64,
}

impl<M: Message> Context<M> {
    pub(crate) fn new(self_ref: ActorRef<M>, system: ActorSystem) -> Self {
        let timers = TimerScheduler::new(self_ref.clone());
        Self {
            self_ref,
            system,
            children: HashMap::new(),
            watching: HashMap::new(),
            timers,
            anonymous: 0,
        }
    }

    pub fn self_ref(&self) -> &ActorRef<M> {
        &self.self_ref
    }

    pub fn id(&self) -> ActorId {
        self.self_ref.id()
    }

    pub fn path(&self) -> &str {
        self.self_ref.path()
    }

    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    pub fn timers(&mut self) -> &mut TimerScheduler<M> {
        &mut self.timers
    }

    /// Spawns a child actor. Children are stopped when this actor stops.
    ///
    /// A child that stops on its own is forgotten once its termination reaches this actor's
    /// mailbox. `Terminated` is only handed to the behavior if the child is also watched.
    pub fn spawn<C: Message>(
        &mut self,
        behavior: Behavior<C>,
        name: &str,
    ) -> Result<ActorRef<C>, RuntimeError> {
        let path = format!("{}/{}", self.self_ref.path(), name);
        let child = self.system.spawn_at(behavior, path)?;
        self.forward_termination(
            child.id(),
            child.termination_token(),
            self.self_ref.termination_token(),
        );
        self.children.insert(child.id(), child.stop_handle());
        Ok(child)
    }

    /// Spawns a child with a generated name.
    pub fn spawn_anonymous<C: Message>(
        &mut self,
        behavior: Behavior<C>,
    ) -> Result<ActorRef<C>, RuntimeError> {
        self.anonymous += 1;
        let name = format!("$a{}", self.anonymous);
        self.spawn(behavior, &name)
    }

    /// Ids of the children that are still running.
    pub fn children(&mut self) -> Vec<ActorId> {
        self.children
            .retain(|_, child| !child.terminated.is_cancelled());
        self.children.keys().copied().collect()
    }

    /// Requests a child to stop. Returns `false` if `child` is not a child of this actor.
    pub fn stop<C: Message>(&mut self, child: &ActorRef<C>) -> bool {
        match self.children.remove(&child.id()) {
            Some(handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Delivers [`Signal::Terminated`] when `other` stops.
    ///
    /// Watching an already terminated actor delivers the signal right away.
    pub fn watch<T: Message>(&mut self, other: &ActorRef<T>) {
        let target = other.id();
        if self.watching.contains_key(&target) {
            return;
        }
        let cancel = CancellationToken::new();
        self.forward_termination(target, other.termination_token(), cancel.clone());
        debug!(watcher = %self.id(), watched = %target, "Watch");
        self.watching.insert(target, cancel);
    }

    /// Enqueues `Terminated(target)` into this actor's mailbox once `watched` is cancelled,
    /// unless `cancel` fires or the system shuts down first.
    fn forward_termination(
        &self,
        target: ActorId,
        watched: CancellationToken,
        cancel: CancellationToken,
    ) {
        let shutdown = self.system.shutdown_token();
        let watcher = self.self_ref.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = watched.cancelled() => watcher.signal(Signal::Terminated(target)),
                _ = cancel.cancelled() => {}
                _ = shutdown.cancelled() => {}
            }
        });
    }

    pub fn unwatch<T: Message>(&mut self, other: &ActorRef<T>) {
        if let Some(cancel) = self.watching.remove(&other.id()) {
            cancel.cancel();
        }
    }

    /// Forgets a terminated child and consumes the watch on `id`, if any. Returns whether
    /// the behavior should see the signal: unwatched actors and repeated signals are
    /// filtered out.
    pub(crate) fn accept_terminated(&mut self, id: ActorId) -> bool {
        self.children.remove(&id);
        self.watching.remove(&id).is_some()
    }

    /// Releases everything the actor holds: timers, watches and children.
    pub(crate) fn release(&mut self) {
        self.timers.cancel_all();
        for (_, cancel) in self.watching.drain() {
            cancel.cancel();
        }
        for (_, child) in self.children.drain() {
            child.stop();
        }
    }
}
