//! # Actor References
//!
//! An [`ActorRef`] is the only way to reach an actor: an opaque, cloneable handle to its
//! mailbox. Delivery is fire-and-forget; [`ActorRef::ask`] layers a request/response
//! exchange on top of it using a temporary reply reference.

use crate::error::RuntimeError;
use crate::message::{Envelope, Message, Signal};
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed handle to an actor's mailbox.
///
/// * **Cheap to clone** – holds the queue sender, the identity and a termination token.
/// * **Compared by identity** – two refs are equal when they address the same mailbox.
/// * **Never blocks** – [`tell`](Self::tell) enqueues and returns; messages to a stopped
///   actor are dropped silently.
pub struct ActorRef<M> {
    id: ActorId,
    path: Arc<str>,
    sender: mpsc::UnboundedSender<Envelope<M>>,
    terminated: CancellationToken,
}

impl<M: Message> ActorRef<M> {
    pub(crate) fn from_parts(
        id: ActorId,
        path: Arc<str>,
        sender: mpsc::UnboundedSender<Envelope<M>>,
        terminated: CancellationToken,
    ) -> Self {
        Self {
            id,
            path,
            sender,
            terminated,
        }
    }

    /// Creates a reference whose mailbox is drained by the caller instead of an actor task.
    ///
    /// Used for ask replies and test probes.
    pub(crate) fn detached(prefix: &str) -> (Self, mpsc::UnboundedReceiver<Envelope<M>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = ActorId::next();
        let path: Arc<str> = Arc::from(format!("/temp/{prefix}-{}", id.as_u64()));
        (
            Self::from_parts(id, path, sender, CancellationToken::new()),
            receiver,
        )
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Enqueues `msg` and returns immediately.
    pub fn tell(&self, msg: M) {
        if !self.enqueue(Envelope::Message(msg)) {
            trace!(actor = %self.id, path = %self.path, "Dead letter");
        }
    }

    /// Sends a request built around a temporary reply reference and waits for the answer.
    ///
    /// Fails with [`RuntimeError::ActorClosed`] if the target is already stopped,
    /// [`RuntimeError::ActorDropped`] if the request was discarded without a reply, and
    /// [`RuntimeError::AskTimeout`] if no reply arrives in time.
    pub async fn ask<R, F>(&self, make_request: F, timeout: Duration) -> Result<R, RuntimeError>
    where
        R: Message,
        F: FnOnce(ActorRef<R>) -> M,
    {
        let (reply_to, mut replies) = ActorRef::<R>::detached("ask");
        let reply_token = reply_to.terminated.clone();

        // The request owns the only sender of the reply queue, so a request that gets
        // dropped closes the queue and ends the wait early.
        if !self.enqueue(Envelope::Message(make_request(reply_to))) {
            reply_token.cancel();
            return Err(RuntimeError::ActorClosed);
        }

        let outcome = tokio::time::timeout(timeout, async {
            while let Some(envelope) = replies.recv().await {
                if let Envelope::Message(reply) = envelope {
                    return Ok(reply);
                }
            }
            Err(RuntimeError::ActorDropped)
        })
        .await;
        reply_token.cancel();

        outcome.map_err(|_| RuntimeError::AskTimeout(timeout))?
    }

    /// Returns `true` once the actor behind this reference has stopped.
    pub fn is_terminated(&self) -> bool {
        self.terminated.is_cancelled() || self.sender.is_closed()
    }

    /// Resolves when the actor behind this reference has stopped.
    pub async fn terminated(&self) {
        self.terminated.cancelled().await
    }

    pub(crate) fn enqueue(&self, envelope: Envelope<M>) -> bool {
        self.sender.send(envelope).is_ok()
    }

    pub(crate) fn signal(&self, signal: Signal) {
        if !self.enqueue(Envelope::Signal(signal)) {
            trace!(actor = %self.id, path = %self.path, "Dead signal");
        }
    }

    pub(crate) fn request_stop(&self) {
        if !self.enqueue(Envelope::Stop) {
            trace!(actor = %self.id, path = %self.path, "Stop for terminated actor ignored");
        }
    }

    pub(crate) fn termination_token(&self) -> CancellationToken {
        self.terminated.clone()
    }

    pub(crate) fn stop_handle(&self) -> StopHandle {
        let target = self.clone();
        StopHandle {
            terminated: self.terminated.clone(),
            stop: Arc::new(move || target.request_stop()),
        }
    }
}

impl<M> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            path: Arc::clone(&self.path),
            sender: self.sender.clone(),
            terminated: self.terminated.clone(),
        }
    }
}

impl<M> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for ActorRef<M> {}

impl<M> Hash for ActorRef<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<M> Debug for ActorRef<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorRef")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

/// Type-erased stop capability kept by parents for their children.
#[derive(Clone)]
pub(crate) struct StopHandle {
    pub(crate) terminated: CancellationToken,
    stop: Arc<dyn Fn() + Send + Sync>,
}

impl StopHandle {
    pub(crate) fn stop(&self) {
        (self.stop)()
    }
}
