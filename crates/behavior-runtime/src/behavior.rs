//! # Behaviors
//!
//! A [`Behavior`] describes how an actor reacts *right now*. It is an explicit sum type:
//!
//! * **Directives** – `same`, `unhandled`, `stopped` – returned from a handler to say what
//!   happens to the current behavior.
//! * **Live behaviors** – `receive` closures, [`ExtensibleBehavior`] objects, `empty` and
//!   `ignore` – the things that actually process messages.
//! * **Deferred behaviors** – `setup` and `intercept` – templates that are expanded with the
//!   actor's [`Context`] when they become current.
//!
//! Behaviors are never mutated by the runtime; a transition replaces the current value
//! wholesale. Constructors live in [`behaviors`](crate::behaviors).

use crate::context::Context;
use crate::interceptor::{InterceptorBehavior, InterceptorFactory};
use crate::message::{Message, Signal};
use std::fmt::Debug;
use tracing::warn;

pub(crate) type MessageHandler<M> = Box<dyn Fn(&mut Context<M>, M) -> Behavior<M> + Send>;
pub(crate) type SignalHandler<M> = Box<dyn Fn(&mut Context<M>, &Signal) -> Behavior<M> + Send>;
pub(crate) type SetupFn<M> = Box<dyn FnOnce(&mut Context<M>) -> Behavior<M> + Send>;

/// The reactive unit of an actor. See the [module docs](self).
pub struct Behavior<M>(pub(crate) Kind<M>);

pub(crate) enum Kind<M> {
    Same,
    Unhandled,
    Stopped,
    Empty,
    Ignore,
    Receive {
        on_message: Option<MessageHandler<M>>,
        on_signal: Option<SignalHandler<M>>,
    },
    Extensible(Box<dyn ExtensibleBehavior<M>>),
    Setup(SetupFn<M>),
    Intercept {
        factory: InterceptorFactory<M>,
        inner: Box<Behavior<M>>,
    },
    /// Returned from an interceptor hook to drop that interceptor from the chain.
    Detached(Box<Behavior<M>>),
}

/// A behavior implemented as a mutable object.
///
/// The runtime calls it with `&mut self`, one envelope at a time, so the implementation can
/// keep state in plain fields. Returning [`behaviors::same`](crate::behaviors::same) keeps the
/// object as the current behavior.
pub trait ExtensibleBehavior<M>: Send {
    fn receive(&mut self, ctx: &mut Context<M>, msg: M) -> Behavior<M>;

    fn receive_signal(&mut self, _ctx: &mut Context<M>, _signal: &Signal) -> Behavior<M> {
        Behavior::unhandled()
    }
}

impl<M> Behavior<M> {
    pub(crate) fn same() -> Self {
        Self(Kind::Same)
    }

    pub(crate) fn unhandled() -> Self {
        Self(Kind::Unhandled)
    }

    pub(crate) fn stopped() -> Self {
        Self(Kind::Stopped)
    }

    /// Wraps a mutable behavior object.
    pub fn extensible(behavior: impl ExtensibleBehavior<M> + 'static) -> Self {
        Self(Kind::Extensible(Box::new(behavior)))
    }

    /// Short name of the variant, used in logs and errors.
    pub fn name(&self) -> &'static str {
        Self::kind_name(&self.0)
    }

    /// `true` for values that only make sense as a handler's return value.
    pub fn is_directive(&self) -> bool {
        matches!(
            self.0,
            Kind::Same | Kind::Unhandled | Kind::Stopped | Kind::Detached(_)
        )
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.0, Kind::Stopped)
    }

    pub fn is_unhandled(&self) -> bool {
        matches!(self.0, Kind::Unhandled)
    }
}

impl<M> Debug for Behavior<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Behavior::{}", self.name())
    }
}

/// Result of resolving a handler's return value against the behavior that produced it.
pub(crate) enum Outcome<M> {
    Same,
    Unhandled,
    Stopped,
    Replace(Behavior<M>),
}

/// Expands deferred behaviors until a live behavior (or `stopped`) remains.
pub(crate) fn start<M: Message>(behavior: Behavior<M>, ctx: &mut Context<M>) -> Behavior<M> {
    let mut current = behavior;
    loop {
        current = match current.0 {
            Kind::Setup(setup) => setup(ctx),
            Kind::Detached(inner) => *inner,
            Kind::Intercept { factory, inner } => {
                let inner = start(*inner, ctx);
                if inner.is_stopped() {
                    return inner;
                }
                return Behavior::extensible(InterceptorBehavior::new(factory(), inner));
            }
            other => return Behavior(other),
        };
    }
}

/// Interprets `next` as returned by a handler of the current behavior.
pub(crate) fn resolve<M: Message>(next: Behavior<M>, ctx: &mut Context<M>) -> Outcome<M> {
    match plain(next).0 {
        Kind::Same => Outcome::Same,
        Kind::Unhandled => Outcome::Unhandled,
        Kind::Stopped => Outcome::Stopped,
        other => match start(Behavior(other), ctx).0 {
            Kind::Stopped => Outcome::Stopped,
            Kind::Same | Kind::Unhandled => Outcome::Same,
            started => Outcome::Replace(Behavior(started)),
        },
    }
}

/// Strips a `detach` marker that escaped from a non-interceptor behavior.
pub(crate) fn plain<M>(behavior: Behavior<M>) -> Behavior<M> {
    match behavior.0 {
        Kind::Detached(inner) => *inner,
        other => Behavior(other),
    }
}

pub(crate) fn interpret_message<M: Message>(
    behavior: &mut Behavior<M>,
    ctx: &mut Context<M>,
    msg: M,
) -> Behavior<M> {
    match &mut behavior.0 {
        Kind::Receive {
            on_message: Some(handler),
            ..
        } => handler(ctx, msg),
        Kind::Receive {
            on_message: None, ..
        }
        | Kind::Empty => Behavior::unhandled(),
        Kind::Extensible(inner) => inner.receive(ctx, msg),
        Kind::Ignore => Behavior::same(),
        other => {
            warn!(
                behavior = Behavior::<M>::kind_name(other),
                "Message delivered to a behavior that was never started"
            );
            Behavior::unhandled()
        }
    }
}

pub(crate) fn interpret_signal<M: Message>(
    behavior: &mut Behavior<M>,
    ctx: &mut Context<M>,
    signal: &Signal,
) -> Behavior<M> {
    match &mut behavior.0 {
        Kind::Receive {
            on_signal: Some(handler),
            ..
        } => handler(ctx, signal),
        Kind::Extensible(inner) => inner.receive_signal(ctx, signal),
        Kind::Ignore => Behavior::same(),
        _ => Behavior::unhandled(),
    }
}

impl<M> Behavior<M> {
    fn kind_name(kind: &Kind<M>) -> &'static str {
        match kind {
            Kind::Same => "same",
            Kind::Unhandled => "unhandled",
            Kind::Stopped => "stopped",
            Kind::Empty => "empty",
            Kind::Ignore => "ignore",
            Kind::Receive { .. } => "receive",
            Kind::Extensible(_) => "extensible",
            Kind::Setup(_) => "setup",
            Kind::Intercept { .. } => "intercept",
            Kind::Detached(_) => "detached",
        }
    }
}
