//! # Interceptors
//!
//! An [`Interceptor`] wraps a behavior and sees every message (and signal) before the
//! wrapped behavior does. It decides whether to call the inner behavior through the
//! [`ReceiveTarget`] it is handed, and it may transform the message or the result on the way.
//!
//! ## Chain semantics
//!
//! * Interceptors stack: the outermost one runs first.
//! * A message the interceptor does not [`accept`](Interceptor::accepts) goes straight to the
//!   inner behavior; the hook is never invoked for it.
//! * When the inner behavior switches to a new behavior, the interceptor stays in place and
//!   wraps the replacement.
//! * A hook that returns [`behaviors::detach`](crate::behaviors::detach) removes *its own*
//!   interceptor from the chain.

use crate::behavior::{
    interpret_message, interpret_signal, plain, resolve, Behavior, ExtensibleBehavior, Kind,
    Outcome,
};
use crate::context::Context;
use crate::message::{Message, Signal};
use crate::ActorRef;
use tracing::debug;

pub(crate) type InterceptorFactory<M> = Box<dyn FnOnce() -> Box<dyn Interceptor<M>> + Send>;

/// Hook that runs around the message and signal handling of a wrapped behavior.
pub trait Interceptor<M: Message>: Send {
    /// Message filter. Messages for which this returns `false` bypass the hook.
    fn accepts(&self, _msg: &M) -> bool {
        true
    }

    fn accepts_signal(&self, _signal: &Signal) -> bool {
        true
    }

    fn around_receive(
        &mut self,
        ctx: &mut Context<M>,
        msg: M,
        target: ReceiveTarget<'_, M>,
    ) -> Behavior<M>;

    fn around_signal(
        &mut self,
        ctx: &mut Context<M>,
        signal: &Signal,
        target: SignalTarget<'_, M>,
    ) -> Behavior<M> {
        target.call(ctx, signal)
    }
}

/// The inner behavior, callable at most once for the current message.
pub struct ReceiveTarget<'a, M> {
    inner: &'a mut Behavior<M>,
}

impl<M: Message> ReceiveTarget<'_, M> {
    pub fn call(self, ctx: &mut Context<M>, msg: M) -> Behavior<M> {
        plain(interpret_message(self.inner, ctx, msg))
    }
}

/// The inner behavior, callable at most once for the current signal.
pub struct SignalTarget<'a, M> {
    inner: &'a mut Behavior<M>,
}

impl<M: Message> SignalTarget<'_, M> {
    pub fn call(self, ctx: &mut Context<M>, signal: &Signal) -> Behavior<M> {
        plain(interpret_signal(self.inner, ctx, signal))
    }
}

/// Started form of `behaviors::intercept`.
pub(crate) struct InterceptorBehavior<M> {
    interceptor: Box<dyn Interceptor<M>>,
    inner: Behavior<M>,
}

impl<M: Message> InterceptorBehavior<M> {
    pub(crate) fn new(interceptor: Box<dyn Interceptor<M>>, inner: Behavior<M>) -> Self {
        Self { interceptor, inner }
    }

    fn settle(&mut self, ctx: &mut Context<M>, next: Behavior<M>) -> Behavior<M> {
        match next.0 {
            Kind::Detached(replacement) => match replacement.0 {
                // Detach while keeping the current inner behavior.
                Kind::Same | Kind::Unhandled => {
                    debug!(behavior = self.inner.name(), "Interceptor detached");
                    std::mem::replace(&mut self.inner, Behavior(Kind::Empty))
                }
                other => Behavior(other),
            },
            other => match resolve(Behavior(other), ctx) {
                Outcome::Same => Behavior::same(),
                Outcome::Unhandled => Behavior::unhandled(),
                Outcome::Stopped => Behavior::stopped(),
                Outcome::Replace(started) => {
                    self.inner = started;
                    Behavior::same()
                }
            },
        }
    }
}

impl<M: Message> ExtensibleBehavior<M> for InterceptorBehavior<M> {
    fn receive(&mut self, ctx: &mut Context<M>, msg: M) -> Behavior<M> {
        let next = if self.interceptor.accepts(&msg) {
            let target = ReceiveTarget {
                inner: &mut self.inner,
            };
            self.interceptor.around_receive(ctx, msg, target)
        } else {
            plain(interpret_message(&mut self.inner, ctx, msg))
        };
        self.settle(ctx, next)
    }

    fn receive_signal(&mut self, ctx: &mut Context<M>, signal: &Signal) -> Behavior<M> {
        let next = if self.interceptor.accepts_signal(signal) {
            let target = SignalTarget {
                inner: &mut self.inner,
            };
            self.interceptor.around_signal(ctx, signal, target)
        } else {
            plain(interpret_signal(&mut self.inner, ctx, signal))
        };
        self.settle(ctx, next)
    }
}

/// Forwards a copy of every message to a monitor before handling it.
pub(crate) struct MonitorInterceptor<M> {
    pub(crate) monitor: ActorRef<M>,
}

impl<M: Message + Clone> Interceptor<M> for MonitorInterceptor<M> {
    fn around_receive(
        &mut self,
        ctx: &mut Context<M>,
        msg: M,
        target: ReceiveTarget<'_, M>,
    ) -> Behavior<M> {
        self.monitor.tell(msg.clone());
        target.call(ctx, msg)
    }
}

/// Logs every message and signal at `debug` before handling it.
pub(crate) struct LogMessagesInterceptor;

impl<M: Message> Interceptor<M> for LogMessagesInterceptor {
    fn around_receive(
        &mut self,
        ctx: &mut Context<M>,
        msg: M,
        target: ReceiveTarget<'_, M>,
    ) -> Behavior<M> {
        debug!(actor = %ctx.id(), message = ?msg, "Received message");
        target.call(ctx, msg)
    }

    fn around_signal(
        &mut self,
        ctx: &mut Context<M>,
        signal: &Signal,
        target: SignalTarget<'_, M>,
    ) -> Behavior<M> {
        debug!(actor = %ctx.id(), ?signal, "Received signal");
        target.call(ctx, signal)
    }
}
