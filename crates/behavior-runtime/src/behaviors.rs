//! Constructors for [`Behavior`] values.
//!
//! ```rust
//! use behavior_runtime::{behaviors, Behavior};
//!
//! fn counter(total: u64) -> Behavior<u64> {
//!     behaviors::receive_message(move |n: u64| {
//!         if n == 0 {
//!             behaviors::stopped()
//!         } else {
//!             counter(total + n)
//!         }
//!     })
//! }
//! ```

use crate::behavior::{Behavior, Kind};
use crate::context::Context;
use crate::interceptor::{Interceptor, LogMessagesInterceptor, MonitorInterceptor};
use crate::message::{Message, Signal};
use crate::ActorRef;

/// Keep the current behavior.
pub fn same<M>() -> Behavior<M> {
    Behavior::same()
}

/// Keep the current behavior and report the input as unhandled.
pub fn unhandled<M>() -> Behavior<M> {
    Behavior::unhandled()
}

/// Stop the actor after the current message.
pub fn stopped<M>() -> Behavior<M> {
    Behavior::stopped()
}

/// A live behavior that treats every message as unhandled.
pub fn empty<M>() -> Behavior<M> {
    Behavior(Kind::Empty)
}

/// A live behavior that accepts and discards every message and signal.
pub fn ignore<M>() -> Behavior<M> {
    Behavior(Kind::Ignore)
}

pub fn receive<M, F>(on_message: F) -> Behavior<M>
where
    M: Message,
    F: Fn(&mut Context<M>, M) -> Behavior<M> + Send + 'static,
{
    Behavior(Kind::Receive {
        on_message: Some(Box::new(on_message)),
        on_signal: None,
    })
}

/// Like [`receive`] for handlers that do not need the context.
pub fn receive_message<M, F>(on_message: F) -> Behavior<M>
where
    M: Message,
    F: Fn(M) -> Behavior<M> + Send + 'static,
{
    receive(move |_ctx, msg| on_message(msg))
}

/// A behavior that only reacts to signals; messages are unhandled.
pub fn receive_signal<M, F>(on_signal: F) -> Behavior<M>
where
    M: Message,
    F: Fn(&mut Context<M>, &Signal) -> Behavior<M> + Send + 'static,
{
    Behavior(Kind::Receive {
        on_message: None,
        on_signal: Some(Box::new(on_signal)),
    })
}

pub fn receive_with_signals<M, F, G>(on_message: F, on_signal: G) -> Behavior<M>
where
    M: Message,
    F: Fn(&mut Context<M>, M) -> Behavior<M> + Send + 'static,
    G: Fn(&mut Context<M>, &Signal) -> Behavior<M> + Send + 'static,
{
    Behavior(Kind::Receive {
        on_message: Some(Box::new(on_message)),
        on_signal: Some(Box::new(on_signal)),
    })
}

/// Defers construction until the behavior is started, giving access to the context.
///
/// The factory runs once per start: when the actor is spawned, or when a handler returns
/// this behavior as its next behavior.
pub fn setup<M, F>(factory: F) -> Behavior<M>
where
    M: Message,
    F: FnOnce(&mut Context<M>) -> Behavior<M> + Send + 'static,
{
    Behavior(Kind::Setup(Box::new(factory)))
}

/// Wraps `behavior` with an interceptor created fresh when the behavior starts.
pub fn intercept<M, I, F>(interceptor: F, behavior: Behavior<M>) -> Behavior<M>
where
    M: Message,
    I: Interceptor<M> + 'static,
    F: FnOnce() -> I + Send + 'static,
{
    Behavior(Kind::Intercept {
        factory: Box::new(move || Box::new(interceptor()) as Box<dyn Interceptor<M>>),
        inner: Box::new(behavior),
    })
}

/// Returned from an interceptor hook to remove that interceptor.
///
/// `detach(same())` keeps the wrapped behavior as it is; any other argument becomes the
/// next behavior in place of the interceptor.
pub fn detach<M>(next: Behavior<M>) -> Behavior<M> {
    Behavior(Kind::Detached(Box::new(next)))
}

/// Sends a copy of every message to `monitor` before `behavior` handles it.
pub fn monitor<M>(monitor: ActorRef<M>, behavior: Behavior<M>) -> Behavior<M>
where
    M: Message + Clone,
{
    intercept(move || MonitorInterceptor { monitor }, behavior)
}

/// Logs every message and signal at `debug` before `behavior` handles it.
pub fn log_messages<M: Message>(behavior: Behavior<M>) -> Behavior<M> {
    intercept(|| LogMessagesInterceptor, behavior)
}
