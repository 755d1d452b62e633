//! # Behavior Runtime
//!
//! This crate is a typed actor runtime in which an actor's reaction to messages is a
//! first-class value, a [`Behavior`], that each message handler may replace.
//!
//! ## Why behaviors?
//!
//! In the classic actor model an actor is an object with a `receive` method and mutable
//! fields. Here an actor *is* its current behavior:
//!
//! - The handler for message *n* returns the behavior that handles message *n + 1*
//! - State lives in what the behavior captures, so a state change is a behavior change
//! - The runtime guarantees one message at a time per actor, so no locks are needed
//!
//! Everything else in the crate is built from that one idea: interceptors wrap behaviors,
//! finite state machines compile to behaviors, routers are behaviors that forward.
//!
//! **Further Reading**:
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model) - Foundational concurrency pattern by Carl Hewitt
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! 1. **Dispatch Layer** ([`ActorSystem`], [`ActorRef`], [`Context`]) - Mailboxes, the
//!    per-actor dispatch loop, children, watches and timers
//! 2. **Behavior Layer** ([`Behavior`], [`behaviors`], [`Interceptor`]) - What an actor does
//!    with a message and what it becomes afterwards
//! 3. **Composition Layer** ([`fsm`], [`Routers`], [`persistence`]) - State machines,
//!    routers and event sourcing, each expressed as a behavior
//! 4. **Interface Layer** ([`ActorClient`], [`testkit`]) - Typed request/response clients
//!    and test tools
//!
//! ## Quick Start
//!
//! ```rust
//! use behavior_runtime::{behaviors, ActorRef, ActorSystem, Behavior};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! enum Counter {
//!     Add(u64),
//!     Get { reply_to: ActorRef<u64> },
//! }
//!
//! fn counter(total: u64) -> Behavior<Counter> {
//!     behaviors::receive_message(move |msg| match msg {
//!         Counter::Add(n) => counter(total + n),
//!         Counter::Get { reply_to } => {
//!             reply_to.tell(total);
//!             behaviors::same()
//!         }
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let system = ActorSystem::new("quick-start");
//!     let actor = system.spawn(counter(0), "counter").unwrap();
//!
//!     actor.tell(Counter::Add(2));
//!     actor.tell(Counter::Add(3));
//!     let total = actor
//!         .ask(|reply_to| Counter::Get { reply_to }, Duration::from_secs(1))
//!         .await
//!         .unwrap();
//!     assert_eq!(total, 5);
//!
//!     system.terminate().await;
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task under the system's task tracker
//! - Envelopes are processed **sequentially** and in FIFO order within an actor
//! - Multiple actors run in **parallel**
//! - `tell` never blocks; a message to a stopped actor is dropped
//!
//! ## Testing
//!
//! The [`testkit`] module provides a [`TestProbe`](testkit::TestProbe) for observing actors
//! from a test and an [`EventSourcedTestKit`](testkit::EventSourcedTestKit) for driving an
//! event-sourced entity synchronously.

mod actor;
pub mod actor_ref;
pub mod behavior;
pub mod behaviors;
pub mod client;
pub mod context;
pub mod error;
pub mod fsm;
pub mod interceptor;
pub mod message;
pub mod persistence;
pub mod receptionist;
pub mod router;
pub mod routing;
pub mod system;
pub mod testkit;
pub mod timer;
pub mod tracing;

// Re-export core types for convenience
pub use actor_ref::{ActorId, ActorRef};
pub use behavior::{Behavior, ExtensibleBehavior};
pub use client::{ActorClient, DEFAULT_ASK_TIMEOUT};
pub use context::Context;
pub use error::{JournalError, RuntimeError};
pub use fsm::{FsmBuilder, FsmEvent, Transition};
pub use interceptor::{Interceptor, ReceiveTarget, SignalTarget};
pub use message::{Message, Signal, TimerKey, UnhandledMessage};
pub use persistence::{
    event_sourced, Effect, EventSourcedEntity, InMemoryJournal, Journal, PersistenceId,
};
pub use receptionist::{Receptionist, ServiceKey};
pub use router::{GroupRouter, PoolRouter, Routers};
pub use routing::RoutingPolicy;
pub use system::{ActorSystem, SystemConfig};
pub use timer::TimerScheduler;
