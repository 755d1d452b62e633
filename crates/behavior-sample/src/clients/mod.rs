//! # Typed Clients
//!
//! Thin wrappers around an [`ActorRef`](behavior_runtime::ActorRef) that turn the
//! request/reply protocol of an actor into plain async methods.

pub mod account_client;
pub mod stats_client;

pub use account_client::AccountClient;
pub use stats_client::StatsClient;
