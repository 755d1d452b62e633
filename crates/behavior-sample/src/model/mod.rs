//! # Domain Model
//!
//! Messages, events and state shared by the sample actors. Everything here is plain data;
//! the behavior lives in [`account_actor`](crate::account_actor) and
//! [`stats_actor`](crate::stats_actor).

pub mod account;
pub mod stats;

pub use account::*;
pub use stats::*;
