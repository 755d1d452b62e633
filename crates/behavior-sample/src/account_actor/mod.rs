//! # Account Actor
//!
//! An event-sourced bank account built on
//! [`EventSourcedEntity`](behavior_runtime::EventSourcedEntity).
//!
//! ## Structure
//!
//! - [`entity`] - [`AccountEntity`], the command and event handlers
//! - [`error`] - [`AccountError`] returned by the [`AccountClient`](crate::clients::AccountClient)
//! - [`new()`] - Builds the actor's behavior for one account
//!
//! ## Command Handling
//!
//! | State    | Accepts                                              |
//! |----------|------------------------------------------------------|
//! | `Empty`  | `CreateAccount` (anything else is unhandled)         |
//! | `Opened` | everything; overdrafts and non-empty closes rejected |
//! | `Closed` | `GetBalance` (0); everything else rejected           |
//!
//! Rejections are replies, not failures: they persist nothing and leave the actor running.
//!
//! ## Usage
//!
//! ```rust
//! use behavior_sample::account_actor;
//! use behavior_sample::clients::AccountClient;
//! use behavior_sample::model::AccountEvent;
//! use behavior_runtime::{ActorSystem, InMemoryJournal};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = ActorSystem::new("bank");
//!     let journal = Arc::new(InMemoryJournal::<AccountEvent>::new());
//!     let account = system.spawn(account_actor::new("alice", journal), "account-alice")?;
//!     let client = AccountClient::new(account);
//!
//!     client.create().await?;
//!     client.deposit(100).await?;
//!     assert_eq!(client.balance().await?, 100);
//!
//!     system.terminate().await;
//!     Ok(())
//! }
//! ```

pub mod entity;
pub mod error;

pub use entity::*;
pub use error::*;

use crate::model::{AccountCommand, AccountEvent};
use behavior_runtime::{event_sourced, Behavior, Journal, PersistenceId};
use std::sync::Arc;

/// Entity type name used in persistence ids.
pub const ENTITY_TYPE: &str = "Account";

pub fn persistence_id(account_id: &str) -> PersistenceId {
    PersistenceId::of(ENTITY_TYPE, account_id)
}

/// Behavior of the account `account_id`, recovering from and persisting to `journal`.
pub fn new(
    account_id: &str,
    journal: Arc<dyn Journal<AccountEvent>>,
) -> Behavior<AccountCommand> {
    event_sourced(persistence_id(account_id), AccountEntity, journal)
}
