//! # System Lifecycle & Orchestration
//!
//! [`SampleSystem`] owns the [`ActorSystem`], starts the long-lived actors and hands out
//! typed clients. Account actors are started on first use, one per account id, and share one
//! journal, so an account spawned again in a new system recovers its history.
//!
//! ```rust,ignore
//! let system = SampleSystem::new()?;
//! let alice = system.open_account("alice")?;
//! alice.create().await?;
//! let mean = system.stats_client.mean_word_length("to be or not").await?;
//! system.shutdown().await;
//! ```
//!
//! Shutdown terminates the actor system: every actor receives `PostStop` and the call returns
//! once all actor tasks have finished.

use crate::account_actor;
use crate::clients::{AccountClient, StatsClient};
use crate::model::AccountEvent;
use crate::stats_actor::{self, StatsSettings};
use behavior_runtime::{
    ActorClient, ActorSystem, InMemoryJournal, Journal, RuntimeError, SystemConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::info;

/// Extra time a stats client waits beyond the service's own job timeout.
const CLIENT_GRACE: Duration = Duration::from_secs(1);

pub struct SampleSystem {
    system: ActorSystem,
    journal: Arc<InMemoryJournal<AccountEvent>>,
    accounts: Mutex<HashMap<String, AccountClient>>,
    pub stats_client: StatsClient,
}

impl SampleSystem {
    pub fn new() -> Result<Self, RuntimeError> {
        Self::with_journal(Arc::new(InMemoryJournal::new()), StatsSettings::default())
    }

    /// Starts the system on an existing journal.
    pub fn with_journal(
        journal: Arc<InMemoryJournal<AccountEvent>>,
        stats: StatsSettings,
    ) -> Result<Self, RuntimeError> {
        let system = ActorSystem::with_config(SystemConfig {
            name: "behavior-sample".to_string(),
            ..SystemConfig::default()
        });
        let client_timeout = stats.job_timeout + CLIENT_GRACE;
        let stats_service = system.spawn(stats_actor::new(stats), "stats")?;
        info!("Sample system started");

        Ok(Self {
            system,
            journal,
            accounts: Mutex::new(HashMap::new()),
            stats_client: StatsClient::new(stats_service, client_timeout),
        })
    }

    pub fn journal(&self) -> &Arc<InMemoryJournal<AccountEvent>> {
        &self.journal
    }

    /// Client of the account `account_id`, starting its actor if it is not running.
    pub fn open_account(&self, account_id: &str) -> Result<AccountClient, RuntimeError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = accounts.get(account_id) {
            if !client.target().is_terminated() {
                return Ok(client.clone());
            }
        }

        let journal: Arc<dyn Journal<AccountEvent>> = self.journal.clone();
        let actor = self.system.spawn(
            account_actor::new(account_id, journal),
            &format!("account-{account_id}"),
        )?;
        info!(account_id, path = actor.path(), "Account actor started");
        let client = AccountClient::new(actor).with_timeout(self.system.config().ask_timeout);
        accounts.insert(account_id.to_string(), client.clone());
        Ok(client)
    }

    pub async fn shutdown(self) {
        info!("Shutting down sample system");
        self.system.terminate().await;
        info!("Sample system stopped");
    }
}
