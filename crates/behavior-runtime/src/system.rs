//! # Actor System
//!
//! The [`ActorSystem`] is the root of a tree of actors. It owns the configuration, the task
//! tracker every actor runs under, the [`Receptionist`] and the diagnostic hooks for unhandled
//! messages. Handles are cheap to clone and all of them address the same system.
//!
//! ```rust
//! use behavior_runtime::{behaviors, ActorSystem};
//!
//! #[tokio::main]
//! async fn main() {
//!     let system = ActorSystem::new("docs");
//!     let echo = system
//!         .spawn(behaviors::receive_message(|msg: String| {
//!             println!("{msg}");
//!             behaviors::same()
//!         }), "echo")
//!         .unwrap();
//!     echo.tell("hello".to_string());
//!     system.terminate().await;
//! }
//! ```

use crate::actor::ActorCell;
use crate::actor_ref::{ActorId, ActorRef};
use crate::behavior::Behavior;
use crate::client::DEFAULT_ASK_TIMEOUT;
use crate::error::RuntimeError;
use crate::message::{Message, UnhandledMessage};
use crate::receptionist::Receptionist;
use serde::Deserialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Settings of an [`ActorSystem`].
///
/// Deserializable so it can be embedded in an application's own configuration file;
/// missing fields fall back to [`SystemConfig::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub name: String,
    /// Messages an actor processes before yielding its worker thread.
    pub throughput: usize,
    /// Log a summary of envelopes discarded when an actor stops.
    pub log_dead_letters: bool,
    /// Timeout applications hand to their clients' requests.
    pub ask_timeout: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "behavior-system".to_string(),
            throughput: 5,
            log_dead_letters: true,
            ask_timeout: DEFAULT_ASK_TIMEOUT,
        }
    }
}

type UnhandledHook = Arc<dyn Fn(&UnhandledMessage) + Send + Sync>;

struct SystemInner {
    config: SystemConfig,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    receptionist: Receptionist,
    unhandled_hooks: RwLock<Vec<UnhandledHook>>,
}

#[derive(Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

impl ActorSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(SystemConfig {
            name: name.into(),
            ..SystemConfig::default()
        })
    }

    pub fn with_config(config: SystemConfig) -> Self {
        info!(system = %config.name, throughput = config.throughput, "Actor system started");
        Self {
            inner: Arc::new(SystemInner {
                config,
                shutdown: CancellationToken::new(),
                tracker: TaskTracker::new(),
                receptionist: Receptionist::default(),
                unhandled_hooks: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    pub fn receptionist(&self) -> &Receptionist {
        &self.inner.receptionist
    }

    /// Spawns a top-level actor under `/user/{name}`.
    ///
    /// The behavior is started on the actor's own task, so `setup` factories run there.
    pub fn spawn<M: Message>(
        &self,
        behavior: Behavior<M>,
        name: &str,
    ) -> Result<ActorRef<M>, RuntimeError> {
        self.spawn_at(behavior, format!("/user/{name}"))
    }

    pub(crate) fn spawn_at<M: Message>(
        &self,
        behavior: Behavior<M>,
        path: String,
    ) -> Result<ActorRef<M>, RuntimeError> {
        if self.is_terminated() {
            return Err(RuntimeError::SystemTerminated(self.name().to_string()));
        }
        if behavior.is_directive() {
            return Err(RuntimeError::InvalidInitialBehavior(behavior.name()));
        }
        tokio::runtime::Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let actor_ref = ActorRef::from_parts(
            ActorId::next(),
            Arc::from(path),
            sender,
            CancellationToken::new(),
        );
        debug!(actor = %actor_ref.id(), path = actor_ref.path(), "Spawn");
        let cell = ActorCell::new(actor_ref.clone(), receiver, self.clone());
        self.inner.tracker.spawn(cell.run(behavior));
        Ok(actor_ref)
    }

    /// Asks an actor to stop after the envelopes already in its mailbox.
    ///
    /// Stopping an actor that is already stopped has no effect.
    pub fn stop<M: Message>(&self, actor: &ActorRef<M>) {
        actor.request_stop();
    }

    /// Registers a hook that observes every unhandled message in this system.
    pub fn on_unhandled(&self, hook: impl Fn(&UnhandledMessage) + Send + Sync + 'static) {
        self.inner
            .unhandled_hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    pub(crate) fn publish_unhandled(&self, record: UnhandledMessage) {
        debug!(
            actor = %record.actor,
            path = %record.path,
            message_type = record.message_type,
            "Unhandled message"
        );
        let hooks = self
            .inner
            .unhandled_hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in hooks {
            hook(&record);
        }
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Stops every actor and waits for their tasks to finish.
    pub async fn terminate(&self) {
        info!(system = %self.name(), actors = self.inner.tracker.len(), "Terminating");
        self.inner.shutdown.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        info!(system = %self.name(), "Terminated");
    }
}

impl std::fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.name())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_reads_from_toml_with_defaults() {
        let config: SystemConfig = toml::from_str(
            r#"
            name = "orders"
            throughput = 10
            ask_timeout = { secs = 5, nanos = 0 }
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            SystemConfig {
                name: "orders".to_string(),
                throughput: 10,
                log_dead_letters: true,
                ask_timeout: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: SystemConfig = toml::from_str("").unwrap();
        assert_eq!(config, SystemConfig::default());
    }
}
