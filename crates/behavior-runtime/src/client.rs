//! # ActorClient Trait
//!
//! Provides a common interface for typed clients that wrap an [`ActorRef`], adding a default
//! `request` method built on top of [`ActorRef::ask`].

use crate::{ActorRef, Message, RuntimeError};
use async_trait::async_trait;
use std::time::Duration;

/// Timeout used by [`ActorClient::request`] unless a client overrides it.
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(3);

/// Trait for domain-specific clients to inherit request/response plumbing.
///
/// # Example
///
/// ```rust
/// use behavior_runtime::{ActorClient, ActorRef, RuntimeError};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// enum CounterCommand {
///     Get { reply_to: ActorRef<u64> },
/// }
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("counter unavailable: {0}")]
/// struct CounterError(String);
///
/// struct CounterClient {
///     target: ActorRef<CounterCommand>,
/// }
///
/// #[async_trait]
/// impl ActorClient for CounterClient {
///     type Command = CounterCommand;
///     type Error = CounterError;
///
///     fn target(&self) -> &ActorRef<CounterCommand> {
///         &self.target
///     }
///
///     fn map_error(e: RuntimeError) -> Self::Error {
///         CounterError(e.to_string())
///     }
/// }
///
/// async fn usage(client: CounterClient) -> Result<u64, CounterError> {
///     client.request(|reply_to| CounterCommand::Get { reply_to }).await
/// }
/// ```
#[async_trait]
pub trait ActorClient: Send + Sync {
    /// Message type of the actor behind this client.
    type Command: Message;

    /// The client-specific error type.
    type Error: Send;

    fn target(&self) -> &ActorRef<Self::Command>;

    /// Map runtime errors to the client's error type.
    fn map_error(e: RuntimeError) -> Self::Error;

    fn timeout(&self) -> Duration {
        DEFAULT_ASK_TIMEOUT
    }

    /// Fire-and-forget delivery.
    fn tell(&self, command: Self::Command) {
        self.target().tell(command)
    }

    /// Sends a command built around a reply reference and waits for the reply.
    #[tracing::instrument(skip_all)]
    async fn request<R, F>(&self, make_request: F) -> Result<R, Self::Error>
    where
        R: Message,
        F: FnOnce(ActorRef<R>) -> Self::Command + Send + 'static,
    {
        tracing::debug!(target_path = self.target().path(), "Sending request");
        self.target()
            .ask(make_request, self.timeout())
            .await
            .map_err(Self::map_error)
    }
}
