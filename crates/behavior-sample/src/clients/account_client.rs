//! # Account Client
//!
//! Provides a high-level API for interacting with one account actor.
//! Rejections in a [`StatusReply`] come back as [`AccountError::Rejected`].
use crate::account_actor::AccountError;
use crate::model::{AccountCommand, StatusReply};
use async_trait::async_trait;
use behavior_runtime::{ActorClient, ActorRef, RuntimeError, DEFAULT_ASK_TIMEOUT};
use std::time::Duration;
use tracing::{debug, instrument};

/// Client for interacting with an Account actor.
#[derive(Clone)]
pub struct AccountClient {
    target: ActorRef<AccountCommand>,
    timeout: Duration,
}

impl AccountClient {
    pub fn new(target: ActorRef<AccountCommand>) -> Self {
        Self {
            target,
            timeout: DEFAULT_ASK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ActorClient for AccountClient {
    type Command = AccountCommand;
    type Error = AccountError;

    fn target(&self) -> &ActorRef<AccountCommand> {
        &self.target
    }

    fn map_error(e: RuntimeError) -> Self::Error {
        AccountError::from(e)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl AccountClient {
    #[instrument(skip(self), fields(account = self.target.path()))]
    pub async fn create(&self) -> Result<(), AccountError> {
        debug!("Sending request");
        self.request(|reply_to| AccountCommand::CreateAccount { reply_to })
            .await
            .and_then(accepted)
    }

    #[instrument(skip(self), fields(account = self.target.path()))]
    pub async fn deposit(&self, amount: u64) -> Result<(), AccountError> {
        debug!("Sending request");
        self.request(move |reply_to| AccountCommand::Deposit { amount, reply_to })
            .await
            .and_then(accepted)
    }

    /// Withdraws `amount`. Fails with [`AccountError::Rejected`] on overdraft.
    #[instrument(skip(self), fields(account = self.target.path()))]
    pub async fn withdraw(&self, amount: u64) -> Result<(), AccountError> {
        debug!("Sending request");
        self.request(move |reply_to| AccountCommand::Withdraw { amount, reply_to })
            .await
            .and_then(accepted)
    }

    #[instrument(skip(self), fields(account = self.target.path()))]
    pub async fn balance(&self) -> Result<u64, AccountError> {
        self.request(|reply_to| AccountCommand::GetBalance { reply_to })
            .await
            .map(|current| current.balance)
    }

    /// Closes the account. Only an empty account can be closed.
    #[instrument(skip(self), fields(account = self.target.path()))]
    pub async fn close(&self) -> Result<(), AccountError> {
        debug!("Sending request");
        self.request(|reply_to| AccountCommand::CloseAccount { reply_to })
            .await
            .and_then(accepted)
    }
}

fn accepted(reply: StatusReply<()>) -> Result<(), AccountError> {
    reply.into_result().map_err(AccountError::Rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use behavior_runtime::{behaviors, ActorSystem};

    /// Answers every command with a fixed rejection.
    fn grumpy() -> behavior_runtime::Behavior<AccountCommand> {
        behaviors::receive_message(|command| {
            match command {
                AccountCommand::GetBalance { reply_to } => {
                    reply_to.tell(crate::model::CurrentBalance { balance: 7 })
                }
                AccountCommand::CreateAccount { reply_to }
                | AccountCommand::Deposit { reply_to, .. }
                | AccountCommand::Withdraw { reply_to, .. }
                | AccountCommand::CloseAccount { reply_to } => {
                    reply_to.tell(StatusReply::error("no"))
                }
            }
            behaviors::same()
        })
    }

    #[tokio::test]
    async fn test_rejection_maps_to_rejected_error() {
        let system = ActorSystem::new("client");
        let client = AccountClient::new(system.spawn(grumpy(), "grumpy").unwrap());

        assert_eq!(
            client.deposit(5).await,
            Err(AccountError::Rejected("no".to_string()))
        );
        assert_eq!(client.balance().await, Ok(7));
        system.terminate().await;
    }

    #[tokio::test]
    async fn test_stopped_actor_maps_to_communication_error() {
        let system = ActorSystem::new("client-stopped");
        let target = system.spawn(grumpy(), "grumpy").unwrap();
        system.stop(&target);
        target.terminated().await;

        let result = AccountClient::new(target).create().await;
        assert!(matches!(result, Err(AccountError::ActorCommunicationError(_))));
        system.terminate().await;
    }
}
