use crate::model::{Account, AccountCommand, AccountEvent, CurrentBalance, StatusReply};
use behavior_runtime::{ActorRef, Effect, EventSourcedEntity};
use tracing::debug;

type AccountEffect = Effect<AccountEvent, Account>;

/// Event-sourced bank account.
///
/// An account must be created before it accepts money, cannot be overdrawn and can only be
/// closed once it is empty. A closed account rejects everything except balance queries.
#[derive(Debug, Clone, Default)]
pub struct AccountEntity;

impl EventSourcedEntity for AccountEntity {
    type Command = AccountCommand;
    type Event = AccountEvent;
    type State = Account;

    fn empty_state(&self) -> Account {
        Account::Empty
    }

    fn handle_command(&self, state: &Account, command: AccountCommand) -> AccountEffect {
        match state {
            Account::Empty => empty_account(command),
            Account::Opened { balance } => opened_account(*balance, command),
            Account::Closed => closed_account(command),
        }
    }

    fn apply_event(&self, state: Account, event: &AccountEvent) -> Account {
        match (state, event) {
            (Account::Empty, AccountEvent::AccountCreated) => Account::Opened { balance: 0 },
            (Account::Opened { balance }, AccountEvent::Deposited { amount }) => Account::Opened {
                balance: balance + amount,
            },
            (Account::Opened { balance }, AccountEvent::Withdrawn { amount }) => Account::Opened {
                balance: balance.saturating_sub(*amount),
            },
            (Account::Opened { .. }, AccountEvent::AccountClosed) => Account::Closed,
            (state, event) => {
                debug!(?state, ?event, "Event does not apply to state, ignored");
                state
            }
        }
    }
}

fn empty_account(command: AccountCommand) -> AccountEffect {
    match command {
        AccountCommand::CreateAccount { reply_to } => {
            Effect::persist(AccountEvent::AccountCreated)
                .then_reply(reply_to, |_| StatusReply::ack())
        }
        _ => Effect::unhandled(),
    }
}

fn opened_account(balance: u64, command: AccountCommand) -> AccountEffect {
    match command {
        AccountCommand::Deposit { amount, reply_to } => {
            Effect::persist(AccountEvent::Deposited { amount })
                .then_reply(reply_to, |_| StatusReply::ack())
        }
        AccountCommand::Withdraw { amount, reply_to } if amount > balance => Effect::reply(
            reply_to,
            StatusReply::error(format!(
                "Insufficient balance {balance} to be able to withdraw {amount}"
            )),
        ),
        AccountCommand::Withdraw { amount, reply_to } => {
            Effect::persist(AccountEvent::Withdrawn { amount })
                .then_reply(reply_to, |_| StatusReply::ack())
        }
        AccountCommand::GetBalance { reply_to } => {
            Effect::reply(reply_to, CurrentBalance { balance })
        }
        AccountCommand::CloseAccount { reply_to } if balance == 0 => {
            Effect::persist(AccountEvent::AccountClosed)
                .then_reply(reply_to, |_| StatusReply::ack())
        }
        AccountCommand::CloseAccount { reply_to } => Effect::reply(
            reply_to,
            StatusReply::error("Can't close account with non-zero balance"),
        ),
        AccountCommand::CreateAccount { reply_to } => {
            Effect::reply(reply_to, StatusReply::error("Account is already created"))
        }
    }
}

fn closed_account(command: AccountCommand) -> AccountEffect {
    match command {
        AccountCommand::GetBalance { reply_to } => {
            Effect::reply(reply_to, CurrentBalance { balance: 0 })
        }
        AccountCommand::CreateAccount { reply_to }
        | AccountCommand::Deposit { reply_to, .. }
        | AccountCommand::Withdraw { reply_to, .. }
        | AccountCommand::CloseAccount { reply_to } => rejected(reply_to),
    }
}

fn rejected(reply_to: ActorRef<StatusReply<()>>) -> AccountEffect {
    Effect::reply(reply_to, StatusReply::error("Account is closed"))
}
