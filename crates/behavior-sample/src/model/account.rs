use behavior_runtime::ActorRef;
use serde::{Deserialize, Serialize};

/// Reply to a command that either succeeds with a value or is rejected with a reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusReply<T> {
    Success(T),
    Error(String),
}

impl StatusReply<()> {
    pub fn ack() -> Self {
        StatusReply::Success(())
    }
}

impl<T> StatusReply<T> {
    pub fn error(reason: impl Into<String>) -> Self {
        StatusReply::Error(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusReply::Success(_))
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            StatusReply::Success(value) => Ok(value),
            StatusReply::Error(reason) => Err(reason),
        }
    }
}

/// Balance in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentBalance {
    pub balance: u64,
}

#[derive(Debug)]
pub enum AccountCommand {
    CreateAccount {
        reply_to: ActorRef<StatusReply<()>>,
    },
    Deposit {
        amount: u64,
        reply_to: ActorRef<StatusReply<()>>,
    },
    Withdraw {
        amount: u64,
        reply_to: ActorRef<StatusReply<()>>,
    },
    GetBalance {
        reply_to: ActorRef<CurrentBalance>,
    },
    CloseAccount {
        reply_to: ActorRef<StatusReply<()>>,
    },
}

/// What the journal stores for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    AccountCreated,
    Deposited { amount: u64 },
    Withdrawn { amount: u64 },
    AccountClosed,
}

/// State of an account, rebuilt from its events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Account {
    #[default]
    Empty,
    Opened {
        balance: u64,
    },
    Closed,
}

impl Account {
    /// Current balance. Empty and closed accounts hold nothing.
    pub fn balance(&self) -> u64 {
        match self {
            Account::Opened { balance } => *balance,
            Account::Empty | Account::Closed => 0,
        }
    }
}
