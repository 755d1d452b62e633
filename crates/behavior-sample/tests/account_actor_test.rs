use behavior_runtime::testkit::EventSourcedTestKit;
use behavior_sample::account_actor::{persistence_id, AccountEntity};
use behavior_sample::model::{Account, AccountCommand, AccountEvent, CurrentBalance, StatusReply};

fn test_kit() -> EventSourcedTestKit<AccountEntity> {
    EventSourcedTestKit::new(persistence_id("1"), AccountEntity)
}

fn opened_with(balance: u64) -> EventSourcedTestKit<AccountEntity> {
    let mut kit = test_kit();
    kit.run_command_with_reply(|reply_to| AccountCommand::CreateAccount { reply_to });
    if balance > 0 {
        kit.run_command_with_reply(|reply_to| AccountCommand::Deposit {
            amount: balance,
            reply_to,
        });
    }
    kit
}

#[test]
fn test_create_account() {
    let mut kit = test_kit();

    let result = kit.run_command_with_reply(|reply_to| AccountCommand::CreateAccount { reply_to });

    assert_eq!(result.reply(), &StatusReply::ack());
    assert_eq!(result.event(), &AccountEvent::AccountCreated);
    assert_eq!(result.state, Account::Opened { balance: 0 });
}

#[test]
fn test_empty_account_only_accepts_create() {
    let mut kit = test_kit();

    let result = kit.run_command(AccountCommand::Deposit {
        amount: 100,
        reply_to: behavior_runtime::testkit::TestProbe::new().actor_ref(),
    });

    assert!(result.unhandled);
    assert!(result.has_no_events());
    assert_eq!(result.state, Account::Empty);
}

#[test]
fn test_deposit_and_withdraw() {
    let mut kit = opened_with(0);

    let deposit =
        kit.run_command_with_reply(|reply_to| AccountCommand::Deposit { amount: 100, reply_to });
    assert_eq!(deposit.reply(), &StatusReply::ack());
    assert_eq!(deposit.event(), &AccountEvent::Deposited { amount: 100 });
    assert_eq!(deposit.state.balance(), 100);

    let withdraw =
        kit.run_command_with_reply(|reply_to| AccountCommand::Withdraw { amount: 10, reply_to });
    assert_eq!(withdraw.reply(), &StatusReply::ack());
    assert_eq!(withdraw.event(), &AccountEvent::Withdrawn { amount: 10 });
    assert_eq!(withdraw.state.balance(), 90);
}

#[test]
fn test_reject_withdraw_overdraft() {
    let mut kit = opened_with(100);

    let result =
        kit.run_command_with_reply(|reply_to| AccountCommand::Withdraw { amount: 110, reply_to });

    assert!(!result.reply().is_success());
    assert!(result.has_no_events());
    assert_eq!(result.state.balance(), 100);
}

#[test]
fn test_handle_get_balance() {
    let mut kit = opened_with(100);

    let result = kit.run_command_with_reply(|reply_to| AccountCommand::GetBalance { reply_to });

    assert_eq!(result.reply(), &CurrentBalance { balance: 100 });
    assert!(result.has_no_events());
}

#[test]
fn test_close_requires_zero_balance() {
    let mut kit = opened_with(5);

    let rejected = kit.run_command_with_reply(|reply_to| AccountCommand::CloseAccount { reply_to });
    assert_eq!(
        rejected.reply(),
        &StatusReply::error("Can't close account with non-zero balance")
    );
    assert!(rejected.has_no_events());

    kit.run_command_with_reply(|reply_to| AccountCommand::Withdraw { amount: 5, reply_to });
    let closed = kit.run_command_with_reply(|reply_to| AccountCommand::CloseAccount { reply_to });
    assert_eq!(closed.reply(), &StatusReply::ack());
    assert_eq!(closed.event(), &AccountEvent::AccountClosed);
    assert_eq!(closed.state, Account::Closed);
}

#[test]
fn test_closed_account_rejects_commands_but_reports_zero_balance() {
    let mut kit = opened_with(0);
    kit.run_command_with_reply(|reply_to| AccountCommand::CloseAccount { reply_to });

    let deposit =
        kit.run_command_with_reply(|reply_to| AccountCommand::Deposit { amount: 1, reply_to });
    assert_eq!(deposit.reply(), &StatusReply::error("Account is closed"));
    assert!(deposit.has_no_events());

    let balance = kit.run_command_with_reply(|reply_to| AccountCommand::GetBalance { reply_to });
    assert_eq!(balance.reply(), &CurrentBalance { balance: 0 });
}

#[test]
fn test_state_is_recovered_after_restart() {
    let mut kit = opened_with(40);
    kit.run_command_with_reply(|reply_to| AccountCommand::Withdraw { amount: 15, reply_to });

    kit.restart(AccountEntity);

    assert_eq!(kit.state(), &Account::Opened { balance: 25 });
    assert_eq!(
        kit.persisted_events(),
        vec![
            AccountEvent::AccountCreated,
            AccountEvent::Deposited { amount: 40 },
            AccountEvent::Withdrawn { amount: 15 },
        ]
    );
}

#[test]
fn test_clear_resets_to_empty() {
    let mut kit = opened_with(10);

    kit.clear(AccountEntity);

    assert_eq!(kit.state(), &Account::Empty);
    assert!(kit.persisted_events().is_empty());
}
