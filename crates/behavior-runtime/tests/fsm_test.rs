use behavior_runtime::fsm::{self, FsmBuilder, FsmEvent, Transition};
use behavior_runtime::testkit::TestProbe;
use behavior_runtime::{ActorRef, ActorSystem, Behavior, RuntimeError, UnhandledMessage};
use std::time::Duration;

// --- Test Machines ---

fn observer(log: ActorRef<String>) -> impl Fn(&&'static str, &&'static str) + Send + Sync {
    move |from, to| log.tell(format!("Transitioning from {from} to {to}."))
}

/// `start --"next"--> next`, where `next` accepts nothing.
fn start_next(log: ActorRef<String>) -> Behavior<String> {
    FsmBuilder::<&'static str, String, String>::new()
        .on_transition(observer(log))
        .start_with("start", "data".to_string())
        .when("start", |_ctx, event| match event.event {
            FsmEvent::Message(msg) if msg == "next" => Transition::goto("next"),
            _ => Transition::unhandled(),
        })
        .when("next", fsm::null_handler)
        .initialize()
        .unwrap()
}

#[derive(Debug)]
enum Door {
    Open,
    Close,
    Knock,
    Peek { reply_to: ActorRef<(String, u32)> },
    Leave,
}

/// A door that counts how often it was opened.
fn door(log: ActorRef<String>) -> FsmBuilder<&'static str, u32, Door> {
    FsmBuilder::new()
        .on_transition(observer(log))
        .start_with("closed", 0)
        .when("closed", |_ctx, event| match event.message() {
            Some(Door::Open) => Transition::goto("open").using(event.state_data + 1),
            Some(Door::Close) => Transition::goto("closed"),
            Some(Door::Knock) => Transition::stay(),
            _ => Transition::unhandled(),
        })
        .when("open", |_ctx, event| match event.message() {
            Some(Door::Close) => Transition::goto("closed"),
            _ => Transition::unhandled(),
        })
        .when_unhandled(|_ctx, event| match event.message() {
            Some(Door::Peek { reply_to }) => {
                reply_to.tell(("peek".to_string(), *event.state_data));
                Transition::stay()
            }
            Some(Door::Leave) => Transition::stop(),
            _ => Transition::unhandled(),
        })
}

// --- Tests ---

#[tokio::test]
async fn test_start_next_scenario() {
    let system = ActorSystem::new("fsm");
    let mut probe = TestProbe::<String>::new();
    let actor = system.spawn(start_next(probe.actor_ref()), "fsm").unwrap();

    probe
        .expect_message("Transitioning from start to start.".to_string())
        .await;
    actor.tell("next".to_string());
    probe
        .expect_message("Transitioning from start to next.".to_string())
        .await;
    probe.expect_no_message(Duration::from_millis(50)).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_null_handler_reports_unhandled() {
    let system = ActorSystem::new("fsm-null");
    let mut unhandled = TestProbe::<UnhandledMessage>::new();
    let hook = unhandled.actor_ref();
    system.on_unhandled(move |record| hook.tell(record.clone()));
    let mut probe = TestProbe::<String>::new();
    let actor = system.spawn(start_next(probe.actor_ref()), "fsm").unwrap();

    actor.tell("next".to_string());
    actor.tell("anything".to_string());

    assert_eq!(probe.receive_messages(2).await.len(), 2);
    let record = unhandled.receive_message().await;
    assert_eq!(record.actor, actor.id());
    probe.expect_no_message(Duration::from_millis(50)).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_goto_same_state_notifies_and_stay_does_not() {
    let system = ActorSystem::new("fsm-self");
    let mut probe = TestProbe::<String>::new();
    let actor = system
        .spawn(door(probe.actor_ref()).initialize().unwrap(), "door")
        .unwrap();

    probe
        .expect_message("Transitioning from closed to closed.".to_string())
        .await;

    actor.tell(Door::Knock);
    actor.tell(Door::Close);

    probe
        .expect_message("Transitioning from closed to closed.".to_string())
        .await;
    probe.expect_no_message(Duration::from_millis(50)).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_using_replaces_data_with_transition() {
    let system = ActorSystem::new("fsm-data");
    let mut probe = TestProbe::<String>::new();
    let actor = system
        .spawn(door(probe.actor_ref()).initialize().unwrap(), "door")
        .unwrap();

    actor.tell(Door::Open);
    actor.tell(Door::Close);
    actor.tell(Door::Open);
    let peek = actor
        .ask(|reply_to| Door::Peek { reply_to }, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(peek, ("peek".to_string(), 2));
    assert_eq!(
        probe.receive_messages(4).await,
        vec![
            "Transitioning from closed to closed.".to_string(),
            "Transitioning from closed to open.".to_string(),
            "Transitioning from open to closed.".to_string(),
            "Transitioning from closed to open.".to_string(),
        ]
    );
    system.terminate().await;
}

#[tokio::test]
async fn test_stop_runs_termination_hook_once() {
    let system = ActorSystem::new("fsm-stop");
    let probe = TestProbe::<String>::new();
    let mut hook_probe = TestProbe::<String>::new();
    let hook = hook_probe.actor_ref();
    let behavior = door(probe.actor_ref())
        .on_termination(move |state, data| hook.tell(format!("{state}/{data}")))
        .initialize()
        .unwrap();
    let actor = system.spawn(behavior, "door").unwrap();

    actor.tell(Door::Open);
    actor.tell(Door::Leave);

    hook_probe.expect_message("open/1".to_string()).await;
    hook_probe.expect_terminated(&actor).await;
    hook_probe.expect_no_message(Duration::from_millis(50)).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_state_timeout_fires_when_idle() {
    let system = ActorSystem::new("fsm-timeout");
    let mut probe = TestProbe::<String>::new();
    let behavior = FsmBuilder::<&'static str, (), String>::new()
        .on_transition(observer(probe.actor_ref()))
        .start_with("waiting", ())
        .when_with_timeout("waiting", Duration::from_millis(50), |_ctx, event| {
            match event.event {
                FsmEvent::StateTimeout => Transition::goto("timed-out"),
                FsmEvent::Message(_) => Transition::stay(),
            }
        })
        .when("timed-out", fsm::null_handler)
        .initialize()
        .unwrap();
    system.spawn(behavior, "waiter").unwrap();

    probe
        .expect_message("Transitioning from waiting to waiting.".to_string())
        .await;
    probe
        .expect_message("Transitioning from waiting to timed-out.".to_string())
        .await;
    system.terminate().await;
}

#[tokio::test]
async fn test_events_restart_state_timeout() {
    let system = ActorSystem::new("fsm-restart");
    let mut probe = TestProbe::<String>::new();
    let behavior = FsmBuilder::<&'static str, (), String>::new()
        .on_transition(observer(probe.actor_ref()))
        .start_with("waiting", ())
        .when_with_timeout("waiting", Duration::from_millis(150), |_ctx, event| {
            match event.event {
                FsmEvent::StateTimeout => Transition::goto("timed-out"),
                FsmEvent::Message(_) => Transition::stay(),
            }
        })
        .when("timed-out", fsm::null_handler)
        .initialize()
        .unwrap();
    let actor = system.spawn(behavior, "waiter").unwrap();

    probe.receive_message().await;
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(60)).await;
        actor.tell("still here".to_string());
    }
    probe.expect_no_message(Duration::from_millis(50)).await;
    probe
        .expect_message("Transitioning from waiting to timed-out.".to_string())
        .await;
    system.terminate().await;
}

#[tokio::test]
async fn test_initialize_without_start_state_fails() {
    let result = FsmBuilder::<&'static str, (), String>::new()
        .when("start", fsm::null_handler)
        .initialize();

    assert_eq!(result.unwrap_err(), RuntimeError::MissingInitialState);
}

#[tokio::test]
async fn test_repeated_when_chains_handlers() {
    let system = ActorSystem::new("fsm-chain");
    let mut probe = TestProbe::<String>::new();
    let behavior = FsmBuilder::<&'static str, (), String>::new()
        .on_transition(observer(probe.actor_ref()))
        .start_with("a", ())
        .when("a", |_ctx, event| match event.message() {
            Some(msg) if msg == "to-b" => Transition::goto("b"),
            _ => Transition::unhandled(),
        })
        .when("a", |_ctx, event| match event.message() {
            Some(msg) if msg == "to-c" => Transition::goto("c"),
            _ => Transition::unhandled(),
        })
        .when("c", fsm::null_handler)
        .initialize()
        .unwrap();
    let actor = system.spawn(behavior, "chain").unwrap();

    actor.tell("to-c".to_string());

    probe.receive_message().await;
    probe
        .expect_message("Transitioning from a to c.".to_string())
        .await;
    system.terminate().await;
}
