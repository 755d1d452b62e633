use behavior_runtime::testkit::TestProbe;
use behavior_runtime::{
    behaviors, ActorRef, ActorSystem, Behavior, Context, Interceptor, ReceiveTarget, Signal,
    SignalTarget,
};
use std::time::Duration;

// --- Test Interceptors ---

/// Logs `label:msg` and passes the message on.
struct Recording {
    label: &'static str,
    log: ActorRef<String>,
}

impl Interceptor<String> for Recording {
    fn around_receive(
        &mut self,
        ctx: &mut Context<String>,
        msg: String,
        target: ReceiveTarget<'_, String>,
    ) -> Behavior<String> {
        self.log.tell(format!("{}:{msg}", self.label));
        target.call(ctx, msg)
    }

    fn around_signal(
        &mut self,
        ctx: &mut Context<String>,
        signal: &Signal,
        target: SignalTarget<'_, String>,
    ) -> Behavior<String> {
        self.log.tell(format!("{}:{signal:?}", self.label));
        target.call(ctx, signal)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    A,
    B,
}

/// Only sees `Command::A`.
struct OnlyA {
    log: ActorRef<Command>,
}

impl Interceptor<Command> for OnlyA {
    fn accepts(&self, msg: &Command) -> bool {
        *msg == Command::A
    }

    fn around_receive(
        &mut self,
        ctx: &mut Context<Command>,
        msg: Command,
        target: ReceiveTarget<'_, Command>,
    ) -> Behavior<Command> {
        self.log.tell(msg.clone());
        target.call(ctx, msg)
    }
}

/// Sees the first message, then removes itself.
struct FirstOnly {
    log: ActorRef<String>,
}

impl Interceptor<String> for FirstOnly {
    fn around_receive(
        &mut self,
        ctx: &mut Context<String>,
        msg: String,
        target: ReceiveTarget<'_, String>,
    ) -> Behavior<String> {
        self.log.tell(format!("first-only:{msg}"));
        let next = target.call(ctx, msg);
        if next.is_stopped() {
            return next;
        }
        behaviors::detach(behaviors::same())
    }
}

struct Uppercase;

impl Interceptor<String> for Uppercase {
    fn around_receive(
        &mut self,
        ctx: &mut Context<String>,
        msg: String,
        target: ReceiveTarget<'_, String>,
    ) -> Behavior<String> {
        target.call(ctx, msg.to_uppercase())
    }
}

fn forwarder(log: ActorRef<String>) -> Behavior<String> {
    behaviors::receive_message(move |msg: String| {
        log.tell(format!("behavior:{msg}"));
        behaviors::same()
    })
}

// --- Tests ---

#[tokio::test]
async fn test_intercepts_message_before_behavior() {
    let system = ActorSystem::new("intercept");
    let mut intercepted = TestProbe::<String>::new();
    let mut probe = TestProbe::<String>::new();
    let log = intercepted.actor_ref();

    let actor = system
        .spawn(
            behaviors::intercept(
                move || Recording { label: "seen", log },
                forwarder(probe.actor_ref()),
            ),
            "intercepted",
        )
        .unwrap();

    actor.tell("Hello".to_string());

    intercepted.expect_message("seen:Hello".to_string()).await;
    probe.expect_message("behavior:Hello".to_string()).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_intercepts_every_variant_in_order() {
    let system = ActorSystem::new("variants");
    let mut intercepted = TestProbe::<Command>::new();
    let mut probe = TestProbe::<Command>::new();
    let log = intercepted.actor_ref();
    let forward = probe.actor_ref();

    struct All {
        log: ActorRef<Command>,
    }
    impl Interceptor<Command> for All {
        fn around_receive(
            &mut self,
            ctx: &mut Context<Command>,
            msg: Command,
            target: ReceiveTarget<'_, Command>,
        ) -> Behavior<Command> {
            self.log.tell(msg.clone());
            target.call(ctx, msg)
        }
    }

    let actor = system
        .spawn(
            behaviors::intercept(
                move || All { log },
                behaviors::receive_message(move |msg: Command| {
                    forward.tell(msg);
                    behaviors::same()
                }),
            ),
            "variants",
        )
        .unwrap();

    actor.tell(Command::A);
    actor.tell(Command::B);

    intercepted.expect_message(Command::A).await;
    probe.expect_message(Command::A).await;
    intercepted.expect_message(Command::B).await;
    probe.expect_message(Command::B).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_unaccepted_messages_bypass_the_hook() {
    let system = ActorSystem::new("bypass");
    let mut intercepted = TestProbe::<Command>::new();
    let mut probe = TestProbe::<Command>::new();
    let log = intercepted.actor_ref();
    let forward = probe.actor_ref();

    let actor = system
        .spawn(
            behaviors::intercept(
                move || OnlyA { log },
                behaviors::receive_message(move |msg: Command| {
                    forward.tell(msg);
                    behaviors::same()
                }),
            ),
            "only-a",
        )
        .unwrap();

    actor.tell(Command::B);
    actor.tell(Command::A);

    probe.expect_message(Command::B).await;
    probe.expect_message(Command::A).await;
    intercepted.expect_message(Command::A).await;
    intercepted
        .expect_no_message(Duration::from_millis(50))
        .await;
    system.terminate().await;
}

#[tokio::test]
async fn test_outermost_interceptor_runs_first() {
    let system = ActorSystem::new("stacked");
    let mut probe = TestProbe::<String>::new();
    let outer = probe.actor_ref();
    let inner = probe.actor_ref();

    let behavior = behaviors::intercept(
        move || Recording {
            label: "outer",
            log: outer,
        },
        behaviors::intercept(
            move || Recording {
                label: "inner",
                log: inner,
            },
            forwarder(probe.actor_ref()),
        ),
    );
    let actor = system.spawn(behavior, "stacked").unwrap();

    actor.tell("x".to_string());

    probe.expect_message("outer:x".to_string()).await;
    probe.expect_message("inner:x".to_string()).await;
    probe.expect_message("behavior:x".to_string()).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_interceptor_survives_behavior_change() {
    fn numbered(log: ActorRef<String>, n: u32) -> Behavior<String> {
        behaviors::receive_message(move |msg: String| {
            log.tell(format!("{n}:{msg}"));
            numbered(log.clone(), n + 1)
        })
    }

    let system = ActorSystem::new("survives");
    let mut intercepted = TestProbe::<String>::new();
    let mut probe = TestProbe::<String>::new();
    let log = intercepted.actor_ref();

    let actor = system
        .spawn(
            behaviors::intercept(
                move || Recording { label: "seen", log },
                numbered(probe.actor_ref(), 1),
            ),
            "numbered",
        )
        .unwrap();

    for msg in ["a", "b", "c"] {
        actor.tell(msg.to_string());
    }

    assert_eq!(
        probe.receive_messages(3).await,
        vec!["1:a".to_string(), "2:b".to_string(), "3:c".to_string()]
    );
    assert_eq!(
        intercepted.receive_messages(3).await,
        vec![
            "seen:a".to_string(),
            "seen:b".to_string(),
            "seen:c".to_string()
        ]
    );
    system.terminate().await;
}

#[tokio::test]
async fn test_detach_removes_only_that_interceptor() {
    let system = ActorSystem::new("detach");
    let mut probe = TestProbe::<String>::new();
    let outer = probe.actor_ref();
    let first = probe.actor_ref();

    let behavior = behaviors::intercept(
        move || Recording {
            label: "outer",
            log: outer,
        },
        behaviors::intercept(move || FirstOnly { log: first }, forwarder(probe.actor_ref())),
    );
    let actor = system.spawn(behavior, "detaching").unwrap();

    actor.tell("1".to_string());
    actor.tell("2".to_string());

    assert_eq!(
        probe.receive_messages(5).await,
        vec![
            "outer:1".to_string(),
            "first-only:1".to_string(),
            "behavior:1".to_string(),
            "outer:2".to_string(),
            "behavior:2".to_string(),
        ]
    );
    system.terminate().await;
}

#[tokio::test]
async fn test_interceptor_can_transform_message() {
    let system = ActorSystem::new("transform");
    let mut probe = TestProbe::<String>::new();

    let actor = system
        .spawn(
            behaviors::intercept(|| Uppercase, forwarder(probe.actor_ref())),
            "upper",
        )
        .unwrap();

    actor.tell("quiet".to_string());

    probe.expect_message("behavior:QUIET".to_string()).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_interceptor_sees_post_stop() {
    let system = ActorSystem::new("signals");
    let mut probe = TestProbe::<String>::new();
    let log = probe.actor_ref();

    let actor = system
        .spawn(
            behaviors::intercept(
                move || Recording {
                    label: "signal",
                    log,
                },
                behaviors::ignore(),
            ),
            "signals",
        )
        .unwrap();

    system.stop(&actor);

    probe.expect_message("signal:PostStop".to_string()).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_monitor_receives_copies() {
    let system = ActorSystem::new("monitor");
    let mut monitor = TestProbe::<String>::new();
    let mut probe = TestProbe::<String>::new();

    let actor = system
        .spawn(
            behaviors::monitor(monitor.actor_ref(), forwarder(probe.actor_ref())),
            "monitored",
        )
        .unwrap();

    actor.tell("ping".to_string());

    monitor.expect_message("ping".to_string()).await;
    probe.expect_message("behavior:ping".to_string()).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_log_messages_passes_through() {
    let system = ActorSystem::new("logging");
    let mut probe = TestProbe::<String>::new();

    let actor = system
        .spawn(behaviors::log_messages(forwarder(probe.actor_ref())), "logged")
        .unwrap();

    actor.tell("traced".to_string());

    probe.expect_message("behavior:traced".to_string()).await;
    system.terminate().await;
}
