use behavior_runtime::testkit::TestProbe;
use behavior_runtime::{
    behaviors, ActorRef, ActorSystem, Behavior, Context, RoutingPolicy, Routers, RuntimeError,
    ServiceKey,
};
use std::collections::HashMap;
use std::time::Duration;

// --- Test Routees ---

/// Reports `(own path, message)` for every message; stops on "stop".
fn reporting_routee(probe: ActorRef<(String, String)>) -> Behavior<String> {
    behaviors::receive(move |ctx: &mut Context<String>, msg: String| {
        if msg == "stop" {
            return behaviors::stopped();
        }
        probe.tell((ctx.path().to_string(), msg));
        behaviors::same()
    })
}

fn pool_of(
    size: usize,
    probe: &TestProbe<(String, String)>,
) -> behavior_runtime::PoolRouter<String> {
    let report = probe.actor_ref();
    Routers::pool(size, move || reporting_routee(report.clone())).unwrap()
}

fn count_by_routee(deliveries: &[(String, String)]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for (path, _) in deliveries {
        *counts.entry(path.clone()).or_insert(0) += 1;
    }
    counts
}

// --- Builder Tests ---

#[test]
fn test_pool_of_zero_is_rejected() {
    let result = Routers::pool(0, || behaviors::ignore::<String>());
    assert!(matches!(result, Err(RuntimeError::EmptyRouteeSet)));
}

#[test]
fn test_resizing_pool_to_zero_is_rejected() {
    let pool = Routers::pool(2, || behaviors::ignore::<String>()).unwrap();
    assert!(matches!(pool.clone().with_pool_size(0), Err(RuntimeError::EmptyRouteeSet)));
    assert_eq!(pool.with_pool_size(7).unwrap().size(), 7);
}

#[test]
fn test_last_routing_policy_wins() {
    let pool = Routers::pool(2, || behaviors::ignore::<String>()).unwrap();
    assert_eq!(pool.policy(), RoutingPolicy::RoundRobin);

    let random_then_round_robin = pool.clone().with_random_routing().with_round_robin_routing();
    assert_eq!(random_then_round_robin.policy(), RoutingPolicy::RoundRobin);

    let round_robin_then_random = pool.with_round_robin_routing().with_random_routing();
    assert_eq!(round_robin_then_random.policy(), RoutingPolicy::Random);

    let group = Routers::group(ServiceKey::<String>::new("policy"));
    assert_eq!(group.policy(), RoutingPolicy::Random);
    assert_eq!(
        group
            .with_consistent_hash_routing(10, |msg: &String| msg.clone())
            .policy(),
        RoutingPolicy::ConsistentHashing {
            virtual_nodes_factor: 10
        }
    );
}

// --- Pool Tests ---

#[tokio::test]
async fn test_broadcast_reaches_every_routee() {
    let system = ActorSystem::new("broadcast");
    let mut probe = TestProbe::new();
    let pool = pool_of(4, &probe).with_broadcast_predicate(|msg: &String| msg.starts_with("bc-"));
    let router = system.spawn(Behavior::from(pool), "pool").unwrap();

    router.tell("bc-hello".to_string());
    router.tell("plain".to_string());

    let deliveries = probe.receive_messages(5).await;
    let broadcasts: Vec<_> = deliveries.iter().filter(|(_, msg)| msg == "bc-hello").collect();
    assert_eq!(broadcasts.len(), 4);
    assert_eq!(count_by_routee(&deliveries).len(), 4);
    probe.expect_no_message(Duration::from_millis(50)).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_round_robin_spreads_messages_evenly() {
    let system = ActorSystem::new("round-robin");
    let mut probe = TestProbe::new();
    let router = system
        .spawn(Behavior::from(pool_of(3, &probe)), "pool")
        .unwrap();

    for n in 0..9 {
        router.tell(format!("job-{n}"));
    }

    let deliveries = probe.receive_messages(9).await;
    let counts = count_by_routee(&deliveries);
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|count| *count == 3));
    assert!(counts.keys().all(|path| path.starts_with("/user/pool/$routee-")));
    system.terminate().await;
}

#[tokio::test]
async fn test_random_routing_delivers_each_message_once() {
    let system = ActorSystem::new("random");
    let mut probe = TestProbe::new();
    let router = system
        .spawn(
            Behavior::from(pool_of(3, &probe).with_random_routing()),
            "pool",
        )
        .unwrap();

    for n in 0..20 {
        router.tell(format!("job-{n}"));
    }

    let mut jobs: Vec<String> = probe
        .receive_messages(20)
        .await
        .into_iter()
        .map(|(_, msg)| msg)
        .collect();
    jobs.sort();
    let mut expected: Vec<String> = (0..20).map(|n| format!("job-{n}")).collect();
    expected.sort();
    assert_eq!(jobs, expected);
    probe.expect_no_message(Duration::from_millis(50)).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_consistent_hashing_keeps_keys_on_one_routee() {
    let system = ActorSystem::new("hashing");
    let mut probe = TestProbe::new();
    let pool = pool_of(4, &probe).with_consistent_hash_routing(10, |msg: &String| {
        msg.split(':').next().unwrap_or_default().to_string()
    });
    let router = system.spawn(Behavior::from(pool), "pool").unwrap();

    for key in ["apple", "pear", "plum"] {
        for n in 0..5 {
            router.tell(format!("{key}:{n}"));
        }
    }

    let deliveries = probe.receive_messages(15).await;
    for key in ["apple", "pear", "plum"] {
        let paths: Vec<_> = deliveries
            .iter()
            .filter(|(_, msg)| msg.starts_with(key))
            .map(|(path, _)| path.as_str())
            .collect();
        assert_eq!(paths.len(), 5);
        assert!(paths.iter().all(|path| *path == paths[0]), "{key} moved: {paths:?}");
    }
    system.terminate().await;
}

#[tokio::test]
async fn test_pool_stops_when_all_routees_stop() {
    let system = ActorSystem::new("pool-stop");
    let probe = TestProbe::new();
    let pool = pool_of(3, &probe).with_broadcast_predicate(|msg: &String| msg == "stop");
    let router = system.spawn(Behavior::from(pool), "pool").unwrap();

    router.tell("stop".to_string());

    probe.expect_terminated(&router).await;
    system.terminate().await;
}

#[tokio::test]
async fn test_pool_routes_around_stopped_routee() {
    let system = ActorSystem::new("pool-shrink");
    let mut probe = TestProbe::new();
    let router = system
        .spawn(Behavior::from(pool_of(2, &probe)), "pool")
        .unwrap();

    // Round-robin sends the first message to the first routee.
    router.tell("stop".to_string());
    tokio::time::sleep(Duration::from_millis(50)).await;
    for n in 0..4 {
        router.tell(format!("job-{n}"));
    }

    let deliveries = probe.receive_messages(4).await;
    assert_eq!(count_by_routee(&deliveries).len(), 1);
    assert!(!router.is_terminated());
    system.terminate().await;
}

// --- Group & Receptionist Tests ---

#[tokio::test]
async fn test_receptionist_forgets_terminated_services() {
    let system = ActorSystem::new("receptionist");
    let key = ServiceKey::<String>::new("echo");
    let probe = TestProbe::new();
    let service = system
        .spawn(reporting_routee(probe.actor_ref()), "echo")
        .unwrap();

    system.receptionist().register(&key, service.clone());
    system.receptionist().register(&key, service.clone());
    assert_eq!(system.receptionist().find(&key), vec![service.clone()]);

    service.tell("stop".to_string());
    service.terminated().await;

    assert!(system.receptionist().find(&key).is_empty());
    system.terminate().await;
}

#[tokio::test]
async fn test_group_routes_to_registered_services() {
    let system = ActorSystem::new("group");
    let key = ServiceKey::<String>::new("workers");
    let mut probe = TestProbe::new();
    for name in ["w1", "w2"] {
        let worker = system
            .spawn(reporting_routee(probe.actor_ref()), name)
            .unwrap();
        system.receptionist().register(&key, worker);
    }

    let group = Routers::group(key).with_round_robin_routing();
    let router = system.spawn(Behavior::from(group), "group").unwrap();
    for n in 0..4 {
        router.tell(format!("job-{n}"));
    }

    let counts = count_by_routee(&probe.receive_messages(4).await);
    assert_eq!(counts.get("/user/w1"), Some(&2));
    assert_eq!(counts.get("/user/w2"), Some(&2));
    system.terminate().await;
}

#[tokio::test]
async fn test_group_follows_listing_changes() {
    let system = ActorSystem::new("group-listing");
    let key = ServiceKey::<String>::new("late");
    let mut probe = TestProbe::new();
    let router = system
        .spawn(Behavior::from(Routers::group(key.clone())), "group")
        .unwrap();

    router.tell("too-early".to_string());
    probe.expect_no_message(Duration::from_millis(50)).await;

    let worker = system
        .spawn(reporting_routee(probe.actor_ref()), "late-worker")
        .unwrap();
    system.receptionist().register(&key, worker.clone());
    router.tell("on-time".to_string());

    probe
        .expect_message(("/user/late-worker".to_string(), "on-time".to_string()))
        .await;

    system.stop(&worker);
    worker.terminated().await;
    router.tell("orphaned".to_string());
    probe.expect_no_message(Duration::from_millis(50)).await;
    assert!(!router.is_terminated());
    system.terminate().await;
}
