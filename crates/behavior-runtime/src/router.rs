//! # Routers
//!
//! A router is an ordinary behavior that forwards each message to one of its routees.
//!
//! * **Pool routers** spawn a fixed number of routees as their own children from a behavior
//!   factory, watch them, and drop each one from the set when it terminates. A pool whose
//!   last routee has terminated stops itself.
//! * **Group routers** take their routees from the [`Receptionist`](crate::Receptionist)
//!   listing of a [`ServiceKey`] and follow it as services come and go. A group with no
//!   routees drops messages.
//!
//! Builders are immutable values: every `with_*` call returns a new builder, and the last
//! routing policy set wins. Convert a builder into a [`Behavior`] with `.into()` to spawn it.
//!
//! ```rust
//! use behavior_runtime::{behaviors, ActorSystem, Behavior, Routers};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let system = ActorSystem::new("docs");
//! let pool = Routers::pool(4, || {
//!     behaviors::receive_message(|job: String| {
//!         println!("working on {job}");
//!         behaviors::same()
//!     })
//! })
//! .unwrap()
//! .with_broadcast_predicate(|job: &String| job.starts_with("bc-"));
//! let router = system.spawn(Behavior::from(pool), "workers").unwrap();
//! router.tell("bc-hello".to_string());
//! # system.terminate().await;
//! # }
//! ```

use crate::actor_ref::ActorRef;
use crate::behavior::{Behavior, ExtensibleBehavior};
use crate::behaviors;
use crate::context::Context;
use crate::error::RuntimeError;
use crate::message::{Message, Signal};
use crate::receptionist::{Listing, ServiceKey};
use crate::routing::{RoutingConfig, RoutingLogic, RoutingPolicy};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

type RouteeFactory<M> = Arc<dyn Fn() -> Behavior<M> + Send + Sync>;

/// Entry point for router builders.
pub struct Routers;

impl Routers {
    /// A pool of `size` routees, each running a fresh behavior from `routee`.
    ///
    /// Defaults to round-robin routing. Fails with [`RuntimeError::EmptyRouteeSet`] for a
    /// size of zero.
    pub fn pool<M, F>(size: usize, routee: F) -> Result<PoolRouter<M>, RuntimeError>
    where
        M: Message,
        F: Fn() -> Behavior<M> + Send + Sync + 'static,
    {
        if size == 0 {
            return Err(RuntimeError::EmptyRouteeSet);
        }
        Ok(PoolRouter {
            size,
            routee: Arc::new(routee),
            routing: RoutingConfig::RoundRobin,
            broadcast: None,
        })
    }

    /// A router over the actors registered under `key`. Defaults to random routing.
    pub fn group<M: Message>(key: ServiceKey<M>) -> GroupRouter<M> {
        GroupRouter {
            key,
            routing: RoutingConfig::Random,
            broadcast: None,
        }
    }
}

/// Messages matching `predicate` go to every routee instead of one.
struct Broadcast<M> {
    predicate: Arc<dyn Fn(&M) -> bool + Send + Sync>,
    duplicate: fn(&M) -> M,
}

impl<M> Clone for Broadcast<M> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            duplicate: self.duplicate,
        }
    }
}

pub struct PoolRouter<M> {
    size: usize,
    routee: RouteeFactory<M>,
    routing: RoutingConfig<M>,
    broadcast: Option<Broadcast<M>>,
}

impl<M> Clone for PoolRouter<M> {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            routee: Arc::clone(&self.routee),
            routing: self.routing.clone(),
            broadcast: self.broadcast.clone(),
        }
    }
}

impl<M: Message> PoolRouter<M> {
    pub fn with_round_robin_routing(self) -> Self {
        Self {
            routing: RoutingConfig::RoundRobin,
            ..self
        }
    }

    pub fn with_random_routing(self) -> Self {
        Self {
            routing: RoutingConfig::Random,
            ..self
        }
    }

    /// Routes messages with equal keys to the same routee while the routee set is unchanged.
    pub fn with_consistent_hash_routing<K>(self, virtual_nodes_factor: usize, key_of: K) -> Self
    where
        K: Fn(&M) -> String + Send + Sync + 'static,
    {
        Self {
            routing: RoutingConfig::ConsistentHashing {
                virtual_nodes_factor,
                key_of: Arc::new(key_of),
            },
            ..self
        }
    }

    pub fn with_pool_size(self, size: usize) -> Result<Self, RuntimeError> {
        if size == 0 {
            return Err(RuntimeError::EmptyRouteeSet);
        }
        Ok(Self { size, ..self })
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.routing.policy()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl<M: Message + Clone> PoolRouter<M> {
    /// Sends messages matching `predicate` to every routee, bypassing the routing policy.
    pub fn with_broadcast_predicate<P>(self, predicate: P) -> Self
    where
        P: Fn(&M) -> bool + Send + Sync + 'static,
    {
        Self {
            broadcast: Some(Broadcast {
                predicate: Arc::new(predicate),
                duplicate: M::clone,
            }),
            ..self
        }
    }
}

impl<M: Message> From<PoolRouter<M>> for Behavior<M> {
    fn from(pool: PoolRouter<M>) -> Self {
        behaviors::setup(move |ctx| {
            let mut routees = Vec::with_capacity(pool.size);
            for index in 1..=pool.size {
                match ctx.spawn((pool.routee)(), &format!("$routee-{index}")) {
                    Ok(routee) => {
                        ctx.watch(&routee);
                        routees.push(routee);
                    }
                    Err(e) => warn!(error = %e, index, "Failed to spawn routee"),
                }
            }
            if routees.is_empty() {
                warn!("Pool router has no routees, stopping");
                return behaviors::stopped();
            }
            info!(routees = routees.len(), policy = ?pool.policy(), "Pool router started");
            Behavior::extensible(PoolRouterBehavior {
                routees,
                logic: pool.routing.logic(),
                broadcast: pool.broadcast,
            })
        })
    }
}

struct PoolRouterBehavior<M> {
    routees: Vec<ActorRef<M>>,
    logic: RoutingLogic<M>,
    broadcast: Option<Broadcast<M>>,
}

impl<M: Message> ExtensibleBehavior<M> for PoolRouterBehavior<M> {
    fn receive(&mut self, _ctx: &mut Context<M>, msg: M) -> Behavior<M> {
        self.routees.retain(|routee| !routee.is_terminated());
        route(&mut self.logic, self.broadcast.as_ref(), &self.routees, msg);
        behaviors::same()
    }

    fn receive_signal(&mut self, _ctx: &mut Context<M>, signal: &Signal) -> Behavior<M> {
        match signal {
            Signal::Terminated(id) => {
                self.routees.retain(|routee| routee.id() != *id);
                debug!(routee = %id, remaining = self.routees.len(), "Routee terminated");
                if self.routees.is_empty() {
                    info!("All routees terminated, stopping pool router");
                    behaviors::stopped()
                } else {
                    behaviors::same()
                }
            }
            _ => behaviors::unhandled(),
        }
    }
}

pub struct GroupRouter<M> {
    key: ServiceKey<M>,
    routing: RoutingConfig<M>,
    broadcast: Option<Broadcast<M>>,
}

impl<M> Clone for GroupRouter<M> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            routing: self.routing.clone(),
            broadcast: self.broadcast.clone(),
        }
    }
}

impl<M: Message> GroupRouter<M> {
    pub fn with_round_robin_routing(self) -> Self {
        Self {
            routing: RoutingConfig::RoundRobin,
            ..self
        }
    }

    pub fn with_random_routing(self) -> Self {
        Self {
            routing: RoutingConfig::Random,
            ..self
        }
    }

    pub fn with_consistent_hash_routing<K>(self, virtual_nodes_factor: usize, key_of: K) -> Self
    where
        K: Fn(&M) -> String + Send + Sync + 'static,
    {
        Self {
            routing: RoutingConfig::ConsistentHashing {
                virtual_nodes_factor,
                key_of: Arc::new(key_of),
            },
            ..self
        }
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.routing.policy()
    }
}

impl<M: Message + Clone> GroupRouter<M> {
    pub fn with_broadcast_predicate<P>(self, predicate: P) -> Self
    where
        P: Fn(&M) -> bool + Send + Sync + 'static,
    {
        Self {
            broadcast: Some(Broadcast {
                predicate: Arc::new(predicate),
                duplicate: M::clone,
            }),
            ..self
        }
    }
}

impl<M: Message> From<GroupRouter<M>> for Behavior<M> {
    fn from(group: GroupRouter<M>) -> Self {
        behaviors::setup(move |ctx| {
            let mut listing = ctx.system().receptionist().subscribe(&group.key);
            let routees = listing.borrow_and_update().clone();
            info!(
                service = group.key.id(),
                routees = routees.len(),
                policy = ?group.policy(),
                "Group router started"
            );
            Behavior::extensible(GroupRouterBehavior {
                key: group.key,
                listing,
                routees,
                logic: group.routing.logic(),
                broadcast: group.broadcast,
            })
        })
    }
}

struct GroupRouterBehavior<M> {
    key: ServiceKey<M>,
    listing: watch::Receiver<Listing<M>>,
    routees: Vec<ActorRef<M>>,
    logic: RoutingLogic<M>,
    broadcast: Option<Broadcast<M>>,
}

impl<M: Message> ExtensibleBehavior<M> for GroupRouterBehavior<M> {
    fn receive(&mut self, _ctx: &mut Context<M>, msg: M) -> Behavior<M> {
        if self.listing.has_changed().unwrap_or(false) {
            self.routees = self.listing.borrow_and_update().clone();
            debug!(service = self.key.id(), routees = self.routees.len(), "Listing updated");
        }
        self.routees.retain(|routee| !routee.is_terminated());
        route(&mut self.logic, self.broadcast.as_ref(), &self.routees, msg);
        behaviors::same()
    }
}

fn route<M: Message>(
    logic: &mut RoutingLogic<M>,
    broadcast: Option<&Broadcast<M>>,
    routees: &[ActorRef<M>],
    msg: M,
) {
    if let Some(broadcast) = broadcast.filter(|b| (b.predicate)(&msg)) {
        match routees.split_last() {
            Some((last, rest)) => {
                for routee in rest {
                    routee.tell((broadcast.duplicate)(&msg));
                }
                last.tell(msg);
            }
            None => debug!(?msg, "No routees, broadcast dropped"),
        }
        return;
    }

    match logic.select(&msg, routees) {
        Some(routee) => routee.tell(msg),
        None => debug!(?msg, "No routees, message dropped"),
    }
}
