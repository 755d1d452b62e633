//! Routee selection for routers.
//!
//! [`RoutingPolicy`] is the public, inspectable description of how a router picks a routee.
//! The router keeps the matching [`RoutingLogic`] with whatever per-router state the policy
//! needs (a cursor, a hash ring).

use crate::actor_ref::{ActorId, ActorRef};
use crate::message::Message;
use rand::Rng;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPolicy {
    RoundRobin,
    Random,
    ConsistentHashing { virtual_nodes_factor: usize },
}

pub(crate) type HashKeyFn<M> = Arc<dyn Fn(&M) -> String + Send + Sync>;

/// Policy as configured on a router builder.
pub(crate) enum RoutingConfig<M> {
    RoundRobin,
    Random,
    ConsistentHashing {
        virtual_nodes_factor: usize,
        key_of: HashKeyFn<M>,
    },
}

impl<M> Clone for RoutingConfig<M> {
    fn clone(&self) -> Self {
        match self {
            Self::RoundRobin => Self::RoundRobin,
            Self::Random => Self::Random,
            Self::ConsistentHashing {
                virtual_nodes_factor,
                key_of,
            } => Self::ConsistentHashing {
                virtual_nodes_factor: *virtual_nodes_factor,
                key_of: Arc::clone(key_of),
            },
        }
    }
}

impl<M> RoutingConfig<M> {
    pub(crate) fn policy(&self) -> RoutingPolicy {
        match self {
            Self::RoundRobin => RoutingPolicy::RoundRobin,
            Self::Random => RoutingPolicy::Random,
            Self::ConsistentHashing {
                virtual_nodes_factor,
                ..
            } => RoutingPolicy::ConsistentHashing {
                virtual_nodes_factor: *virtual_nodes_factor,
            },
        }
    }

    pub(crate) fn logic(&self) -> RoutingLogic<M> {
        match self {
            Self::RoundRobin => RoutingLogic::RoundRobin { cursor: 0 },
            Self::Random => RoutingLogic::Random,
            Self::ConsistentHashing {
                virtual_nodes_factor,
                key_of,
            } => RoutingLogic::ConsistentHashing(HashRing {
                virtual_nodes_factor: (*virtual_nodes_factor).max(1),
                key_of: Arc::clone(key_of),
                members: Vec::new(),
                ring: BTreeMap::new(),
            }),
        }
    }
}

pub(crate) enum RoutingLogic<M> {
    RoundRobin { cursor: usize },
    Random,
    ConsistentHashing(HashRing<M>),
}

impl<M: Message> RoutingLogic<M> {
    /// Picks the routee for `msg`, or `None` when there are no routees.
    pub(crate) fn select<'a>(
        &mut self,
        msg: &M,
        routees: &'a [ActorRef<M>],
    ) -> Option<&'a ActorRef<M>> {
        if routees.is_empty() {
            return None;
        }
        match self {
            Self::RoundRobin { cursor } => {
                // The set may have shrunk since the last pick.
                let index = *cursor % routees.len();
                *cursor = index + 1;
                routees.get(index)
            }
            Self::Random => routees.get(rand::rng().random_range(0..routees.len())),
            Self::ConsistentHashing(ring) => ring.select(msg, routees),
        }
    }
}

/// Hash ring with `virtual_nodes_factor` points per routee.
///
/// Points are derived from routee paths, so the same routee set maps keys the same way.
pub(crate) struct HashRing<M> {
    virtual_nodes_factor: usize,
    key_of: HashKeyFn<M>,
    members: Vec<ActorId>,
    ring: BTreeMap<u64, usize>,
}

impl<M: Message> HashRing<M> {
    fn select<'a>(&mut self, msg: &M, routees: &'a [ActorRef<M>]) -> Option<&'a ActorRef<M>> {
        self.refresh(routees);
        let point = hash_of(&(self.key_of)(msg));
        let index = self
            .ring
            .range(point..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, index)| *index)?;
        routees.get(index)
    }

    fn refresh(&mut self, routees: &[ActorRef<M>]) {
        let same_members = self.members.len() == routees.len()
            && self
                .members
                .iter()
                .zip(routees)
                .all(|(member, routee)| *member == routee.id());
        if same_members {
            return;
        }
        self.members = routees.iter().map(ActorRef::id).collect();
        self.ring.clear();
        for (index, routee) in routees.iter().enumerate() {
            for replica in 0..self.virtual_nodes_factor {
                self.ring
                    .insert(hash_of(&(routee.path(), replica)), index);
            }
        }
    }
}

fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
