//! # Receptionist
//!
//! A registry of actors by [`ServiceKey`]. Group routers resolve their routees through it,
//! and any code with a system handle can look services up or subscribe to changes.
//!
//! Each key owns a [`watch`] channel holding the current listing. Registrations are removed
//! automatically when the registered actor terminates.

use crate::actor_ref::ActorRef;
use crate::message::Message;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Typed name of a service.
pub struct ServiceKey<M> {
    id: Arc<str>,
    _message: PhantomData<fn() -> M>,
}

impl<M> ServiceKey<M> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Arc::from(id.into()),
            _message: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<M> Clone for ServiceKey<M> {
    fn clone(&self) -> Self {
        Self {
            id: Arc::clone(&self.id),
            _message: PhantomData,
        }
    }
}

impl<M> PartialEq for ServiceKey<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for ServiceKey<M> {}

impl<M> Debug for ServiceKey<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServiceKey({})", self.id)
    }
}

/// Current set of actors registered under one key.
pub type Listing<M> = Vec<ActorRef<M>>;

type Entry = Box<dyn Any + Send + Sync>;

#[derive(Clone, Default)]
pub struct Receptionist {
    services: Arc<DashMap<(TypeId, Arc<str>), Entry>>,
}

impl Receptionist {
    /// Adds `service` to the listing of `key`. Registering the same actor twice is a no-op.
    pub fn register<M: Message>(&self, key: &ServiceKey<M>, service: ActorRef<M>) {
        let Some(listing) = self.listing(key) else {
            return;
        };
        let added = listing.send_if_modified(|refs| {
            if refs.contains(&service) {
                false
            } else {
                refs.push(service.clone());
                true
            }
        });
        if !added {
            return;
        }
        info!(service = key.id(), actor = %service.id(), "Registered");

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let receptionist = self.clone();
            let key = key.clone();
            handle.spawn(async move {
                service.terminated().await;
                receptionist.deregister(&key, &service);
            });
        }
    }

    pub fn deregister<M: Message>(&self, key: &ServiceKey<M>, service: &ActorRef<M>) {
        let Some(listing) = self.listing(key) else {
            return;
        };
        let removed = listing.send_if_modified(|refs| {
            let before = refs.len();
            refs.retain(|registered| registered != service);
            refs.len() != before
        });
        if removed {
            info!(service = key.id(), actor = %service.id(), "Deregistered");
        }
    }

    /// Snapshot of the live actors registered under `key`.
    pub fn find<M: Message>(&self, key: &ServiceKey<M>) -> Listing<M> {
        self.listing(key)
            .map(|listing| {
                listing
                    .borrow()
                    .iter()
                    .filter(|service| !service.is_terminated())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Receiver that observes every change to the listing of `key`.
    pub fn subscribe<M: Message>(&self, key: &ServiceKey<M>) -> watch::Receiver<Listing<M>> {
        match self.listing(key) {
            Some(listing) => listing.subscribe(),
            None => watch::channel(Vec::new()).1,
        }
    }

    fn listing<M: Message>(&self, key: &ServiceKey<M>) -> Option<watch::Sender<Listing<M>>> {
        let entry = self
            .services
            .entry((TypeId::of::<M>(), Arc::clone(&key.id)))
            .or_insert_with(|| Box::new(watch::Sender::new(Listing::<M>::new())));
        let listing = entry.downcast_ref::<watch::Sender<Listing<M>>>().cloned();
        if listing.is_none() {
            warn!(service = key.id(), "Service entry holds an unexpected listing type");
        }
        listing
    }
}

impl Debug for Receptionist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receptionist")
            .field("services", &self.services.len())
            .finish()
    }
}
