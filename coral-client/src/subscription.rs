use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::api::ReplyCreatedVariables;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(0);

/// Live subscriptions currently registered by a client
#[derive(Clone, Debug, Default)]
pub struct Registry(Arc<Mutex<HashMap<u64, ReplyCreatedVariables>>>);

impl Registry {
    pub(crate) fn register(&self, vars: ReplyCreatedVariables) -> (Subscription, oneshot::Receiver<()>) {
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = oneshot::channel();
        self.0.lock().insert(id, vars);
        let sub = Subscription {
            id,
            vars,
            cancel: Some(cancel),
            registry: self.clone(),
        };
        (sub, cancelled)
    }

    pub(crate) fn forget(&self, id: u64) -> bool {
        self.0.lock().remove(&id).is_some()
    }

    pub fn active(&self) -> Vec<ReplyCreatedVariables> {
        self.0.lock().values().copied().collect()
    }
}

/// Handle on a live subscription
///
/// Disposing is idempotent, and dropping the handle disposes it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    vars: ReplyCreatedVariables,
    cancel: Option<oneshot::Sender<()>>,
    registry: Registry,
}

impl Subscription {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn variables(&self) -> &ReplyCreatedVariables {
        &self.vars
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Returns true iff this call is the one that disposed the subscription
    pub fn dispose(&mut self) -> bool {
        match self.cancel.take() {
            None => false,
            Some(cancel) => {
                // the pump may already be gone if the feed ended on its own
                let _ = cancel.send(());
                self.registry.forget(self.id);
                tracing::debug!(vars = ?self.vars, "disposed reply subscription");
                true
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}
