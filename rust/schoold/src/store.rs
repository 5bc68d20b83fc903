use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::backend::{Backend, SubscriptionId};
use crate::error::CoreResult;
use crate::model::{Collection, Record};
use crate::notify::{NoticeQueue, Severity};

#[derive(Default)]
struct Mirror {
    snapshots: HashMap<Collection, Arc<Vec<Record>>>,
    revisions: HashMap<Collection, u64>,
    failed: HashSet<Collection>,
}

/// In-memory mirror of every collection, fed by backend change-feeds.
///
/// A collection is only ever replaced whole, so a reader holding a
/// snapshot never sees a partially applied update.
pub struct EntityStore {
    mirror: Arc<RwLock<Mirror>>,
    notices: NoticeQueue,
    subscriptions: Vec<SubscriptionId>,
}

impl EntityStore {
    pub fn new(notices: NoticeQueue) -> Self {
        EntityStore {
            mirror: Arc::new(RwLock::new(Mirror::default())),
            notices,
            subscriptions: Vec::new(),
        }
    }

    pub fn is_streaming(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Subscribes to all seven collections. Any previous subscriptions on
    /// `backend` are dropped first.
    pub fn init(&mut self, backend: &mut dyn Backend) -> CoreResult<()> {
        self.teardown(backend);
        for collection in Collection::ALL {
            let mirror = self.mirror.clone();
            let notices = self.notices.clone();
            let id = backend.subscribe(
                collection,
                Box::new(move |snapshot| {
                    let mut m = mirror.write().unwrap_or_else(|e| e.into_inner());
                    match snapshot {
                        Ok(rows) => {
                            m.failed.remove(&collection);
                            m.snapshots.insert(collection, Arc::new(rows));
                            *m.revisions.entry(collection).or_insert(0) += 1;
                        }
                        Err(e) => {
                            // Keep the last good snapshot; report once until it recovers.
                            if m.failed.insert(collection) {
                                tracing::error!(collection = collection.as_str(), error = %e, "change-feed failed");
                                notices.push(
                                    Severity::Error,
                                    format!("failed to load {}", collection.as_str()),
                                );
                            }
                        }
                    }
                }),
            );
            match id {
                Ok(id) => self.subscriptions.push(id),
                Err(e) => {
                    tracing::error!(collection = collection.as_str(), error = %e, "subscribe failed");
                    self.notices.push(
                        Severity::Error,
                        format!("failed to load {}", collection.as_str()),
                    );
                    self.teardown(backend);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Unsubscribes everything. Snapshots stay readable.
    pub fn teardown(&mut self, backend: &mut dyn Backend) {
        for id in self.subscriptions.drain(..) {
            backend.unsubscribe(id);
        }
    }

    /// Forgets all snapshots, for switching to another workspace.
    pub fn clear(&mut self) {
        let mut m = self.mirror.write().unwrap_or_else(|e| e.into_inner());
        *m = Mirror::default();
    }

    pub fn snapshot(&self, collection: Collection) -> Arc<Vec<Record>> {
        let m = self.mirror.read().unwrap_or_else(|e| e.into_inner());
        m.snapshots.get(&collection).cloned().unwrap_or_default()
    }

    /// Number of snapshots delivered for `collection`; lets views detect change.
    pub fn revision(&self, collection: Collection) -> u64 {
        let m = self.mirror.read().unwrap_or_else(|e| e.into_inner());
        m.revisions.get(&collection).copied().unwrap_or(0)
    }

    pub fn find(&self, collection: Collection, id: &str) -> Option<Record> {
        self.snapshot(collection).iter().find(|r| r.id == id).cloned()
    }

    /// Installs a snapshot directly, as a feed delivery would.
    #[cfg(test)]
    pub fn replace(&self, collection: Collection, rows: Vec<Record>) {
        let mut m = self.mirror.write().unwrap_or_else(|e| e.into_inner());
        m.snapshots.insert(collection, Arc::new(rows));
        *m.revisions.entry(collection).or_insert(0) += 1;
    }
}
