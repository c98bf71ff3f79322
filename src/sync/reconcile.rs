//! Generation-tagged reconciliation.
//!
//! DESIGN
//! ======
//! A [`Generation`] is a counter behind a `watch` channel. Starting a cycle
//! advances it and hands the cycle a [`CycleToken`]; anything that should
//! invalidate in-flight results (a newer cycle, logout) advances it again.
//! A token can be checked synchronously (`is_current`) right before a commit,
//! or awaited (`superseded`) so a waiting cycle abandons itself at once.
//!
//! Per-kind responses merge into a [`ReconciliationBuffer`]. The buffer only
//! becomes a snapshot once every requested kind has reported.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{GameObject, ObjectId, ObjectSnapshot};

// =============================================================================
// GENERATION
// =============================================================================

#[derive(Debug, Clone)]
pub struct Generation {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for Generation {
    fn default() -> Self {
        Self::new()
    }
}

impl Generation {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Invalidate every outstanding token and issue one for the new generation.
    pub fn advance(&self) -> CycleToken {
        let mut next = 0;
        self.tx.send_modify(|generation| {
            *generation += 1;
            next = *generation;
        });
        CycleToken { generation: next, rx: self.tx.subscribe() }
    }

    /// Invalidate every outstanding token.
    pub fn invalidate(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|generation| {
            *generation += 1;
            next = *generation;
        });
        next
    }
}

#[derive(Debug)]
pub struct CycleToken {
    generation: u64,
    rx: watch::Receiver<u64>,
}

impl CycleToken {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        *self.rx.borrow() == self.generation
    }

    /// Resolves once a newer generation has been issued.
    pub async fn superseded(&mut self) {
        let generation = self.generation;
        if self.rx.wait_for(|current| *current != generation).await.is_err() {
            // Sender gone: nothing can commit anymore.
            tracing::debug!(generation, "generation channel closed");
        }
    }
}

// =============================================================================
// BUFFER
// =============================================================================

/// Transient merge target for one cycle.
#[derive(Debug)]
pub struct ReconciliationBuffer {
    generation: u64,
    waiting: BTreeSet<String>,
    objects: BTreeMap<ObjectId, GameObject>,
}

impl ReconciliationBuffer {
    #[must_use]
    pub fn new(generation: u64, kinds: &[String]) -> Self {
        Self { generation, waiting: kinds.iter().cloned().collect(), objects: BTreeMap::new() }
    }

    /// Kinds that have not reported yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.waiting.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Merge one kind's response. Returns `false` for a kind that was not
    /// requested or has already reported; its records are dropped.
    pub fn merge(&mut self, kind: &str, objects: Vec<GameObject>) -> bool {
        if !self.waiting.remove(kind) {
            return false;
        }
        self.objects.extend(objects.into_iter().map(|object| (object.id, object)));
        true
    }

    /// Promote to a snapshot. `None` while any kind is still outstanding.
    #[must_use]
    pub fn into_snapshot(self) -> Option<ObjectSnapshot> {
        self.is_complete().then(|| ObjectSnapshot::new(self.generation, self.objects))
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
