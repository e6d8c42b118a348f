//! Mutation observation routed through a debouncer.

use crate::debounce::Debouncer;
use core::cell::Cell;
use dom::{Document, MutationObserver, MutationRecord, NodeId, ObserveOptions};
use log::{debug, trace};
use tokio::task::{AbortHandle, spawn_local};

/// A document observer whose batches feed a [`Debouncer`].
///
/// Every batch is filtered down to records whose target is still in the
/// document; empty batches are discarded. A burst of mutations spread over
/// several batches therefore collapses into one debounced pass.
#[derive(Debug)]
pub struct DomObserverBinding {
    observer: MutationObserver,
    delivery: AbortHandle,
    debouncer: Debouncer<Vec<MutationRecord>>,
    connected: Cell<bool>,
}

impl DomObserverBinding {
    pub fn new(document: &Document, debouncer: Debouncer<Vec<MutationRecord>>) -> Self {
        let (observer, mut receiver) = document.create_observer();
        let forward = debouncer.clone();
        let document = document.clone();
        let id = observer.id();
        let delivery = spawn_local(async move {
            while let Some(batch) = receiver.next_batch().await {
                let live: Vec<MutationRecord> = batch
                    .into_iter()
                    .filter(|record| document.is_connected(record.target))
                    .collect();
                if live.is_empty() {
                    continue;
                }
                trace!("observer {id:?} forwarding {} records", live.len());
                forward.invoke(live);
            }
        })
        .abort_handle();
        Self {
            observer,
            delivery,
            debouncer,
            connected: Cell::new(true),
        }
    }

    /// Watch `target` with `options`. Returns false if the target is gone or
    /// the binding was disconnected.
    pub fn observe(&self, target: NodeId, options: ObserveOptions) -> bool {
        self.connected.get() && self.observer.observe(target, options)
    }

    pub fn debouncer(&self) -> &Debouncer<Vec<MutationRecord>> {
        &self.debouncer
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn target_count(&self) -> usize {
        self.observer.target_count()
    }

    /// Stop observing, stop delivery and cancel pending work. Idempotent.
    pub fn disconnect(&self) {
        if !self.connected.replace(false) {
            return;
        }
        self.observer.disconnect();
        self.delivery.abort();
        self.debouncer.cancel();
        debug!("observer {:?} disconnected", self.observer.id());
    }
}

impl Drop for DomObserverBinding {
    fn drop(&mut self) {
        self.disconnect();
    }
}
