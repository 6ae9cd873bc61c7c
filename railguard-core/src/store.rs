//! Per-node rolling history shared across concurrent requests
//!
//! ## Locking Model
//!
//! ```text
//! DashMap<node_id, Arc<Mutex<RollingWindow<40>>>>
//!   │                         │
//!   │ sharded lookup/insert   └── one mutex per node: push + std
//! ```
//!
//! The map guard is always released before a node's mutex is taken, so:
//!
//! - requests for the same node serialize on that node's mutex
//! - requests for different nodes never contend on a node lock
//! - registering a new node only locks the one shard its id hashes to, and
//!   never waits on work already holding an existing node's window
//!
//! Nodes are never evicted. The map grows with the number of distinct ids
//! seen during the process lifetime.

use std::string::String;
use std::sync::Arc;
use std::vec::Vec;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    buffer::{RollingWindow, WindowStats},
    constants::WINDOW,
};

type SharedWindow<const N: usize> = Arc<Mutex<RollingWindow<N>>>;

/// Concurrent map from node id to that node's rolling window
pub struct NodeBufferStore<const N: usize = WINDOW> {
    nodes: DashMap<String, SharedWindow<N>>,
}

impl<const N: usize> NodeBufferStore<N> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
        }
    }

    /// Record a magnitude sample and return the window's population std
    ///
    /// The append, the eviction of the oldest sample and the std computation
    /// happen under the node's lock as one atomic step.
    pub fn append(&self, node_id: &str, accel_mag: f64) -> f64 {
        let window = self.window(node_id);
        let mut window = window.lock();
        window.push(accel_mag);
        window.std_dev()
    }

    /// Copy of a node's samples, oldest first
    pub fn snapshot(&self, node_id: &str) -> Option<Vec<f64>> {
        let window = self.existing(node_id)?;
        let window = window.lock();
        Some(window.iter().copied().collect())
    }

    /// Number of samples held for a node (0 for unknown nodes)
    pub fn len(&self, node_id: &str) -> usize {
        self.existing(node_id).map_or(0, |window| window.lock().len())
    }

    /// Rolling statistics for a node
    pub fn stats(&self, node_id: &str) -> Option<WindowStats> {
        self.existing(node_id).map(|window| window.lock().stats())
    }

    /// Number of distinct nodes seen so far
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no node has reported yet
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn existing(&self, node_id: &str) -> Option<SharedWindow<N>> {
        self.nodes.get(node_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a node's window, creating it on first sight
    fn window(&self, node_id: &str) -> SharedWindow<N> {
        if let Some(window) = self.existing(node_id) {
            return window;
        }

        // Another request may have registered the node since the lookup
        let entry = self.nodes.entry(node_id.to_owned()).or_insert_with(|| {
            log::debug!("Registered rolling window for node {}", node_id);
            Arc::new(Mutex::new(RollingWindow::new()))
        });
        Arc::clone(entry.value())
    }
}

impl<const N: usize> Default for NodeBufferStore<N> {
    fn default() -> Self {
        Self::new()
    }
}
