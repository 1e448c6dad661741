//! Round-robin endpoint selection.

use std::collections::HashSet;

use tracing::debug;

use crate::config::upstreams::BackendGroup;

/// Cycling balancer for one backend group. No statistics; selection order
/// is the peer list order.
#[derive(Debug)]
pub struct RoundRobinBalancer {
    peers: Vec<String>,
    current_index: usize,
}

impl RoundRobinBalancer {
    pub fn new(group: &BackendGroup) -> Self {
        Self {
            peers: group.endpoints.iter().map(|e| e.identity()).collect(),
            current_index: 0,
        }
    }

    /// Advance the cursor and return the peer under it.
    pub fn balance(&mut self) -> Option<String> {
        if self.peers.is_empty() {
            return None;
        }

        self.current_index = (self.current_index + 1) % self.peers.len();
        Some(self.peers[self.current_index].clone())
    }

    /// Reconcile the peer list; an unchanged set keeps the cursor position.
    pub fn sync(&mut self, group: &BackendGroup) {
        let new_peers: Vec<String> = group.endpoints.iter().map(|e| e.identity()).collect();

        let old_set: HashSet<&str> = self.peers.iter().map(String::as_str).collect();
        let new_set: HashSet<&str> = new_peers.iter().map(String::as_str).collect();
        if old_set == new_set {
            return;
        }

        self.current_index %= new_peers.len().max(1);
        self.peers = new_peers;
        debug!(group = %group.name, peers = self.peers.len(), "endpoint set reconciled");
    }

    /// Current peer identities, in selection order.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }
}
