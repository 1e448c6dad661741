//! EWMA endpoint selection.
//!
//! Scores are time-decayed latency estimates: reading a score decays it
//! toward zero with idle time, recording an observation decays it toward
//! the observed latency. Lower is better; a peer with no recorded
//! observation scores a flat zero and therefore soaks up initial traffic
//! until it has real measurements.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::upstreams::BackendGroup;

/// Fixed decay window for both reads and updates.
pub const DECAY_TIME: Duration = Duration::from_secs(10);

fn decay(value: f64, elapsed: Duration, sample: f64) -> f64 {
    let weight = (-elapsed.as_secs_f64() / DECAY_TIME.as_secs_f64()).exp();
    value * weight + sample * (1.0 - weight)
}

/// Decaying latency estimate for one endpoint identity.
///
/// Owned by exactly one balancer instance; never shared across workers.
#[derive(Debug, Clone)]
pub struct EndpointStat {
    score: f64,
    last_touched: Instant,
}

impl EndpointStat {
    fn first(latency: f64, now: Instant) -> Self {
        Self {
            score: latency,
            last_touched: now,
        }
    }

    /// Current estimate with idle decay applied; records nothing.
    fn score_at(&self, now: Instant) -> f64 {
        decay(self.score, now.saturating_duration_since(self.last_touched), 0.0)
    }

    fn observe(&mut self, latency: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_touched);
        self.score = decay(self.score, elapsed, latency);
        self.last_touched = now;
    }

    /// Raw stored score, before idle decay.
    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Latency-aware balancer for one backend group.
#[derive(Debug)]
pub struct EwmaBalancer {
    peers: Vec<String>,
    stats: HashMap<String, EndpointStat>,
}

impl EwmaBalancer {
    /// Build a balancer over the group's endpoint identities. Stats start
    /// empty and fill in as responses are observed.
    pub fn new(group: &BackendGroup) -> Self {
        Self {
            peers: group.endpoints.iter().map(|e| e.identity()).collect(),
            stats: HashMap::new(),
        }
    }

    /// Pick the endpoint with the lowest current score.
    ///
    /// A single peer is returned without scoring. Ties go to the earlier
    /// peer in list order.
    pub fn balance(&self) -> Option<String> {
        self.balance_at(Instant::now())
    }

    /// `balance` with an explicit clock, for deterministic callers.
    pub fn balance_at(&self, now: Instant) -> Option<String> {
        match self.peers.len() {
            0 => None,
            1 => Some(self.peers[0].clone()),
            _ => {
                let mut best_index = 0;
                let mut best_score = f64::INFINITY;
                for (i, peer) in self.peers.iter().enumerate() {
                    let score = self
                        .stats
                        .get(peer)
                        .map(|stat| stat.score_at(now))
                        .unwrap_or(0.0);
                    if score < best_score {
                        best_score = score;
                        best_index = i;
                    }
                }
                Some(self.peers[best_index].clone())
            }
        }
    }

    /// Fold a response latency (seconds) into the endpoint's estimate.
    pub fn update_stat(&mut self, identity: &str, latency: f64) {
        self.update_stat_at(identity, latency, Instant::now());
    }

    /// `update_stat` with an explicit clock, for deterministic callers.
    pub fn update_stat_at(&mut self, identity: &str, latency: f64, now: Instant) {
        match self.stats.get_mut(identity) {
            Some(stat) => stat.observe(latency, now),
            None => {
                self.stats
                    .insert(identity.to_string(), EndpointStat::first(latency, now));
            }
        }
    }

    /// Reconcile the peer list against a new group definition.
    ///
    /// Identities present on both sides keep their statistics untouched.
    /// Identities that vanished lose theirs. An unchanged endpoint set is a
    /// complete no-op, including peer order.
    pub fn sync(&mut self, group: &BackendGroup) {
        let new_peers: Vec<String> = group.endpoints.iter().map(|e| e.identity()).collect();

        let old_set: HashSet<&str> = self.peers.iter().map(String::as_str).collect();
        let new_set: HashSet<&str> = new_peers.iter().map(String::as_str).collect();

        let added = new_peers
            .iter()
            .filter(|p| !old_set.contains(p.as_str()))
            .count();
        let removed = self
            .peers
            .iter()
            .filter(|p| !new_set.contains(p.as_str()))
            .count();

        if added == 0 && removed == 0 {
            debug!(group = %group.name, "endpoints unchanged, keeping statistics");
            return;
        }

        // Only identities in the new set stay queryable.
        self.stats
            .retain(|identity, _| new_set.contains(identity.as_str()));
        self.peers = new_peers;
        debug!(
            group = %group.name,
            added,
            removed,
            "endpoint set reconciled"
        );
    }

    /// Current peer identities, in selection order.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Recorded statistic for an identity, if any.
    pub fn stat(&self, identity: &str) -> Option<&EndpointStat> {
        self.stats.get(identity)
    }
}
