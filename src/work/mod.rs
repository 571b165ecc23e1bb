//! Work set and queue
//!
//! A run processes a fixed, ordered list of seeds. Seeds leave the pending
//! queue strictly in list order and are never re-queued.

use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::Path;

/// Identifier of one independent unit of work
pub type Seed = u32;

/// Number of seeds in the default work set
pub const DEFAULT_SEED_COUNT: Seed = 256;

/// Seeds `0..=255` in ascending order
pub fn default_seeds() -> Vec<Seed> {
    (0..DEFAULT_SEED_COUNT).collect()
}

/// Parse a whitespace separated seed list, keeping the given order
pub fn parse_seed_list(content: &str) -> Result<Vec<Seed>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in content.split_whitespace() {
        let seed: Seed = token
            .parse()
            .with_context(|| format!("Invalid seed '{token}'"))?;
        if !seen.insert(seed) {
            anyhow::bail!("Duplicate seed {seed}");
        }
        seeds.push(seed);
    }

    Ok(seeds)
}

/// Load the seed list file, or the default set when no file is given
pub fn load_seeds(path: Option<&Path>) -> Result<Vec<Seed>> {
    let Some(path) = path else {
        return Ok(default_seeds());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed list: {}", path.display()))?;
    parse_seed_list(&content).with_context(|| format!("Malformed seed list: {}", path.display()))
}

/// Pending seeds plus the seeds currently running
#[derive(Debug, Clone)]
pub struct WorkQueue {
    selected: Vec<Seed>,
    pending: VecDeque<Seed>,
    in_flight: BTreeSet<Seed>,
    completed: BTreeSet<Seed>,
}

impl WorkQueue {
    pub fn new(seeds: Vec<Seed>) -> Self {
        Self {
            pending: seeds.iter().copied().collect(),
            selected: seeds,
            in_flight: BTreeSet::new(),
            completed: BTreeSet::new(),
        }
    }

    /// Take the next pending seed and mark it in flight
    pub fn dequeue(&mut self) -> Option<Seed> {
        let seed = self.pending.pop_front()?;
        self.in_flight.insert(seed);
        Some(seed)
    }

    /// Move an in-flight seed to the completed set
    pub fn complete(&mut self, seed: Seed) {
        if self.in_flight.remove(&seed) {
            self.completed.insert(seed);
        }
    }

    /// Every seed of the run, in dispatch order
    pub fn selected(&self) -> &[Seed] {
        &self.selected
    }

    pub fn pending(&self) -> impl Iterator<Item = Seed> + '_ {
        self.pending.iter().copied()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    pub fn total(&self) -> usize {
        self.selected.len()
    }

    pub fn is_running(&self, seed: Seed) -> bool {
        self.in_flight.contains(&seed)
    }

    pub fn is_completed(&self, seed: Seed) -> bool {
        self.completed.contains(&seed)
    }

    /// No pending and no in-flight seeds remain
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }
}
