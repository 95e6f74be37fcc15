//! Best-first frontier with a closed set of finalized poses.
//!
//! The heap holds `(key, node_id)` pairs; nodes themselves live in the
//! search arena. The closed set is a `BTreeSet` so any iteration at a
//! serialization boundary is ordered.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use skyroute_kernel::carrier::pose::Pose;

use crate::node::FrontierKey;

/// `BinaryHeap` is a max-heap; entries are wrapped in `Reverse` so the
/// lowest key pops first.
#[derive(Debug, PartialEq, Eq)]
struct FrontierEntry {
    key: FrontierKey,
    node_id: u64,
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Best-first frontier manager.
///
/// The same pose may sit in the heap more than once (reached along
/// different paths before either was closed). The first one popped closes
/// the pose; later pops of that pose are stale.
#[derive(Debug, Default)]
pub struct BestFirstFrontier {
    heap: BinaryHeap<Reverse<FrontierEntry>>,
    closed: BTreeSet<Pose>,
    high_water: u64,
}

impl BestFirstFrontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: FrontierKey, node_id: u64) {
        self.heap.push(Reverse(FrontierEntry { key, node_id }));
        let size = self.heap.len() as u64;
        if size > self.high_water {
            self.high_water = size;
        }
    }

    /// Pop the lowest-key entry.
    pub fn pop(&mut self) -> Option<(FrontierKey, u64)> {
        self.heap.pop().map(|Reverse(e)| (e.key, e.node_id))
    }

    /// Mark `pose` as finalized. Returns `false` if it already was.
    pub fn close(&mut self, pose: Pose) -> bool {
        self.closed.insert(pose)
    }

    #[must_use]
    pub fn is_closed(&self, pose: &Pose) -> bool {
        self.closed.contains(pose)
    }

    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Largest heap size observed.
    #[must_use]
    pub fn high_water(&self) -> u64 {
        self.high_water
    }
}
