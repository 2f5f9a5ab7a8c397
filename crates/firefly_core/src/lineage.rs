//! Bounded lineage store and the ancestry graph built from it.

use firefly_data::{Agent, GeneticsRecord, Marker};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// What the store remembers about one genetics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEntry {
    pub id: Uuid,
    pub parents: Option<(Uuid, Uuid)>,
    pub generation: u32,
    pub mutations: usize,
    pub starborn: bool,
}

impl LineageEntry {
    fn from_record(record: &GeneticsRecord) -> Self {
        Self {
            id: record.lineage_id,
            parents: record.parents,
            generation: record.generation,
            mutations: record.mutations.len(),
            starborn: record.has_marker(Marker::Starborn),
        }
    }
}

/// Offspring → parents map with insertion-order eviction.
#[derive(Debug, Clone)]
pub struct LineageStore {
    entries: HashMap<Uuid, LineageEntry>,
    order: VecDeque<Uuid>,
    capacity: usize,
    eviction_fraction: f64,
}

impl LineageStore {
    pub fn new(capacity: usize, eviction_fraction: f64) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            eviction_fraction: eviction_fraction.clamp(0.0, 1.0),
        }
    }

    pub fn record(&mut self, record: &GeneticsRecord) {
        let entry = LineageEntry::from_record(record);
        if self.entries.insert(entry.id, entry).is_none() {
            self.order.push_back(record.lineage_id);
        }
        if self.entries.len() > self.capacity {
            self.evict();
        }
    }

    /// Drops the oldest `ceil(capacity × fraction)` entries.
    fn evict(&mut self) {
        let count = ((self.capacity as f64 * self.eviction_fraction).ceil() as usize).max(1);
        for _ in 0..count {
            match self.order.pop_front() {
                Some(id) => {
                    self.entries.remove(&id);
                }
                None => break,
            }
        }
        tracing::debug!(evicted = count, remaining = self.entries.len(), "Lineage store evicted");
    }

    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<&LineageEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LineageEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Follows the first-parent chain upward from `id`, at most `max_depth` steps.
    ///
    /// The result starts with `id`'s first parent. The walk stops at a founder,
    /// at an evicted entry, or on revisiting an id.
    #[must_use]
    pub fn ancestry(&self, id: &Uuid, max_depth: usize) -> Vec<Uuid> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(*id);
        let mut current = self.entries.get(id);
        while let Some(entry) = current {
            if chain.len() >= max_depth {
                break;
            }
            let Some((parent, _)) = entry.parents else {
                break;
            };
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = self.entries.get(&parent);
        }
        chain
    }
}

pub struct AncestryNode {
    pub id: Uuid,
    pub generation: u32,
    pub mutations: usize,
    pub starborn: bool,
    /// Some present agent still carries this record.
    pub is_alive: bool,
}

/// Directed graph of the lineage store, parent → offspring.
pub struct AncestryTree {
    pub graph: DiGraph<AncestryNode, ()>,
    id_map: HashMap<Uuid, NodeIndex>,
}

impl Default for AncestryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AncestryTree {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_map: HashMap::new(),
        }
    }

    pub fn build(store: &LineageStore, living: &[Agent]) -> Self {
        let alive: HashSet<Uuid> = living
            .iter()
            .filter(|a| a.state.is_present())
            .map(Agent::lineage_id)
            .collect();

        let mut tree = Self::new();
        for entry in store.iter() {
            let idx = tree.graph.add_node(AncestryNode {
                id: entry.id,
                generation: entry.generation,
                mutations: entry.mutations,
                starborn: entry.starborn,
                is_alive: alive.contains(&entry.id),
            });
            tree.id_map.insert(entry.id, idx);
        }

        for entry in store.iter() {
            let Some((a, b)) = entry.parents else {
                continue;
            };
            let Some(&child) = tree.id_map.get(&entry.id) else {
                continue;
            };
            let parents = if a == b { vec![a] } else { vec![a, b] };
            for parent in parents {
                if let Some(&p) = tree.id_map.get(&parent) {
                    tree.graph.add_edge(p, child, ());
                }
            }
        }
        tree
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn contains(&self, id: &Uuid) -> bool {
        self.id_map.contains_key(id)
    }

    /// Graphviz DOT export.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph Lineage {\n");
        dot.push_str("  node [shape=box, style=filled, fontname=\"Arial\"];\n");

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let fill = if node.is_alive { "#fff59d" } else { "#eeeeee" };
            let border = if node.starborn { "gold" } else { "gray40" };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{} (Gen {})\\nMutations: {}\", fillcolor=\"{}\", color=\"{}\"];\n",
                node.id,
                &node.id.to_string()[..8],
                node.generation,
                node.mutations,
                fill,
                border
            ));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    self.graph[from].id, self.graph[to].id
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_data::{Digit, Vec2};

    fn record(n: u128, parents: Option<(u128, u128)>, generation: u32) -> GeneticsRecord {
        GeneticsRecord {
            lineage_id: Uuid::from_u128(n),
            parents: parents.map(|(a, b)| (Uuid::from_u128(a), Uuid::from_u128(b))),
            generation,
            ..GeneticsRecord::default()
        }
    }

    #[test]
    fn test_eviction_drops_oldest_fifth() {
        let mut store = LineageStore::new(10, 0.2);
        for n in 1..=11 {
            store.record(&record(n, None, 0));
        }
        assert_eq!(store.len(), 9);
        assert!(store.get(&Uuid::from_u128(1)).is_none());
        assert!(store.get(&Uuid::from_u128(2)).is_none());
        assert!(store.get(&Uuid::from_u128(3)).is_some());
        assert!(store.get(&Uuid::from_u128(11)).is_some());
    }

    #[test]
    fn test_ancestry_is_depth_bounded() {
        let mut store = LineageStore::new(100, 0.2);
        store.record(&record(1, None, 0));
        for n in 2..=6 {
            store.record(&record(n, Some((n - 1, n - 1)), (n - 1) as u32));
        }
        let chain = store.ancestry(&Uuid::from_u128(6), 10);
        assert_eq!(
            chain,
            vec![5, 4, 3, 2, 1]
                .into_iter()
                .map(Uuid::from_u128)
                .collect::<Vec<_>>()
        );
        assert_eq!(store.ancestry(&Uuid::from_u128(6), 2).len(), 2);
        assert!(store.ancestry(&Uuid::from_u128(1), 10).is_empty());
        assert!(store.ancestry(&Uuid::from_u128(99), 10).is_empty());
    }

    #[test]
    fn test_tree_links_parents_and_marks_living() {
        let mut store = LineageStore::new(100, 0.2);
        store.record(&record(1, None, 0));
        store.record(&record(2, None, 0));
        store.record(&record(3, Some((1, 2)), 1));
        store.record(&record(4, Some((3, 3)), 2));

        let mut living = Agent::new(Uuid::from_u128(50), Vec2::ZERO, Digit::One);
        living.genetics = record(4, Some((3, 3)), 2);
        let tree = AncestryTree::build(&store, &[living]);

        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.edge_count(), 3);
        assert!(!petgraph::algo::is_cyclic_directed(&tree.graph));

        let dot = tree.to_dot();
        assert!(dot.starts_with("digraph Lineage {"));
        assert!(dot.contains("#fff59d"));
        assert_eq!(dot.matches("->").count(), 3);
    }
}
