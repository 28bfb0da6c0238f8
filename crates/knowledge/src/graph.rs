//! Note graph built from resolved wikilinks.

use crate::vault::Notes;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::{Directed, EdgeType, Undirected};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteNode {
    pub key: String,
    pub metadata: BTreeMap<String, Value>,
    pub tags: Vec<String>,
}

/// Note graph keyed by note key.
///
/// An edge exists for every resolved link; repeated links between the same
/// pair collapse into one.
#[derive(Debug, Clone)]
pub struct NoteGraph<Ty: EdgeType> {
    graph: Graph<NoteNode, (), Ty>,
    index: HashMap<String, NodeIndex>,
}

pub type DirectedNoteGraph = NoteGraph<Directed>;
pub type UndirectedNoteGraph = NoteGraph<Undirected>;

impl<Ty: EdgeType> Default for NoteGraph<Ty> {
    fn default() -> Self {
        Self {
            graph: Graph::default(),
            index: HashMap::new(),
        }
    }
}

impl<Ty: EdgeType> NoteGraph<Ty> {
    pub fn add_note(&mut self, node: NoteNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.key) {
            self.graph[idx] = node;
            return idx;
        }
        let key = node.key.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    /// Link two existing notes; a no-op when the edge is already present or
    /// either note is unknown.
    pub fn link(&mut self, from: &str, to: &str) {
        if let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) {
            self.graph.update_edge(a, b, ());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&NoteNode> {
        self.index.get(key).map(|&idx| &self.graph[idx])
    }

    pub(crate) fn index_of(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub(crate) fn key_of(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].key
    }

    pub(crate) fn inner(&self) -> &Graph<NoteNode, (), Ty> {
        &self.graph
    }

    /// Neighbours of `key` in note-key order. For a directed graph these are
    /// the link targets.
    pub fn neighbors(&self, key: &str) -> Vec<&str> {
        let Some(idx) = self.index_of(key) else {
            return Vec::new();
        };
        let mut keys: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.key_of(n))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All note keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.index.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Build a graph from parsed notes.
pub fn build_graph<Ty: EdgeType>(notes: &Notes) -> NoteGraph<Ty> {
    let mut graph = NoteGraph::default();

    for (key, note) in notes {
        graph.add_note(NoteNode {
            key: key.clone(),
            metadata: note.metadata.clone(),
            tags: note.tags.clone(),
        });
    }

    for (key, note) in notes {
        for link in &note.wikilinks {
            if let Some(Some(target)) = note.resolved_wikilinks.get(link) {
                tracing::trace!("{} -> {}", key, target);
                graph.link(key, target);
            }
        }
    }

    tracing::debug!(
        "Built note graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}
