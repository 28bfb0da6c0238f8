//! Context traversal over the note graph.

use crate::graph::NoteGraph;
use petgraph::algo::astar;
use petgraph::EdgeType;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraversalError {
    #[error("Unknown note: {0}")]
    UnknownNote(String),
}

/// A note reached by breadth-first search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub key: String,
    /// Hops from the start note
    pub level: usize,
}

/// Result of a shortest-path search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// Keys from start to end, both included
    Found(Vec<String>),
    NoPath,
    UnknownNote(String),
}

/// Breadth-first search from `start`, keeping notes at most `max_levels`
/// hops away, in discovery order.
pub fn bounded_traversal<Ty: EdgeType>(
    graph: &NoteGraph<Ty>,
    start: &str,
    max_levels: usize,
) -> Result<Vec<Visit>, TraversalError> {
    if !graph.contains(start) {
        return Err(TraversalError::UnknownNote(start.to_string()));
    }

    let mut seen = HashSet::from([start.to_string()]);
    let mut queue = VecDeque::from([(start.to_string(), 0usize)]);
    let mut visits = Vec::new();

    while let Some((key, level)) = queue.pop_front() {
        if level < max_levels {
            for neighbor in graph.neighbors(&key) {
                if seen.insert(neighbor.to_string()) {
                    queue.push_back((neighbor.to_string(), level + 1));
                }
            }
        }
        visits.push(Visit { key, level });
    }

    Ok(visits)
}

/// Unweighted shortest path from `start` to `end`.
pub fn shortest_path<Ty: EdgeType>(graph: &NoteGraph<Ty>, start: &str, end: &str) -> PathOutcome {
    let Some(from) = graph.index_of(start) else {
        return PathOutcome::UnknownNote(start.to_string());
    };
    let Some(to) = graph.index_of(end) else {
        return PathOutcome::UnknownNote(end.to_string());
    };

    match astar(graph.inner(), from, |n| n == to, |_| 1usize, |_| 0) {
        Some((_, path)) => PathOutcome::Found(
            path.into_iter()
                .map(|idx| graph.key_of(idx).to_string())
                .collect(),
        ),
        None => PathOutcome::NoPath,
    }
}
