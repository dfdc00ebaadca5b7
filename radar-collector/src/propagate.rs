//! Weakest-link propagation.
//!
//! An edge's displayed strength is capped by every edge that feeds into its
//! source node. The default [`Propagation::Sequential`] pass rewrites edges
//! in list order and later edges see the already rewritten values, so the
//! result depends on the order samples arrived in. [`Propagation::Snapshot`]
//! computes every edge from the original strengths instead.

use radar_types::Connection;
use serde::Deserialize;

/// Propagation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    /// Single in-place pass; rewrites are visible to later edges.
    #[default]
    Sequential,
    /// Every edge is computed against the unrewritten strengths.
    Snapshot,
}

/// Sequential weakest-link pass.
pub fn propagate(edges: Vec<Connection>) -> Vec<Connection> {
    propagate_with(edges, Propagation::Sequential)
}

/// Weakest-link pass with an explicit variant.
pub fn propagate_with(mut edges: Vec<Connection>, mode: Propagation) -> Vec<Connection> {
    match mode {
        Propagation::Sequential => {
            for i in 0..edges.len() {
                let edge = edges[i];
                edges[i].strength = weakest_link(&edges, edge.source, edge.strength);
            }
        }
        Propagation::Snapshot => {
            let original = edges.clone();
            for edge in edges.iter_mut() {
                edge.strength = weakest_link(&original, edge.source, edge.strength);
            }
        }
    }
    edges
}

/// Minimum of `current` and the strength of every edge targeting `node`.
///
/// Plain `<` comparison: a NaN `current` stays NaN, NaN inputs are skipped.
fn weakest_link(edges: &[Connection], node: usize, current: f64) -> f64 {
    edges
        .iter()
        .filter(|d| d.target == node)
        .fold(current, |weakest, d| {
            if d.strength < weakest {
                d.strength
            } else {
                weakest
            }
        })
}
