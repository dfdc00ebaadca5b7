//! Graph - the reliability topology rendered by the radar.

/// An endpoint in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Dense, zero-based id in first-seen order.
    pub id: usize,

    /// Shaped (display) name. Unique within a graph.
    pub name: String,

    /// Attributes of the raw label that created this node.
    pub attrs: Vec<String>,

    /// Display size of the raw label that created this node.
    pub size: u32,
}

/// A directed, weighted edge between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connection {
    /// Id of the probing node.
    pub source: usize,

    /// Id of the probed node.
    pub target: usize,

    /// Displayed reliability.
    pub strength: f64,
}

impl Connection {
    /// Create a connection.
    pub fn new(source: usize, target: usize, strength: f64) -> Self {
        Self {
            source,
            target,
            strength,
        }
    }
}

/// The complete graph for one request.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Graph {
    /// Nodes ordered by id.
    pub nodes: Vec<Node>,

    /// Connections in sample order.
    pub connections: Vec<Connection>,
}

impl Graph {
    /// Create a graph from its parts.
    pub fn new(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        Self { nodes, connections }
    }
}
