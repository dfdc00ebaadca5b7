//! Graph extraction - samples to deduplicated nodes and raw edges.
//!
//! Nodes are keyed by their shaped name, but a new node takes its `attrs`
//! and `size` from the raw label of the occurrence that created it. Within
//! one sample the source is resolved before the target, so when both shape
//! to the same name the source occurrence creates the node.

use std::collections::HashMap;

use radar_types::{Connection, Node, ReshapeRules, Sample};

/// Turn samples into nodes and unpropagated connections.
///
/// Node ids are dense and assigned in first-seen order; one connection is
/// produced per sample, in sample order, carrying the sample's raw value.
pub fn extract(samples: &[Sample], rules: &ReshapeRules) -> (Vec<Node>, Vec<Connection>) {
    let mut table = NodeTable::new(rules);

    let connections = samples
        .iter()
        .map(|sample| {
            let source = table.resolve(&sample.source_label);
            let target = table.resolve(&sample.target_label);
            Connection::new(source, target, sample.raw_value)
        })
        .collect();

    (table.into_nodes(), connections)
}

/// Request-scoped dedup table.
struct NodeTable<'r> {
    rules: &'r ReshapeRules,
    ids: HashMap<String, usize>,
    nodes: Vec<Node>,
}

impl<'r> NodeTable<'r> {
    fn new(rules: &'r ReshapeRules) -> Self {
        Self {
            rules,
            ids: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    fn resolve(&mut self, raw: &str) -> usize {
        let rules = self.rules;
        let name = rules.shape(raw);
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let id = self.nodes.len();
        self.ids.insert(name.to_string(), id);
        self.nodes.push(Node {
            id,
            name: name.to_string(),
            attrs: rules.attrs_for(raw).to_vec(),
            size: rules.size_for(raw),
        });
        id
    }

    fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}
