use std::collections::{HashMap, HashSet};

use super::{Edge, EdgeKind, Graph, Node, NodeId, NodeKind};
use crate::facts::ClassRole;

/// Deduplication key of a node: what it is, what it is called, and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    kind: NodeKind,
    label: String,
    file: String,
    owner: Option<String>,
}

/// Accumulates nodes and edges from the resolution passes. A node requested
/// twice under the same key is created once; self-loops, duplicate edges and
/// edges to unknown nodes are dropped.
#[derive(Debug, Default)]
pub struct GraphAssembler {
    graph: Graph,
    index: HashMap<NodeKey, NodeId>,
    edges: HashSet<Edge>,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_node(&mut self, name: &str, file: &str, role: ClassRole) -> NodeId {
        self.intern(
            NodeKey {
                kind: NodeKind::Class,
                label: name.to_string(),
                file: file.to_string(),
                owner: None,
            },
            Some(role),
        )
    }

    pub fn method_node(&mut self, name: &str, file: &str, class: &str) -> NodeId {
        self.intern(
            NodeKey {
                kind: NodeKind::Method,
                label: name.to_string(),
                file: file.to_string(),
                owner: Some(class.to_string()),
            },
            None,
        )
    }

    /// A top-level function or UI component.
    pub fn callable_node(&mut self, kind: NodeKind, name: &str, file: &str) -> NodeId {
        debug_assert!(matches!(kind, NodeKind::Function | NodeKind::Component));
        self.intern(
            NodeKey {
                kind,
                label: name.to_string(),
                file: file.to_string(),
                owner: None,
            },
            None,
        )
    }

    pub fn file_node(&mut self, filename: &str, filepath: &str) -> NodeId {
        self.intern(
            NodeKey {
                kind: NodeKind::File,
                label: filename.to_string(),
                file: filepath.to_string(),
                owner: None,
            },
            None,
        )
    }

    /// Id of an existing top-level function or component node.
    pub fn find_callable(&self, name: &str, file: &str) -> Option<NodeId> {
        [NodeKind::Function, NodeKind::Component]
            .into_iter()
            .find_map(|kind| {
                self.index
                    .get(&NodeKey {
                        kind,
                        label: name.to_string(),
                        file: file.to_string(),
                        owner: None,
                    })
                    .copied()
            })
    }

    /// Returns `true` when the edge was added.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> bool {
        if from == to || from.0 >= self.graph.nodes.len() || to.0 >= self.graph.nodes.len() {
            return false;
        }
        let edge = Edge { from, to, kind };
        if !self.edges.insert(edge) {
            return false;
        }
        self.graph.edges.push(edge);
        true
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edges.len()
    }

    pub fn finish(self) -> Graph {
        self.graph
    }

    fn intern(&mut self, key: NodeKey, role: Option<ClassRole>) -> NodeId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = NodeId(self.graph.nodes.len());
        self.graph.nodes.push(Node {
            id,
            label: key.label.clone(),
            kind: key.kind,
            file: Some(key.file.clone()),
            owner: key.owner.clone(),
            role,
        });
        self.index.insert(key, id);
        id
    }
}
