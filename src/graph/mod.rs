//! Cross-file dependency graph: model, assembly and resolution.

pub mod assembler;
pub mod matcher;
pub mod registry;
pub mod resolver;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::facts::ClassRole;

pub use assembler::GraphAssembler;
pub use matcher::{
    Containment, ExactName, MatchLadder, MatchOutcome, MatchStrategy, ShortToken, StrippedContainment,
};
pub use registry::{GlobalRegistry, RegistryBuilder, RegistryEntry};
pub use resolver::{Ambiguity, DependencyResolver, Resolution, ResolutionReport};

/// Position of a node in [`Graph::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Class,
    Method,
    Function,
    Component,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Class => "class",
            NodeKind::Method => "method",
            NodeKind::Function => "function",
            NodeKind::Component => "component",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    #[serde(rename = "has-method")]
    HasMethod,
    #[serde(rename = "depends-on")]
    DependsOn,
    #[serde(rename = "requires")]
    Requires,
    #[serde(rename = "calls")]
    Calls,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::HasMethod => "has-method",
            EdgeKind::DependsOn => "depends-on",
            EdgeKind::Requires => "requires",
            EdgeKind::Calls => "calls",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    /// Project-relative path of the declaring file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Owning class, for methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ClassRole>,
}

impl Node {
    /// Identity of a node independent of its id: kind, label and owning scope.
    pub fn qualified_name(&self) -> String {
        let mut name = format!("{}:{}", self.kind.as_str(), self.file.as_deref().unwrap_or(""));
        if let Some(owner) = &self.owner {
            name.push_str("::");
            name.push_str(owner);
        }
        name.push_str("::");
        name.push_str(&self.label);
        name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

/// Directed graph of a project. Cycles are allowed; self-loops and
/// duplicate edges are not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Targets of `kind` edges leaving `from`, in edge order.
    pub fn targets(&self, from: NodeId, kind: EdgeKind) -> impl Iterator<Item = &Node> {
        self.edges
            .iter()
            .filter(move |e| e.from == from && e.kind == kind)
            .filter_map(move |e| self.node(e.to))
    }

    /// Edges as `(from, kind, to)` qualified names, so two graphs can be
    /// compared regardless of id numbering.
    pub fn labeled_edges(&self) -> BTreeSet<(String, EdgeKind, String)> {
        self.edges
            .iter()
            .filter_map(|e| {
                let from = self.node(e.from)?;
                let to = self.node(e.to)?;
                Some((from.qualified_name(), e.kind, to.qualified_name()))
            })
            .collect()
    }

    pub fn labeled_nodes(&self) -> BTreeSet<String> {
        self.nodes.iter().map(Node::qualified_name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
