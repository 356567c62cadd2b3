//! Bounded pre-order traversal of syntax trees.
//!
//! Extractors implement [`TreeVisitor`] and keep their accumulated facts on the
//! visitor itself. The driver uses an explicit stack, so deeply nested trees
//! cannot overflow the call stack; subtrees deeper than `max_depth` are cut off
//! and counted.

use tree_sitter::Node;

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// What the driver should do with the children of a visited node.
pub enum Descend<S> {
    /// Do not visit the children.
    Skip,
    /// Visit the children with the given scope.
    Into(S),
}

pub trait TreeVisitor<'t> {
    /// Context handed from a node to its children (e.g. the enclosing function).
    type Scope: Clone;

    fn enter(&mut self, node: Node<'t>, scope: &Self::Scope) -> Descend<Self::Scope>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    pub visited: usize,
    pub truncated: usize,
}

pub fn walk_tree<'t, V: TreeVisitor<'t>>(
    root: Node<'t>,
    scope: V::Scope,
    max_depth: usize,
    visitor: &mut V,
) -> WalkStats {
    let mut stats = WalkStats::default();
    let mut stack: Vec<(Node<'t>, V::Scope, usize)> = vec![(root, scope, 0)];
    let mut children = Vec::new();

    while let Some((node, scope, depth)) = stack.pop() {
        stats.visited += 1;
        let Descend::Into(child_scope) = visitor.enter(node, &scope) else {
            continue;
        };

        if node.child_count() == 0 {
            continue;
        }
        if depth >= max_depth {
            stats.truncated += 1;
            continue;
        }

        let mut cursor = node.walk();
        children.clear();
        children.extend(node.children(&mut cursor));
        for child in children.drain(..).rev() {
            stack.push((child, child_scope.clone(), depth + 1));
        }
    }

    stats
}

/// True if any node in the subtree rooted at `node` (inclusive) satisfies `pred`.
pub fn any_descendant(node: Node<'_>, max_depth: usize, pred: impl Fn(&Node<'_>) -> bool) -> bool {
    let mut stack = vec![(node, 0usize)];
    while let Some((current, depth)) = stack.pop() {
        if pred(&current) {
            return true;
        }
        if depth >= max_depth {
            continue;
        }
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            stack.push((child, depth + 1));
        }
    }
    false
}

pub fn node_text<'s>(node: &Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

/// Text of the child stored under `field`, or `None` when the field is absent.
pub fn field_text<'s>(node: &Node<'_>, field: &str, source: &'s [u8]) -> Option<&'s str> {
    node.child_by_field_name(field)
        .map(|child| node_text(&child, source))
        .filter(|text| !text.is_empty())
}

/// First direct child with the given kind.
pub fn child_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}
