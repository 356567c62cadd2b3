use tree_sitter::Node;

use super::unquote;
use crate::facts::models::push_unique;
use crate::facts::{FileFacts, StyleFacts};
use crate::indexer::tree_walk::{child_of_kind, node_text, walk_tree, Descend, TreeVisitor, WalkStats};

use super::html::is_local_asset;

struct CssVisitor<'s> {
    source: &'s [u8],
    style: StyleFacts,
    imports: Vec<String>,
}

impl<'t, 's> TreeVisitor<'t> for CssVisitor<'s> {
    type Scope = ();

    fn enter(&mut self, node: Node<'t>, _scope: &()) -> Descend<()> {
        match node.kind() {
            "class_selector" => {
                if let Some(name) = self.child_text(&node, "class_name") {
                    push_unique(&mut self.style.class_names, name);
                }
            }
            "id_selector" => {
                if let Some(name) = self.child_text(&node, "id_name") {
                    push_unique(&mut self.style.ids, name);
                }
            }
            "tag_name" => {
                let tag = node_text(&node, self.source);
                if !tag.is_empty() {
                    push_unique(&mut self.style.selectors, tag.to_string());
                }
            }
            "declaration" => {
                if let Some(property) = self.child_text(&node, "property_name") {
                    push_unique(&mut self.style.properties, property);
                }
            }
            "media_statement" => {
                let text = node_text(&node, self.source);
                if let Some((query, _)) = text.split_once('{') {
                    push_unique(&mut self.style.media_queries, query.trim().to_string());
                }
            }
            "keyframes_statement" => {
                if let Some(name) = self.child_text(&node, "keyframes_name") {
                    self.style.animations.push(name);
                }
            }
            "import_statement" => {
                if let Some(target) = import_target(&node, self.source) {
                    self.imports.push(target.to_string());
                }
                return Descend::Skip;
            }
            _ => {}
        }
        Descend::Into(())
    }
}

impl<'s> CssVisitor<'s> {
    fn child_text(&self, node: &Node<'_>, kind: &str) -> Option<String> {
        child_of_kind(node, kind)
            .map(|child| node_text(&child, self.source).trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

pub(crate) fn extract(root: Node<'_>, source: &[u8], max_depth: usize, facts: &mut FileFacts) -> WalkStats {
    let mut visitor = CssVisitor {
        source,
        style: StyleFacts::default(),
        imports: Vec::new(),
    };
    let stats = walk_tree(root, (), max_depth, &mut visitor);

    for target in visitor.imports {
        facts.add_import(target.as_str());
        if is_local_asset(&target) {
            facts.add_require(target);
        }
    }
    facts.style = Some(visitor.style);
    stats
}

/// Target of `@import "x.css"` or `@import url(x.css)`.
fn import_target<'s>(node: &Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        if matches!(current.kind(), "string_value" | "plain_value") {
            let target = unquote(node_text(&current, source));
            if !target.is_empty() {
                return Some(target);
            }
        }
        let mut cursor = current.walk();
        let children: Vec<_> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
