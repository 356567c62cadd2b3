use tree_sitter::Node;

use crate::facts::models::push_unique;
use crate::facts::{FileFacts, FormTarget, MarkupFacts};
use crate::indexer::tree_walk::{node_text, walk_tree, Descend, TreeVisitor, WalkStats};

const STRUCTURE_TAGS: &[&str] = &[
    "header", "nav", "main", "section", "article", "aside", "footer", "div", "body", "html",
];

const INLINE_SCRIPT: &str = "inline_script";

struct HtmlVisitor<'s> {
    source: &'s [u8],
    markup: MarkupFacts,
    /// Local scripts and stylesheets, in document order.
    local_assets: Vec<String>,
}

impl<'t, 's> TreeVisitor<'t> for HtmlVisitor<'s> {
    type Scope = ();

    fn enter(&mut self, node: Node<'t>, _scope: &()) -> Descend<()> {
        if matches!(node.kind(), "element" | "script_element" | "style_element") {
            self.element(&node);
        }
        Descend::Into(())
    }
}

impl<'s> HtmlVisitor<'s> {
    fn element(&mut self, node: &Node<'_>) {
        let Some(tag) = opening_tag(node) else {
            return;
        };
        let Some(tag_name) = tag_name(&tag, self.source) else {
            return;
        };
        let attributes = attributes(&tag, self.source);
        let attr = |name: &str| {
            attributes
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };

        push_unique(&mut self.markup.all_tags, tag_name.clone());
        if STRUCTURE_TAGS.contains(&tag_name.as_str()) {
            push_unique(&mut self.markup.structure, tag_name.clone());
        }

        match tag_name.as_str() {
            "script" => match attr("src").filter(|s| !s.is_empty()) {
                Some(src) => {
                    self.markup.scripts.push(src.to_string());
                    if is_local_asset(src) {
                        self.local_assets.push(src.to_string());
                    }
                }
                None => push_unique(&mut self.markup.scripts, INLINE_SCRIPT.to_string()),
            },
            "link" => {
                let is_stylesheet = attr("rel")
                    .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")))
                    .unwrap_or(false);
                if let Some(href) = attr("href").filter(|h| is_stylesheet && !h.is_empty()) {
                    self.markup.stylesheets.push(href.to_string());
                    if is_local_asset(href) {
                        self.local_assets.push(href.to_string());
                    }
                }
            }
            "a" => {
                if let Some(href) = attr("href").filter(|h| !h.is_empty()) {
                    self.markup.links.push(href.to_string());
                }
            }
            "title" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() != "text" {
                        continue;
                    }
                    let title = node_text(&child, self.source).trim();
                    if !title.is_empty() {
                        self.markup.titles.push(title.to_string());
                    }
                }
            }
            "form" => self.markup.forms.push(FormTarget {
                action: attr("action").unwrap_or_default().to_string(),
                method: attr("method")
                    .filter(|m| !m.is_empty())
                    .map(str::to_ascii_uppercase)
                    .unwrap_or_else(|| "GET".to_string()),
            }),
            _ => {}
        }

        if let Some(classes) = attr("class") {
            for class in classes.split_whitespace() {
                push_unique(&mut self.markup.class_names, class.to_string());
            }
        }
        if let Some(id) = attr("id").filter(|id| !id.is_empty()) {
            push_unique(&mut self.markup.ids, id.to_string());
        }
    }
}

pub(crate) fn extract(root: Node<'_>, source: &[u8], max_depth: usize, facts: &mut FileFacts) -> WalkStats {
    let mut visitor = HtmlVisitor {
        source,
        markup: MarkupFacts::default(),
        local_assets: Vec::new(),
    };
    let stats = walk_tree(root, (), max_depth, &mut visitor);

    for asset in visitor.local_assets {
        facts.add_require(asset);
    }
    facts.markup = Some(visitor.markup);
    stats
}

/// Paths served from the project itself rather than a CDN or another page.
pub(crate) fn is_local_asset(reference: &str) -> bool {
    !reference.is_empty()
        && !reference.contains("://")
        && !reference.starts_with("//")
        && !reference.starts_with("data:")
        && !reference.starts_with('#')
}

fn opening_tag<'t>(element: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = element.walk();
    let found = element
        .children(&mut cursor)
        .find(|child| matches!(child.kind(), "start_tag" | "self_closing_tag"));
    found
}

fn tag_name(tag: &Node<'_>, source: &[u8]) -> Option<String> {
    let mut cursor = tag.walk();
    let found = tag
        .children(&mut cursor)
        .find(|child| child.kind() == "tag_name")
        .map(|name| node_text(&name, source).to_ascii_lowercase())
        .filter(|name| !name.is_empty());
    found
}

/// `(name, value)` pairs of a tag; valueless attributes get an empty value.
fn attributes(tag: &Node<'_>, source: &[u8]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut cursor = tag.walk();
    for attribute in tag.children(&mut cursor) {
        if attribute.kind() != "attribute" {
            continue;
        }
        let mut name = None;
        let mut value = String::new();
        let mut inner = attribute.walk();
        for part in attribute.children(&mut inner) {
            match part.kind() {
                "attribute_name" => name = Some(node_text(&part, source).to_string()),
                "attribute_value" => value = node_text(&part, source).trim().to_string(),
                "quoted_attribute_value" => {
                    value = node_text(&part, source)
                        .trim_matches(|c| c == '"' || c == '\'')
                        .trim()
                        .to_string()
                }
                _ => {}
            }
        }
        if let Some(name) = name {
            pairs.push((name, value));
        }
    }
    pairs
}
