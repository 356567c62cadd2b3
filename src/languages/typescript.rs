//! TypeScript / TSX extraction: the script visitor plus type-level declarations.

use tree_sitter::Node;

use super::{is_builtin_type, javascript, Language};
use crate::facts::{ClassFact, ClassRole, FileFacts};
use crate::indexer::tree_walk::{field_text, node_text, WalkStats};

pub(crate) fn extract(root: Node<'_>, source: &[u8], max_depth: usize, facts: &mut FileFacts) -> WalkStats {
    javascript::extract(root, source, max_depth, facts)
}

/// An interface becomes a class fact with the interface role and its method
/// signatures as methods.
pub(super) fn interface_fact(node: &Node<'_>, source: &[u8]) -> Option<ClassFact> {
    let name = field_text(node, "name", source)?;
    let mut class = ClassFact::new(name).with_role(ClassRole::Interface);

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() != "method_signature" {
                continue;
            }
            if let Some(method) = field_text(&member, "name", source) {
                class.add_method(method);
            }
        }
    }
    Some(class)
}

/// Decorator names on a class, including those written before `export`.
pub(super) fn decorator_names(class: &Node<'_>, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let holders = class
        .parent()
        .filter(|p| p.kind() == "export_statement")
        .into_iter()
        .chain(std::iter::once(*class));

    for holder in holders {
        let mut cursor = holder.walk();
        for child in holder.children(&mut cursor) {
            if child.kind() != "decorator" {
                continue;
            }
            if let Some(name) = child.named_child(0).and_then(|expr| decorator_name(&expr, source)) {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn decorator_name<'s>(expr: &Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    match expr.kind() {
        "identifier" => Some(node_text(expr, source)),
        "member_expression" => field_text(expr, "property", source),
        "call_expression" => expr
            .child_by_field_name("function")
            .and_then(|function| decorator_name(&function, source)),
        _ => None,
    }
}

/// Project type named by a `: Type` annotation. Generic wrappers yield their
/// first project-level argument, otherwise the wrapper itself.
pub(super) fn annotated_type_name(annotation: &Node<'_>, source: &[u8]) -> Option<String> {
    let ty = if annotation.kind() == "type_annotation" {
        annotation.named_child(0)?
    } else {
        *annotation
    };
    unwrap_type(&ty, source)
}

fn unwrap_type(ty: &Node<'_>, source: &[u8]) -> Option<String> {
    match ty.kind() {
        "type_identifier" => Some(node_text(ty, source).to_string()),
        "nested_type_identifier" => field_text(ty, "name", source).map(str::to_string),
        "generic_type" => {
            if let Some(args) = ty.child_by_field_name("type_arguments") {
                let mut cursor = args.walk();
                let project_arg = args
                    .named_children(&mut cursor)
                    .filter_map(|arg| unwrap_type(&arg, source))
                    .find(|name| !is_builtin_type(name, Language::TypeScript));
                if project_arg.is_some() {
                    return project_arg;
                }
            }
            let base = ty.child_by_field_name("name")?;
            unwrap_type(&base, source)
        }
        "array_type" => ty.named_child(0).and_then(|elem| unwrap_type(&elem, source)),
        _ => None,
    }
}
