use tree_sitter::Node;

use crate::facts::{CallFact, ClassFact, ClassRole, FileFacts};
use crate::indexer::tree_walk::{field_text, node_text, walk_tree, Descend, TreeVisitor, WalkStats};

/// Parameter names that stand for the receiver, never for a dependency.
const RECEIVER_PARAMS: &[&str] = &["self", "cls"];

#[derive(Debug, Clone, Default)]
struct Scope {
    /// Index into `facts.classes` of the innermost enclosing class.
    class: Option<usize>,
    /// Enclosing top-level function, the only legal caller of a call fact.
    function: Option<String>,
}

struct PythonVisitor<'f, 's> {
    source: &'s [u8],
    facts: &'f mut FileFacts,
    raw_calls: Vec<CallFact>,
}

impl<'t, 'f, 's> TreeVisitor<'t> for PythonVisitor<'f, 's> {
    type Scope = Scope;

    fn enter(&mut self, node: Node<'t>, scope: &Scope) -> Descend<Scope> {
        match node.kind() {
            "class_definition" => {
                let Some(idx) = self.class_definition(node) else {
                    return Descend::Skip;
                };
                Descend::Into(Scope {
                    class: Some(idx),
                    function: None,
                })
            }
            "function_definition" => {
                let mut inner = scope.clone();
                if is_top_level(&node) {
                    if let Some(name) = field_text(&node, "name", self.source) {
                        self.facts.add_function(name);
                        inner.function = Some(name.to_string());
                    }
                }
                Descend::Into(inner)
            }
            "attribute" => {
                if let Some(class_idx) = scope.class {
                    if let Some(target) = self_attribute_target(&node, self.source) {
                        self.facts.classes[class_idx].add_candidate(target);
                    }
                }
                Descend::Into(scope.clone())
            }
            "call" => {
                if let (Some(caller), Some(function)) =
                    (&scope.function, node.child_by_field_name("function"))
                {
                    if function.kind() == "identifier" {
                        let callee = node_text(&function, self.source);
                        self.raw_calls.push(CallFact::new(caller.as_str(), callee));
                    }
                }
                Descend::Into(scope.clone())
            }
            "import_statement" => {
                self.import_statement(node);
                Descend::Skip
            }
            "import_from_statement" => {
                self.import_from_statement(node);
                Descend::Skip
            }
            _ => Descend::Into(scope.clone()),
        }
    }
}

impl<'f, 's> PythonVisitor<'f, 's> {
    fn class_definition(&mut self, node: Node<'_>) -> Option<usize> {
        let name = field_text(&node, "name", self.source)?;
        let annotations = decorators(&node, self.source);
        let role = ClassRole::detect(name, &annotations);
        let mut class = ClassFact::new(name).with_role(role);
        class.annotations = annotations;

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for item in body.children(&mut cursor) {
                let Some(function) = unwrap_definition(item, "function_definition") else {
                    continue;
                };
                let Some(method) = field_text(&function, "name", self.source) else {
                    continue;
                };
                if method == "__init__" {
                    if let Some(params) = function.child_by_field_name("parameters") {
                        for param in constructor_params(&params, self.source) {
                            class.add_candidate(param);
                        }
                    }
                } else {
                    class.add_method(method);
                }
            }
        }

        self.facts.classes.push(class);
        Some(self.facts.classes.len() - 1)
    }

    fn import_statement(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let module = match name.kind() {
                "aliased_import" => field_text(&name, "name", self.source),
                _ => Some(node_text(&name, self.source)),
            };
            if let Some(module) = module.filter(|m| !m.is_empty()) {
                self.facts.add_import(module);
            }
        }
    }

    fn import_from_statement(&mut self, node: Node<'_>) {
        let Some(module) = node.child_by_field_name("module_name") else {
            return;
        };
        let module_text = node_text(&module, self.source);
        self.facts.add_import(module_text);

        if module.kind() != "relative_import" {
            return;
        }

        let dots = module_text.chars().take_while(|c| *c == '.').count();
        let rest = &module_text[dots..];
        if !rest.is_empty() {
            self.facts.add_require(relative_path(dots, rest));
            return;
        }

        // `from . import sibling` names modules, not symbols.
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let imported = match name.kind() {
                "aliased_import" => field_text(&name, "name", self.source),
                _ => Some(node_text(&name, self.source)),
            };
            if let Some(imported) = imported.filter(|m| !m.is_empty()) {
                self.facts.add_require(relative_path(dots, imported));
            }
        }
    }
}

pub(crate) fn extract(root: Node<'_>, source: &[u8], max_depth: usize, facts: &mut FileFacts) -> WalkStats {
    let mut visitor = PythonVisitor {
        source,
        facts,
        raw_calls: Vec::new(),
    };
    let stats = walk_tree(root, Scope::default(), max_depth, &mut visitor);

    let PythonVisitor { facts, raw_calls, .. } = visitor;
    for call in raw_calls {
        if call.caller_name != call.callee_name && facts.functions.contains(&call.callee_name) {
            facts.add_call(call);
        }
    }
    stats
}

/// A function is top-level when it sits directly in the module, decorated or not.
fn is_top_level(node: &Node<'_>) -> bool {
    match node.parent() {
        Some(parent) if parent.kind() == "module" => true,
        Some(parent) if parent.kind() == "decorated_definition" => parent
            .parent()
            .map(|grand| grand.kind() == "module")
            .unwrap_or(false),
        _ => false,
    }
}

/// Unwraps `decorated_definition` around a definition of the given kind.
fn unwrap_definition<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(node);
    }
    if node.kind() == "decorated_definition" {
        return node
            .child_by_field_name("definition")
            .filter(|def| def.kind() == kind);
    }
    None
}

/// Decorator names on a definition, without `@`, arguments or module prefix.
fn decorators(node: &Node<'_>, source: &[u8]) -> Vec<String> {
    let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };
    let mut names = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let text = node_text(&child, source).trim_start_matches('@');
        let head = text.split('(').next().unwrap_or(text).trim();
        let name = head.rsplit('.').next().unwrap_or(head);
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    names
}

/// Named constructor parameters, minus the receiver and any `*args`/`**kwargs`.
fn constructor_params<'s>(params: &Node<'_>, source: &'s [u8]) -> Vec<&'s str> {
    let mut names = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let name = match param.kind() {
            "identifier" => Some(node_text(&param, source)),
            "typed_parameter" => param
                .named_child(0)
                .filter(|first| first.kind() == "identifier")
                .map(|first| node_text(&first, source)),
            "default_parameter" | "typed_default_parameter" => field_text(&param, "name", source),
            _ => None,
        };
        if let Some(name) = name {
            if !RECEIVER_PARAMS.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// For `self.x.y`, returns `x`.
fn self_attribute_target<'s>(node: &Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    let object = node.child_by_field_name("object")?;
    if object.kind() != "attribute" {
        return None;
    }
    let receiver = object.child_by_field_name("object")?;
    if receiver.kind() != "identifier" || node_text(&receiver, source) != "self" {
        return None;
    }
    field_text(&object, "attribute", source)
}

/// `..models.user` with two dots becomes `../models/user`.
fn relative_path(dots: usize, module: &str) -> String {
    let prefix = if dots <= 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    };
    format!("{}{}", prefix, module.replace('.', "/"))
}
