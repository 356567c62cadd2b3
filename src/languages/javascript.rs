//! JavaScript / JSX extraction.
//!
//! The same visitor serves TypeScript and TSX: type-level nodes never occur in
//! a JavaScript tree, and their handlers live in [`super::typescript`].

use once_cell::sync::Lazy;
use std::collections::HashSet;
use tree_sitter::Node;

use super::{is_builtin_type, is_relative_reference, typescript, unquote};
use crate::facts::{CallFact, ClassFact, ClassRole, FileFacts, ReactPattern};
use crate::indexer::tree_walk::{any_descendant, field_text, node_text, walk_tree, Descend, TreeVisitor, WalkStats};

/// React's built-in hooks. Any other `useX` call is a custom hook.
static BUILTIN_HOOKS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "useState",
        "useEffect",
        "useContext",
        "useReducer",
        "useMemo",
        "useCallback",
        "useRef",
        "useLayoutEffect",
        "useInsertionEffect",
        "useImperativeHandle",
        "useDebugValue",
        "useId",
        "useTransition",
        "useDeferredValue",
        "useSyncExternalStore",
    ]
    .into_iter()
    .collect()
});

const SIDE_EFFECT_HOOKS: &[&str] = &["useEffect", "useLayoutEffect", "useInsertionEffect"];

const MAX_EXPORT_CHARS: usize = 50;

#[derive(Debug, Clone, Default)]
struct Scope {
    function: Option<String>,
    class: Option<usize>,
}

struct ScriptVisitor<'f, 's> {
    source: &'s [u8],
    facts: &'f mut FileFacts,
    max_depth: usize,
    raw_calls: Vec<CallFact>,
}

impl<'t, 'f, 's> TreeVisitor<'t> for ScriptVisitor<'f, 's> {
    type Scope = Scope;

    fn enter(&mut self, node: Node<'t>, scope: &Scope) -> Descend<Scope> {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                match field_text(&node, "name", self.source) {
                    Some(name) if is_top_level(&node) => {
                        self.declare_callable(name, &node);
                        Descend::Into(Scope {
                            function: Some(name.to_string()),
                            class: scope.class,
                        })
                    }
                    _ => Descend::Into(scope.clone()),
                }
            }
            "variable_declarator" => {
                let name = node
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                    .map(|n| node_text(&n, self.source));
                let value = node.child_by_field_name("value").filter(|v| {
                    matches!(v.kind(), "arrow_function" | "function_expression" | "function")
                });
                match (name, value) {
                    (Some(name), Some(value)) if !name.is_empty() && is_top_level(&node) => {
                        self.declare_callable(name, &value);
                        Descend::Into(Scope {
                            function: Some(name.to_string()),
                            class: scope.class,
                        })
                    }
                    _ => Descend::Into(scope.clone()),
                }
            }
            "class_declaration" | "abstract_class_declaration" => match self.class_declaration(node) {
                Some(idx) => Descend::Into(Scope {
                    function: scope.function.clone(),
                    class: Some(idx),
                }),
                None => Descend::Into(scope.clone()),
            },
            "interface_declaration" => {
                if let Some(class) = typescript::interface_fact(&node, self.source) {
                    self.facts.classes.push(class);
                }
                Descend::Skip
            }
            "type_alias_declaration" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.facts.type_aliases.push(name.to_string());
                }
                Descend::Skip
            }
            "enum_declaration" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.facts.enums.push(name.to_string());
                }
                Descend::Skip
            }
            "call_expression" => {
                self.call_expression(node, scope);
                Descend::Into(scope.clone())
            }
            "member_expression" => {
                if let Some(class_idx) = scope.class {
                    if let Some(target) = this_member_target(&node, self.source) {
                        self.facts.classes[class_idx].add_candidate(target);
                    }
                }
                Descend::Into(scope.clone())
            }
            "import_statement" => {
                if let Some(source) = field_text(&node, "source", self.source) {
                    self.module_reference(unquote(source));
                }
                Descend::Skip
            }
            "export_statement" => {
                // `export { x } from './y'` re-exports a module.
                if let Some(source) = field_text(&node, "source", self.source) {
                    self.module_reference(unquote(source));
                }
                Descend::Into(scope.clone())
            }
            "expression_statement" => {
                self.module_exports(&node);
                Descend::Into(scope.clone())
            }
            _ => Descend::Into(scope.clone()),
        }
    }
}

impl<'f, 's> ScriptVisitor<'f, 's> {
    fn new(source: &'s [u8], facts: &'f mut FileFacts, max_depth: usize) -> Self {
        Self {
            source,
            facts,
            max_depth,
            raw_calls: Vec::new(),
        }
    }

    /// A capitalized callable whose body renders markup is a component.
    fn declare_callable(&mut self, name: &str, body: &Node<'_>) {
        let capitalized = name.chars().next().is_some_and(|c| c.is_uppercase());
        if capitalized && any_descendant(*body, self.max_depth, |n| is_markup_node(n.kind())) {
            self.facts.add_component(name);
        } else {
            self.facts.add_function(name);
        }
    }

    fn class_declaration(&mut self, node: Node<'_>) -> Option<usize> {
        let name = field_text(&node, "name", self.source)?;
        let annotations = typescript::decorator_names(&node, self.source);
        let role = ClassRole::detect(name, &annotations);
        let mut class = ClassFact::new(name).with_role(role);
        class.annotations = annotations;

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                if !matches!(
                    member.kind(),
                    "method_definition" | "method_signature" | "abstract_method_signature"
                ) {
                    continue;
                }
                let Some(method) = field_text(&member, "name", self.source) else {
                    continue;
                };
                if method == "constructor" {
                    if let Some(params) = member.child_by_field_name("parameters") {
                        for candidate in self.constructor_params(&params) {
                            class.add_candidate(candidate);
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

    /// Parameter names, plus declared type names for typed parameters. Rest
    /// parameters and `this` are skipped.
    fn constructor_params(&self, params: &Node<'_>) -> Vec<String> {
        let mut candidates = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => candidates.push(node_text(&param, self.source).to_string()),
                "assignment_pattern" => {
                    if let Some(left) = param
                        .child_by_field_name("left")
                        .filter(|l| l.kind() == "identifier")
                    {
                        candidates.push(node_text(&left, self.source).to_string());
                    }
                }
                "required_parameter" | "optional_parameter" => {
                    let Some(pattern) = param.child_by_field_name("pattern") else {
                        continue;
                    };
                    if pattern.kind() != "identifier" {
                        continue;
                    }
                    candidates.push(node_text(&pattern, self.source).to_string());
                    if let Some(ty) = param
                        .child_by_field_name("type")
                        .and_then(|t| typescript::annotated_type_name(&t, self.source))
                    {
                        if !is_builtin_type(&ty, self.facts.language) {
                            candidates.push(ty);
                        }
                    }
                }
                _ => {}
            }
        }
        candidates
    }

    fn call_expression(&mut self, node: Node<'_>, scope: &Scope) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };

        let called_name = match function.kind() {
            "identifier" => Some(node_text(&function, self.source)),
            "member_expression" => field_text(&function, "property", self.source),
            _ => None,
        };

        let is_module_load = function.kind() == "import"
            || (function.kind() == "identifier" && called_name == Some("require"));
        if is_module_load {
            if let Some(path) = first_string_argument(&node, self.source) {
                self.module_reference(path);
            }
            return;
        }

        let Some(called_name) = called_name.filter(|n| !n.is_empty()) else {
            return;
        };

        if is_hook_name(called_name) {
            self.facts.add_hook(called_name);
        }
        if let Some(caller) = &scope.function {
            self.raw_calls
                .push(CallFact::new(caller.as_str(), called_name));
        }
    }

    /// Static and dynamic module references are recorded alike; relative ones
    /// also become requires candidates.
    fn module_reference(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        self.facts.add_import(path);
        if is_relative_reference(path) {
            self.facts.add_require(path);
        }
    }

    fn module_exports(&mut self, statement: &Node<'_>) {
        let Some(assignment) = statement
            .named_child(0)
            .filter(|n| n.kind() == "assignment_expression")
        else {
            return;
        };
        let Some(left) = field_text(&assignment, "left", self.source) else {
            return;
        };
        if !left.starts_with("module.exports") {
            return;
        }
        if let Some(right) = field_text(&assignment, "right", self.source) {
            self.facts
                .exports
                .push(right.chars().take(MAX_EXPORT_CHARS).collect());
        }
    }

    fn finish(self) {
        let ScriptVisitor { facts, raw_calls, .. } = self;
        for call in raw_calls {
            if call.caller_name == call.callee_name {
                continue;
            }
            if facts.callables().any(|name| name == call.callee_name) {
                facts.add_call(call);
            }
        }
        facts.framework_patterns.react = react_patterns(&facts.hooks);
    }
}

pub(crate) fn extract(root: Node<'_>, source: &[u8], max_depth: usize, facts: &mut FileFacts) -> WalkStats {
    let mut visitor = ScriptVisitor::new(source, facts, max_depth);
    let stats = walk_tree(root, Scope::default(), max_depth, &mut visitor);
    visitor.finish();
    stats
}

pub(crate) fn is_markup_node(kind: &str) -> bool {
    kind.starts_with("jsx_")
}

/// `useX` where `X` is uppercase.
pub(crate) fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_uppercase())
}

/// Maps hook usage to pattern tags. State management has fixed precedence:
/// reducer over context over local state. Side effects and custom hooks are
/// independent of it.
pub fn react_patterns(hooks: &[String]) -> Vec<ReactPattern> {
    let uses = |hook: &str| hooks.iter().any(|h| h == hook);
    let mut patterns = Vec::new();

    if uses("useReducer") {
        patterns.push(ReactPattern::StateContainer);
    } else if uses("useContext") {
        patterns.push(ReactPattern::SharedContext);
    } else if uses("useState") {
        patterns.push(ReactPattern::LocalState);
    }

    if SIDE_EFFECT_HOOKS.iter().any(|h| uses(h)) {
        patterns.push(ReactPattern::SideEffects);
    }
    if hooks.iter().any(|h| !BUILTIN_HOOKS.contains(h.as_str())) {
        patterns.push(ReactPattern::CustomHooks);
    }
    patterns
}

/// Declared directly in the program, possibly wrapped in an `export` or a
/// `const`/`let`/`var` statement. Nested helpers belong to their enclosing
/// callable.
fn is_top_level(node: &Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "program" => return true,
            "export_statement" | "lexical_declaration" | "variable_declaration" => {
                current = parent.parent();
            }
            _ => return false,
        }
    }
    false
}

/// For `this.x.y`, returns `x`.
fn this_member_target<'s>(node: &Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    let object = node.child_by_field_name("object")?;
    if object.kind() != "member_expression" {
        return None;
    }
    let receiver = object.child_by_field_name("object")?;
    if receiver.kind() != "this" {
        return None;
    }
    field_text(&object, "property", source)
}

fn first_string_argument<'s>(call: &Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    let args = call.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    match first.kind() {
        "string" => Some(unquote(node_text(&first, source))),
        "template_string" if first.named_child_count() == 0 => {
            Some(unquote(node_text(&first, source)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::parser::Parser;
    use crate::indexer::tree_walk::DEFAULT_MAX_DEPTH;
    use crate::languages::Language;
    use std::path::Path;

    fn extract_source(source: &str) -> FileFacts {
        let parsed = Parser::new().parse_source(source, Language::JavaScript).unwrap();
        let mut facts = FileFacts::new(Language::JavaScript, Path::new("App.jsx"));
        extract(parsed.root_node(), parsed.source_bytes(), DEFAULT_MAX_DEPTH, &mut facts);
        facts
    }

    #[test]
    fn test_component_requires_capital_and_markup() {
        let facts = extract_source(
            r#"
function UserProfile({ user }) {
    return <div className="profile">{user.name}</div>;
}

function formatName(user) {
    return user.first + " " + user.last;
}

function Config() {
    return { debug: true };
}

const Avatar = () => <img src="a.png" />;
"#,
        );
        assert_eq!(facts.components, vec!["UserProfile", "Avatar"]);
        assert_eq!(facts.functions, vec!["formatName", "Config"]);
    }

    #[test]
    fn test_hooks_and_patterns() {
        let facts = extract_source(
            r#"
function Counter() {
    const [count, setCount] = useState(0);
    const theme = React.useContext(ThemeContext);
    useEffect(() => {}, []);
    const user = useCurrentUser();
    return <span>{count}</span>;
}
"#,
        );
        assert_eq!(
            facts.hooks,
            vec!["useState", "useContext", "useEffect", "useCurrentUser"]
        );
        assert_eq!(
            facts.framework_patterns.react,
            vec![
                ReactPattern::SharedContext,
                ReactPattern::SideEffects,
                ReactPattern::CustomHooks
            ]
        );
    }

    #[test]
    fn test_react_patterns_precedence() {
        let hooks = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            react_patterns(&hooks(&["useState", "useReducer", "useContext"])),
            vec![ReactPattern::StateContainer]
        );
        assert_eq!(
            react_patterns(&hooks(&["useState"])),
            vec![ReactPattern::LocalState]
        );
        assert!(react_patterns(&[]).is_empty());
        assert_eq!(
            react_patterns(&hooks(&["useFetch"])),
            vec![ReactPattern::CustomHooks]
        );
    }

    #[test]
    fn test_is_hook_name() {
        assert!(is_hook_name("useState"));
        assert!(is_hook_name("useAuth"));
        assert!(!is_hook_name("user"));
        assert!(!is_hook_name("use"));
        assert!(!is_hook_name("useless"));
    }

    #[test]
    fn test_static_and_dynamic_module_references() {
        let facts = extract_source(
            r#"
import React from 'react';
import { api } from './api';
const db = require('../db/connection');
const express = require("express");
const Lazy = import('./pages/Lazy');
export { helper } from './helpers';
"#,
        );
        assert_eq!(
            facts.imports,
            vec!["react", "./api", "../db/connection", "express", "./pages/Lazy", "./helpers"]
        );
        assert_eq!(
            facts.requires,
            vec!["./api", "../db/connection", "./pages/Lazy", "./helpers"]
        );
    }

    #[test]
    fn test_calls_between_known_callables() {
        let facts = extract_source(
            r#"
function validate(input) { return input.length > 0; }
const save = (input) => {
    if (validate(input)) { store.persist(input); }
    console.log("saved");
};
function handler(req) {
    save(req.body);
    handler(req);
}
"#,
        );
        assert_eq!(
            facts.calls,
            vec![CallFact::new("save", "validate"), CallFact::new("handler", "save")]
        );
    }

    #[test]
    fn test_class_methods_and_constructor_params() {
        let facts = extract_source(
            r#"
class OrderService {
    constructor(orderRepository, mailer = null, ...rest) {
        this.orderRepository = orderRepository;
    }
    create(order) {
        this.paymentGateway.charge(order);
        return this.orderRepository.save(order);
    }
    cancel(id) {}
}
"#,
        );
        let class = &facts.classes[0];
        assert_eq!(class.name, "OrderService");
        assert_eq!(class.role, ClassRole::Service);
        assert_eq!(class.methods, vec!["create", "cancel"]);
        assert_eq!(
            class.dependency_candidates,
            vec!["orderRepository", "mailer", "paymentGateway"]
        );
        assert!(facts.functions.is_empty());
    }

    #[test]
    fn test_nested_callables_are_not_declared() {
        let facts = extract_source(
            r#"
class Widget {
    render() {
        const helper = () => 1;
        return helper();
    }
}
function main() {
    function inner() {}
    const local = function () {};
    inner();
    local();
}
export const start = () => main();
export function Shell() { return <main />; }
"#,
        );
        assert_eq!(facts.functions, vec!["main", "start"]);
        assert_eq!(facts.components, vec!["Shell"]);
        assert_eq!(facts.calls, vec![CallFact::new("start", "main")]);
    }

    #[test]
    fn test_module_exports() {
        let facts = extract_source("module.exports = { createUser, deleteUser };");
        assert_eq!(facts.exports, vec!["{ createUser, deleteUser }"]);
    }
}
