use tree_sitter::Node;

use super::{is_builtin_type, Language};
use crate::facts::{ClassFact, ClassRole, FileFacts};
use crate::indexer::tree_walk::{child_of_kind, field_text, node_text, walk_tree, Descend, TreeVisitor, WalkStats};

/// Annotations that mark a field or setter as container-injected.
const INJECTION_ANNOTATIONS: &[&str] = &["Autowired", "Inject", "Resource"];

/// Spring Data base interfaces; extending one makes an interface a repository.
const PERSISTENCE_BASES: &[&str] = &[
    "Repository",
    "CrudRepository",
    "ListCrudRepository",
    "PagingAndSortingRepository",
    "JpaRepository",
    "MongoRepository",
    "ReactiveCrudRepository",
    "R2dbcRepository",
];

struct JavaVisitor<'f, 's> {
    source: &'s [u8],
    facts: &'f mut FileFacts,
}

impl<'t, 'f, 's> TreeVisitor<'t> for JavaVisitor<'f, 's> {
    type Scope = ();

    fn enter(&mut self, node: Node<'t>, _scope: &()) -> Descend<()> {
        match node.kind() {
            "class_declaration" | "record_declaration" => self.class_declaration(node),
            "interface_declaration" => self.interface_declaration(node),
            "enum_declaration" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.facts.enums.push(name.to_string());
                }
            }
            "import_declaration" => {
                self.import_declaration(node);
                return Descend::Skip;
            }
            _ => {}
        }
        Descend::Into(())
    }
}

impl<'f, 's> JavaVisitor<'f, 's> {
    fn class_declaration(&mut self, node: Node<'_>) {
        let Some(name) = field_text(&node, "name", self.source) else {
            return;
        };
        let modifiers = child_of_kind(&node, "modifiers");
        let annotations = modifiers
            .map(|m| annotation_names(&m, self.source))
            .unwrap_or_default();
        let role = ClassRole::detect(name, &annotations);

        let lombok_required = annotations.iter().any(|a| a == "RequiredArgsConstructor");
        let lombok_all = annotations.iter().any(|a| a == "AllArgsConstructor");

        let mut class = ClassFact::new(name).with_role(role);
        class.annotations = annotations;

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                match member.kind() {
                    "method_declaration" => {
                        if let Some(method) = field_text(&member, "name", self.source) {
                            class.add_method(method);
                        }
                    }
                    "constructor_declaration" => {
                        if let Some(params) = member.child_by_field_name("parameters") {
                            for ty in self.parameter_types(&params) {
                                class.add_candidate(ty);
                            }
                        }
                    }
                    "field_declaration" => {
                        if self.is_injected_field(&member, lombok_required, lombok_all) {
                            if let Some(ty) = member
                                .child_by_field_name("type")
                                .and_then(|t| self.dependency_type(&t))
                            {
                                class.add_candidate(ty);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        self.facts.framework_patterns.spring.record(&class.name, role);
        self.facts.classes.push(class);
    }

    fn interface_declaration(&mut self, node: Node<'_>) {
        let Some(name) = field_text(&node, "name", self.source) else {
            return;
        };
        let annotations = child_of_kind(&node, "modifiers")
            .map(|m| annotation_names(&m, self.source))
            .unwrap_or_default();

        let mut class = ClassFact::new(name);
        let mut extends_persistence = false;

        if let Some(type_list) =
            child_of_kind(&node, "extends_interfaces").and_then(|e| child_of_kind(&e, "type_list"))
        {
            let mut cursor = type_list.walk();
            for parent in type_list.named_children(&mut cursor) {
                if !PERSISTENCE_BASES.contains(&base_type_name(&parent, self.source)) {
                    continue;
                }
                extends_persistence = true;
                // The managed entity is the first type argument: JpaRepository<User, Long>.
                if let Some(args) = child_of_kind(&parent, "type_arguments") {
                    let mut args_cursor = args.walk();
                    for arg in args.named_children(&mut args_cursor) {
                        if let Some(ty) = self.dependency_type(&arg) {
                            class.add_candidate(ty);
                        }
                    }
                }
            }
        }

        class.role = annotations
            .iter()
            .filter_map(|a| ClassRole::from_annotation(a))
            .last()
            .unwrap_or(if extends_persistence {
                ClassRole::Repository
            } else {
                ClassRole::Interface
            });
        class.annotations = annotations;

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                if member.kind() == "method_declaration" {
                    if let Some(method) = field_text(&member, "name", self.source) {
                        class.add_method(method);
                    }
                }
            }
        }

        self.facts.framework_patterns.spring.record(&class.name, class.role);
        self.facts.classes.push(class);
    }

    fn import_declaration(&mut self, node: Node<'_>) {
        let Some(path) = child_of_kind(&node, "scoped_identifier")
            .or_else(|| child_of_kind(&node, "identifier"))
        else {
            return;
        };
        let mut import = node_text(&path, self.source).to_string();
        if child_of_kind(&node, "asterisk").is_some() {
            import.push_str(".*");
        }
        self.facts.add_import(import);
    }

    /// Declared types of formal parameters, skipping varargs and the receiver.
    fn parameter_types(&self, params: &Node<'_>) -> Vec<String> {
        let mut types = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if param.kind() != "formal_parameter" {
                continue;
            }
            if let Some(ty) = param
                .child_by_field_name("type")
                .and_then(|t| self.dependency_type(&t))
            {
                types.push(ty);
            }
        }
        types
    }

    fn is_injected_field(&self, field: &Node<'_>, lombok_required: bool, lombok_all: bool) -> bool {
        let Some(modifiers) = child_of_kind(field, "modifiers") else {
            return false;
        };
        let annotations = annotation_names(&modifiers, self.source);
        if annotations
            .iter()
            .any(|a| INJECTION_ANNOTATIONS.contains(&a.as_str()))
        {
            return true;
        }

        let text = node_text(&modifiers, self.source);
        let has_keyword = |kw: &str| text.split_whitespace().any(|token| token == kw);
        if has_keyword("static") {
            return false;
        }
        (lombok_required && has_keyword("final")) || lombok_all
    }

    /// Class name a type refers to, with generic wrappers unwrapped.
    fn dependency_type(&self, ty: &Node<'_>) -> Option<String> {
        let name = unwrap_type(ty, self.source)?;
        if is_builtin_type(&name, Language::Java) {
            None
        } else {
            Some(name)
        }
    }
}

pub(crate) fn extract(root: Node<'_>, source: &[u8], max_depth: usize, facts: &mut FileFacts) -> WalkStats {
    let mut visitor = JavaVisitor { source, facts };
    walk_tree(root, (), max_depth, &mut visitor)
}

/// `@Service`, `@RequestMapping("/x")` and `@org.springframework.Service` all yield the simple name.
fn annotation_names(modifiers: &Node<'_>, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = modifiers.walk();
    for child in modifiers.named_children(&mut cursor) {
        if !matches!(child.kind(), "marker_annotation" | "annotation") {
            continue;
        }
        if let Some(name) = field_text(&child, "name", source) {
            let simple = name.trim_start_matches('@').rsplit('.').next().unwrap_or(name);
            names.push(simple.to_string());
        }
    }
    names
}

fn base_type_name<'s>(ty: &Node<'_>, source: &'s [u8]) -> &'s str {
    match ty.kind() {
        "generic_type" => {
            let mut cursor = ty.walk();
            let base = ty
                .named_children(&mut cursor)
                .find(|c| matches!(c.kind(), "type_identifier" | "scoped_type_identifier"));
            base.map(|b| base_type_name(&b, source)).unwrap_or("")
        }
        "scoped_type_identifier" => {
            let text = node_text(ty, source);
            text.rsplit('.').next().unwrap_or(text)
        }
        _ => node_text(ty, source),
    }
}

/// `List<Optional<UserRepository>>` unwraps to `UserRepository`; a generic whose
/// arguments are all built-in falls back to its own base name.
fn unwrap_type(ty: &Node<'_>, source: &[u8]) -> Option<String> {
    match ty.kind() {
        "type_identifier" | "scoped_type_identifier" => {
            let name = base_type_name(ty, source);
            (!name.is_empty()).then(|| name.to_string())
        }
        "generic_type" => {
            if let Some(args) = child_of_kind(ty, "type_arguments") {
                let mut cursor = args.walk();
                let inner: Vec<String> = args
                    .named_children(&mut cursor)
                    .filter_map(|arg| unwrap_type(&arg, source))
                    .collect();
                if let Some(found) = inner
                    .iter()
                    .find(|name| !is_builtin_type(name, Language::Java))
                {
                    return Some(found.clone());
                }
            }
            let base = base_type_name(ty, source);
            (!base.is_empty()).then(|| base.to_string())
        }
        "array_type" => ty
            .child_by_field_name("element")
            .and_then(|element| unwrap_type(&element, source)),
        "annotated_type" => {
            let mut cursor = ty.walk();
            let last = ty.named_children(&mut cursor).last();
            last.and_then(|inner| unwrap_type(&inner, source))
        }
        _ => None,
    }
}
