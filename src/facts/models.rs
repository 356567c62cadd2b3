use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::languages::Language;

/// Coarse architectural classification of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassRole {
    #[default]
    Class,
    Controller,
    Service,
    Repository,
    Entity,
    Interface,
}

impl ClassRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassRole::Class => "class",
            ClassRole::Controller => "controller",
            ClassRole::Service => "service",
            ClassRole::Repository => "repository",
            ClassRole::Entity => "entity",
            ClassRole::Interface => "interface",
        }
    }

    /// Role implied by a conventional class-name suffix.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.ends_with("Controller") {
            Some(ClassRole::Controller)
        } else if name.ends_with("Service") {
            Some(ClassRole::Service)
        } else if name.ends_with("Repository") || name.ends_with("Repo") {
            Some(ClassRole::Repository)
        } else {
            None
        }
    }

    /// Role implied by an annotation or decorator name (`@Service`, `@Injectable()`).
    pub fn from_annotation(annotation: &str) -> Option<Self> {
        match annotation {
            "RestController" | "Controller" => Some(ClassRole::Controller),
            "Service" | "Injectable" => Some(ClassRole::Service),
            "Repository" | "EntityRepository" => Some(ClassRole::Repository),
            "Entity" | "Document" | "Schema" => Some(ClassRole::Entity),
            _ => None,
        }
    }

    /// Annotations win over names; among annotations the last role-bearing one wins.
    pub fn detect(name: &str, annotations: &[String]) -> Self {
        annotations
            .iter()
            .filter_map(|a| Self::from_annotation(a))
            .last()
            .or_else(|| Self::from_name(name))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassFact {
    pub name: String,
    pub role: ClassRole,
    pub methods: Vec<String>,
    pub annotations: Vec<String>,
    /// Raw name tokens that may refer to other classes. Not yet graph edges.
    pub dependency_candidates: Vec<String>,
}

impl ClassFact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: ClassRole) -> Self {
        self.role = role;
        self
    }

    pub fn add_method(&mut self, method: impl Into<String>) {
        push_unique(&mut self.methods, method.into());
    }

    pub fn add_candidate(&mut self, candidate: impl Into<String>) {
        let candidate = candidate.into();
        if !candidate.is_empty() {
            push_unique(&mut self.dependency_candidates, candidate);
        }
    }
}

/// An intra-file call between two top-level callables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallFact {
    pub caller_name: String,
    pub callee_name: String,
}

impl CallFact {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>) -> Self {
        Self {
            caller_name: caller.into(),
            callee_name: callee.into(),
        }
    }
}

/// Coarse state-management tags derived from hook usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactPattern {
    #[serde(rename = "reducer_pattern")]
    StateContainer,
    #[serde(rename = "context_api")]
    SharedContext,
    #[serde(rename = "local_state")]
    LocalState,
    #[serde(rename = "side_effects")]
    SideEffects,
    #[serde(rename = "custom_hooks")]
    CustomHooks,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpringPatterns {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controllers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
}

impl SpringPatterns {
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
            && self.services.is_empty()
            && self.repositories.is_empty()
            && self.entities.is_empty()
    }

    pub fn record(&mut self, class_name: &str, role: ClassRole) {
        let bucket = match role {
            ClassRole::Controller => &mut self.controllers,
            ClassRole::Service => &mut self.services,
            ClassRole::Repository => &mut self.repositories,
            ClassRole::Entity => &mut self.entities,
            ClassRole::Class | ClassRole::Interface => return,
        };
        push_unique(bucket, class_name.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameworkPatterns {
    #[serde(default, skip_serializing_if = "SpringPatterns::is_empty")]
    pub spring: SpringPatterns,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub react: Vec<ReactPattern>,
}

impl FrameworkPatterns {
    pub fn is_empty(&self) -> bool {
        self.spring.is_empty() && self.react.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormTarget {
    pub action: String,
    pub method: String,
}

/// Structural facts of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarkupFacts {
    pub structure: Vec<String>,
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,
    pub forms: Vec<FormTarget>,
    pub links: Vec<String>,
    pub titles: Vec<String>,
    pub class_names: Vec<String>,
    pub ids: Vec<String>,
    pub all_tags: Vec<String>,
}

/// Structural facts of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleFacts {
    pub class_names: Vec<String>,
    pub ids: Vec<String>,
    pub selectors: Vec<String>,
    pub properties: Vec<String>,
    pub media_queries: Vec<String>,
    pub animations: Vec<String>,
}

/// Normalized facts extracted from one source file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    pub language: Language,
    pub filepath: String,
    pub filename: String,
    pub classes: Vec<ClassFact>,
    pub functions: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub hooks: Vec<String>,
    pub imports: Vec<String>,
    pub requires: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    pub calls: Vec<CallFact>,
    #[serde(default)]
    pub type_aliases: Vec<String>,
    #[serde(default)]
    pub enums: Vec<String>,
    #[serde(default)]
    pub framework_patterns: FrameworkPatterns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<MarkupFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleFacts>,
}

impl FileFacts {
    pub fn new(language: Language, path: &Path) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            language,
            filepath: path.to_string_lossy().to_string(),
            filename,
            classes: Vec::new(),
            functions: Vec::new(),
            components: Vec::new(),
            hooks: Vec::new(),
            imports: Vec::new(),
            requires: Vec::new(),
            exports: Vec::new(),
            calls: Vec::new(),
            type_aliases: Vec::new(),
            enums: Vec::new(),
            framework_patterns: FrameworkPatterns::default(),
            markup: None,
            style: None,
        }
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        file_stem(&self.filename)
    }

    pub fn add_function(&mut self, name: impl Into<String>) {
        push_unique(&mut self.functions, name.into());
    }

    pub fn add_component(&mut self, name: impl Into<String>) {
        push_unique(&mut self.components, name.into());
    }

    pub fn add_hook(&mut self, name: impl Into<String>) {
        push_unique(&mut self.hooks, name.into());
    }

    pub fn add_import(&mut self, path: impl Into<String>) {
        self.imports.push(path.into());
    }

    pub fn add_require(&mut self, path: impl Into<String>) {
        push_unique(&mut self.requires, path.into());
    }

    pub fn add_call(&mut self, call: CallFact) {
        if !self.calls.contains(&call) {
            self.calls.push(call);
        }
    }

    /// Names of callables that can take part in call facts.
    pub fn callables(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .chain(self.components.iter())
            .map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.functions.is_empty()
            && self.components.is_empty()
            && self.imports.is_empty()
            && self.requires.is_empty()
    }
}

/// Last path segment of `reference` without its final extension.
pub fn file_stem(reference: &str) -> &str {
    let segment = reference
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(reference);
    match segment.rfind('.') {
        Some(0) | None => segment,
        Some(idx) => &segment[..idx],
    }
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_annotation() {
        assert_eq!(ClassRole::from_annotation("RestController"), Some(ClassRole::Controller));
        assert_eq!(ClassRole::from_annotation("Service"), Some(ClassRole::Service));
        assert_eq!(ClassRole::from_annotation("Repository"), Some(ClassRole::Repository));
        assert_eq!(ClassRole::from_annotation("Entity"), Some(ClassRole::Entity));
        assert_eq!(ClassRole::from_annotation("Autowired"), None);
    }

    #[test]
    fn test_role_detect_prefers_annotations() {
        let annotations = vec!["Entity".to_string()];
        assert_eq!(ClassRole::detect("UserService", &annotations), ClassRole::Entity);
    }

    #[test]
    fn test_role_detect_falls_back_to_name() {
        assert_eq!(ClassRole::detect("UserService", &[]), ClassRole::Service);
        assert_eq!(ClassRole::detect("OrderController", &[]), ClassRole::Controller);
        assert_eq!(ClassRole::detect("UserRepo", &[]), ClassRole::Repository);
        assert_eq!(ClassRole::detect("Database", &[]), ClassRole::Class);
    }

    #[test]
    fn test_role_detect_last_annotation_wins() {
        let annotations = vec!["Service".to_string(), "Repository".to_string()];
        assert_eq!(ClassRole::detect("Store", &annotations), ClassRole::Repository);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ClassRole::Repository).unwrap(), "\"repository\"");
    }

    #[test]
    fn test_class_fact_dedups() {
        let mut class = ClassFact::new("UserService");
        class.add_method("create");
        class.add_method("create");
        class.add_candidate("db");
        class.add_candidate("db");
        class.add_candidate("");
        assert_eq!(class.methods, vec!["create"]);
        assert_eq!(class.dependency_candidates, vec!["db"]);
    }

    #[test]
    fn test_file_facts_new() {
        let facts = FileFacts::new(Language::Python, Path::new("app/services/user_service.py"));
        assert_eq!(facts.filename, "user_service.py");
        assert_eq!(facts.stem(), "user_service");
        assert!(facts.is_empty());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("./utils"), "utils");
        assert_eq!(file_stem("../models/User.js"), "User");
        assert_eq!(file_stem("app.controller.ts"), "app.controller");
        assert_eq!(file_stem(".env"), ".env");
        assert_eq!(file_stem("./"), "");
    }

    #[test]
    fn test_spring_patterns_record() {
        let mut spring = SpringPatterns::default();
        spring.record("UserController", ClassRole::Controller);
        spring.record("User", ClassRole::Class);
        assert_eq!(spring.controllers, vec!["UserController"]);
        assert!(!spring.is_empty());
    }

    #[test]
    fn test_react_pattern_tags() {
        let json = serde_json::to_string(&vec![ReactPattern::StateContainer, ReactPattern::CustomHooks])
            .unwrap();
        assert_eq!(json, r#"["reducer_pattern","custom_hooks"]"#);
    }
}
