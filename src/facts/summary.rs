//! Compact per-language view of a project's facts, handed to downstream
//! summarization. Its canonical JSON form is also the result-cache key.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::models::{CallFact, ClassRole, FileFacts, SpringPatterns};
use crate::config::SummaryLimits;
use crate::graph::{EdgeKind, Graph, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub name: String,
    pub role: ClassRole,
    pub methods: Vec<String>,
    pub annotations: Vec<String>,
    /// Labels of the classes this one resolved a dependency on.
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub filename: String,
    pub functions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassSummary>,
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "SpringPatterns::is_empty")]
    pub spring_patterns: SpringPatterns,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallFact>,
}

impl FileSummary {
    /// Files with nothing architectural in them are left out of the summary.
    fn is_significant(&self) -> bool {
        !self.functions.is_empty()
            || !self.classes.is_empty()
            || !self.components.is_empty()
            || !self.spring_patterns.is_empty()
    }
}

/// `{language: [file_summary]}`. Keys are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSummary {
    pub languages: BTreeMap<String, Vec<FileSummary>>,
}

impl FactSummary {
    /// Builds the summary of `files`, taking class dependencies from the
    /// depends-on edges of a resolved `graph`.
    pub fn build<'a>(
        files: impl IntoIterator<Item = &'a FileFacts>,
        graph: &Graph,
        limits: &SummaryLimits,
    ) -> Self {
        let dependencies = DependencyLabels::new(graph);
        let mut languages: BTreeMap<String, Vec<FileSummary>> = BTreeMap::new();

        for facts in files {
            let summary = summarize_file(facts, &dependencies, limits);
            if summary.is_significant() {
                languages
                    .entry(facts.language.name().to_string())
                    .or_default()
                    .push(summary);
            }
        }

        Self { languages }
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.languages.values().map(Vec::len).sum()
    }

    pub fn get(&self, language: &str) -> Option<&[FileSummary]> {
        self.languages.get(language).map(Vec::as_slice)
    }
}

fn summarize_file(facts: &FileFacts, dependencies: &DependencyLabels<'_>, limits: &SummaryLimits) -> FileSummary {
    let classes = facts
        .classes
        .iter()
        .map(|class| ClassSummary {
            name: class.name.clone(),
            role: class.role,
            methods: truncated(&class.methods, limits.methods),
            annotations: truncated(&class.annotations, limits.annotations),
            dependencies: dependencies
                .of(&facts.filepath, &class.name)
                .iter()
                .take(limits.dependencies)
                .map(|label| label.to_string())
                .collect(),
        })
        .collect();

    FileSummary {
        filename: facts.filename.clone(),
        functions: truncated(&facts.functions, limits.functions),
        classes,
        requires: truncated(&facts.requires, limits.requires),
        spring_patterns: facts.framework_patterns.spring.clone(),
        components: truncated(&facts.components, limits.components),
        calls: facts.calls.iter().take(limits.calls).cloned().collect(),
    }
}

fn truncated(items: &[String], limit: usize) -> Vec<String> {
    items.iter().take(limit).cloned().collect()
}

/// Resolved dependency labels per class node, in edge order.
struct DependencyLabels<'g> {
    class_ids: HashMap<(&'g str, &'g str), NodeId>,
    targets: HashMap<NodeId, Vec<&'g str>>,
}

impl<'g> DependencyLabels<'g> {
    fn new(graph: &'g Graph) -> Self {
        let class_ids = graph
            .nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Class)
            .filter_map(|node| {
                node.file
                    .as_deref()
                    .map(|file| ((file, node.label.as_str()), node.id))
            })
            .collect();

        let mut targets: HashMap<NodeId, Vec<&'g str>> = HashMap::new();
        for edge in graph.edges.iter().filter(|e| e.kind == EdgeKind::DependsOn) {
            if let Some(target) = graph.node(edge.to) {
                targets.entry(edge.from).or_default().push(target.label.as_str());
            }
        }

        Self { class_ids, targets }
    }

    fn of(&self, filepath: &str, class: &str) -> &[&'g str] {
        self.class_ids
            .get(&(filepath, class))
            .and_then(|id| self.targets.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::models::ClassFact;
    use crate::graph::DependencyResolver;
    use crate::languages::Language;
    use std::path::Path;

    fn service_file() -> FileFacts {
        let mut facts = FileFacts::new(Language::Python, Path::new("app/services.py"));
        let mut user = ClassFact::new("UserService").with_role(ClassRole::Service);
        user.add_candidate("email_service");
        for i in 0..12 {
            user.add_method(format!("m{}", i));
        }
        facts.classes.push(user);
        facts.classes.push(ClassFact::new("EmailService").with_role(ClassRole::Service));
        facts.add_function("main");
        facts.add_require("./models");
        facts
    }

    fn empty_file() -> FileFacts {
        let mut facts = FileFacts::new(Language::JavaScript, Path::new("web/constants.js"));
        facts.add_import("react");
        facts
    }

    #[test]
    fn test_build_includes_resolved_dependencies() {
        let files = vec![service_file()];
        let resolution = DependencyResolver::new().resolve(&files);
        let summary = FactSummary::build(&files, &resolution.graph, &SummaryLimits::default());

        let python = summary.get("python").unwrap();
        assert_eq!(python.len(), 1);
        assert_eq!(python[0].filename, "services.py");
        assert_eq!(python[0].functions, vec!["main"]);
        assert_eq!(python[0].requires, vec!["./models"]);

        let user = &python[0].classes[0];
        assert_eq!(user.dependencies, vec!["EmailService"]);
        assert_eq!(user.methods.len(), 8);
        assert!(python[0].classes[1].dependencies.is_empty());
    }

    #[test]
    fn test_build_omits_insignificant_files_and_languages() {
        let files = vec![service_file(), empty_file()];
        let resolution = DependencyResolver::new().resolve(&files);
        let summary = FactSummary::build(&files, &resolution.graph, &SummaryLimits::default());

        assert!(summary.get("javascript").is_none());
        assert_eq!(summary.file_count(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let files = vec![service_file()];
        let resolution = DependencyResolver::new().resolve(&files);
        let summary = FactSummary::build(&files, &resolution.graph, &SummaryLimits::default());
        let value = serde_json::to_value(&summary).unwrap();

        let file = &value["python"][0];
        assert_eq!(file["filename"], "services.py");
        assert_eq!(file["classes"][0]["role"], "service");
        assert!(file.get("components").is_none());
        assert!(file.get("spring_patterns").is_none());
    }

    #[test]
    fn test_empty_summary() {
        let files: Vec<FileFacts> = Vec::new();
        let summary = FactSummary::build(&files, &Graph::default(), &SummaryLimits::default());
        assert!(summary.is_empty());
        assert_eq!(serde_json::to_string(&summary).unwrap(), "{}");
    }
}
