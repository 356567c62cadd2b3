//! Multi-pass resolution of per-file facts into one project graph.
//!
//! Passes run strictly in sequence over all files: registration, structure,
//! dependency candidates, calls, module references. Input files are put in
//! canonical `(language, filepath)` order first, so the resulting edge set does
//! not depend on the order files were discovered in.

use serde::Serialize;

use super::assembler::GraphAssembler;
use super::matcher::MatchLadder;
use super::registry::{GlobalRegistry, RegistryBuilder};
use super::{EdgeKind, Graph, NodeId, NodeKind};
use crate::facts::FileFacts;
use crate::languages::Language;

/// A candidate that more than one class (or file) would have satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ambiguity {
    pub source: String,
    pub candidate: String,
    pub strategy: String,
    pub chosen: String,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub files: usize,
    pub classes_registered: usize,
    pub dependencies_resolved: usize,
    pub unresolved_candidates: usize,
    pub calls_resolved: usize,
    pub requires_resolved: usize,
    pub unresolved_requires: usize,
    pub ambiguities: Vec<Ambiguity>,
}

impl ResolutionReport {
    fn record_ambiguity(&mut self, ambiguity: Ambiguity) {
        tracing::debug!(
            "{}: '{}' matched {} by {}, also {:?}",
            ambiguity.source,
            ambiguity.candidate,
            ambiguity.chosen,
            ambiguity.strategy,
            ambiguity.alternatives
        );
        self.ambiguities.push(ambiguity);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub graph: Graph,
    pub report: ResolutionReport,
}

#[derive(Default)]
pub struct DependencyResolver {
    ladder: MatchLadder,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<'a>(&self, files: impl IntoIterator<Item = &'a FileFacts>) -> Resolution {
        let mut files: Vec<&FileFacts> = files.into_iter().collect();
        files.sort_by(|a, b| (a.language, &a.filepath).cmp(&(b.language, &b.filepath)));

        let mut run = Run {
            files: &files,
            assembler: GraphAssembler::new(),
            report: ResolutionReport {
                files: files.len(),
                ..Default::default()
            },
        };

        let (registry, class_ids) = run.register_classes();
        run.materialize_structure(&class_ids);
        run.resolve_candidates(&self.ladder, &registry, &class_ids);
        run.resolve_calls();
        run.resolve_module_references();

        let Run {
            assembler, report, ..
        } = run;
        let graph = assembler.finish();
        tracing::info!(
            "Resolved {} files: {} nodes, {} edges ({} dependencies, {} calls, {} requires, {} ambiguous)",
            report.files,
            graph.nodes.len(),
            graph.edges.len(),
            report.dependencies_resolved,
            report.calls_resolved,
            report.requires_resolved,
            report.ambiguities.len()
        );
        Resolution { graph, report }
    }
}

/// State of one resolution run.
struct Run<'f> {
    files: &'f [&'f FileFacts],
    assembler: GraphAssembler,
    report: ResolutionReport,
}

impl<'f> Run<'f> {
    /// Pass 1. Every class gets its node before any edge exists.
    fn register_classes(&mut self) -> (GlobalRegistry, Vec<Vec<NodeId>>) {
        let mut builder = RegistryBuilder::new();
        let mut class_ids = Vec::with_capacity(self.files.len());

        for facts in self.files {
            let ids = facts
                .classes
                .iter()
                .map(|class| {
                    let id = self.assembler.class_node(&class.name, &facts.filepath, class.role);
                    builder.register(id, &class.name, &facts.filepath, class.role);
                    id
                })
                .collect();
            class_ids.push(ids);
        }

        let registry = builder.build();
        self.report.classes_registered = registry.len();
        (registry, class_ids)
    }

    /// Pass 2. Methods hang off their class; top-level callables become nodes.
    fn materialize_structure(&mut self, class_ids: &[Vec<NodeId>]) {
        for (facts, ids) in self.files.iter().zip(class_ids) {
            for (class, &class_id) in facts.classes.iter().zip(ids) {
                for method in &class.methods {
                    let method_id = self.assembler.method_node(method, &facts.filepath, &class.name);
                    self.assembler.add_edge(class_id, method_id, EdgeKind::HasMethod);
                }
            }
            for function in &facts.functions {
                self.assembler
                    .callable_node(NodeKind::Function, function, &facts.filepath);
            }
            for component in &facts.components {
                self.assembler
                    .callable_node(NodeKind::Component, component, &facts.filepath);
            }
        }
    }

    /// Pass 3. Candidates that match no class are dropped.
    fn resolve_candidates(&mut self, ladder: &MatchLadder, registry: &GlobalRegistry, class_ids: &[Vec<NodeId>]) {
        for (facts, ids) in self.files.iter().zip(class_ids) {
            for (class, class_id) in facts.classes.iter().zip(ids) {
                let Some(source) = registry.get(*class_id) else {
                    continue;
                };
                for candidate in &class.dependency_candidates {
                    let Some(outcome) = ladder.resolve(candidate, source, registry) else {
                        self.report.unresolved_candidates += 1;
                        tracing::trace!("{}: no class matches '{}'", class.name, candidate);
                        continue;
                    };

                    if outcome.is_ambiguous() {
                        self.report.record_ambiguity(Ambiguity {
                            source: class.name.clone(),
                            candidate: candidate.clone(),
                            strategy: outcome.strategy.to_string(),
                            chosen: outcome.target.name.clone(),
                            alternatives: outcome.alternatives.iter().map(|e| e.name.clone()).collect(),
                        });
                    }

                    if self
                        .assembler
                        .add_edge(*class_id, outcome.target.id, EdgeKind::DependsOn)
                    {
                        self.report.dependencies_resolved += 1;
                    }
                }
            }
        }
    }

    /// Pass 4. Calls link callables of the same file only.
    fn resolve_calls(&mut self) {
        for facts in self.files {
            for call in &facts.calls {
                let caller = self.assembler.find_callable(&call.caller_name, &facts.filepath);
                let callee = self.assembler.find_callable(&call.callee_name, &facts.filepath);
                if let (Some(caller), Some(callee)) = (caller, callee) {
                    if self.assembler.add_edge(caller, callee, EdgeKind::Calls) {
                        self.report.calls_resolved += 1;
                    }
                }
            }
        }
    }

    /// Pass 5. A relative module reference links two file nodes when its last
    /// segment names a known file: exact stem first, then containment.
    fn resolve_module_references(&mut self) {
        let stems: Vec<String> = self.files.iter().map(|f| f.stem().to_lowercase()).collect();

        for (source_idx, facts) in self.files.iter().enumerate() {
            for reference in &facts.requires {
                let wanted = module_stem(reference).to_lowercase();
                if wanted.is_empty() {
                    continue;
                }

                let others = || (0..self.files.len()).filter(move |&idx| idx != source_idx);
                let exact: Vec<usize> = others().filter(|&idx| stems[idx] == wanted).collect();
                let (matches, strategy) = if exact.is_empty() {
                    let contained: Vec<usize> = others().filter(|&idx| stems[idx].contains(&wanted)).collect();
                    (contained, "module-containment")
                } else {
                    (exact, "module-exact")
                };

                let Some((&target_idx, rest)) = matches.split_first() else {
                    self.report.unresolved_requires += 1;
                    tracing::trace!("{}: external module '{}'", facts.filepath, reference);
                    continue;
                };

                let target = self.files[target_idx];
                if !rest.is_empty() {
                    self.report.record_ambiguity(Ambiguity {
                        source: facts.filepath.clone(),
                        candidate: reference.clone(),
                        strategy: strategy.to_string(),
                        chosen: target.filepath.clone(),
                        alternatives: rest.iter().map(|&i| self.files[i].filepath.clone()).collect(),
                    });
                }

                let from = self.assembler.file_node(&facts.filename, &facts.filepath);
                let to = self.assembler.file_node(&target.filename, &target.filepath);
                if self.assembler.add_edge(from, to, EdgeKind::Requires) {
                    self.report.requires_resolved += 1;
                }
            }
        }
    }
}

/// Last segment of a module reference, minus a source-file extension.
/// `./users.repository` keeps its dotted name; `../lib/api.js` becomes `api`.
pub fn module_stem(reference: &str) -> &str {
    let segment = reference
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(reference);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && Language::from_extension(ext).is_some() => stem,
        _ if segment.chars().all(|c| c == '.') => "",
        _ => segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{CallFact, ClassFact, ClassRole};
    use std::path::Path;

    fn python_file(path: &str, classes: Vec<ClassFact>) -> FileFacts {
        let mut facts = FileFacts::new(Language::Python, Path::new(path));
        facts.classes = classes;
        facts
    }

    fn class(name: &str, candidates: &[&str]) -> ClassFact {
        let mut class = ClassFact::new(name).with_role(ClassRole::detect(name, &[]));
        for candidate in candidates {
            class.add_candidate(*candidate);
        }
        class
    }

    fn depends_on(graph: &Graph) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = graph
            .edges_of_kind(EdgeKind::DependsOn)
            .map(|e| {
                (
                    graph.node(e.from).unwrap().label.clone(),
                    graph.node(e.to).unwrap().label.clone(),
                )
            })
            .collect();
        pairs.sort();
        pairs
    }

    fn user_service_project() -> Vec<FileFacts> {
        vec![
            python_file("db.py", vec![class("Database", &[])]),
            python_file("email.py", vec![class("EmailService", &[])]),
            python_file("auth.py", vec![class("AuthService", &[])]),
            python_file(
                "users.py",
                vec![class("UserService", &["db", "email_service", "auth_service"])],
            ),
        ]
    }

    #[test]
    fn test_user_service_scenario() {
        let resolution = DependencyResolver::new().resolve(&user_service_project());
        let edges = depends_on(&resolution.graph);

        assert!(edges.contains(&("UserService".into(), "EmailService".into())));
        assert!(edges.contains(&("UserService".into(), "AuthService".into())));
        // "db" is not a substring of "database": a known gap of the heuristics.
        assert!(!edges.contains(&("UserService".into(), "Database".into())));
        assert_eq!(resolution.report.unresolved_candidates, 1);
    }

    #[test]
    fn test_zero_classes_has_no_class_or_method_nodes() {
        let mut facts = FileFacts::new(Language::JavaScript, Path::new("util.js"));
        facts.add_function("load");
        facts.add_function("parse");
        facts.add_call(CallFact::new("load", "parse"));

        let resolution = DependencyResolver::new().resolve(&[facts]);
        let graph = &resolution.graph;

        assert_eq!(graph.nodes_of_kind(NodeKind::Class).count(), 0);
        assert_eq!(graph.nodes_of_kind(NodeKind::Method).count(), 0);
        assert_eq!(graph.nodes_of_kind(NodeKind::Function).count(), 2);
        assert_eq!(graph.edges_of_kind(EdgeKind::Calls).count(), 1);
    }

    #[test]
    fn test_order_independence() {
        let project = user_service_project();
        let forward = DependencyResolver::new().resolve(&project);
        let backward = DependencyResolver::new().resolve(project.iter().rev());

        assert_eq!(forward.graph.labeled_edges(), backward.graph.labeled_edges());
        assert_eq!(forward.graph.labeled_nodes(), backward.graph.labeled_nodes());
    }

    #[test]
    fn test_idempotence() {
        let project = user_service_project();
        let resolver = DependencyResolver::new();
        let first = resolver.resolve(&project);
        let second = resolver.resolve(&project);
        assert_eq!(first.graph, second.graph);
        assert_eq!(first.report, second.report);
    }

    #[test]
    fn test_no_self_dependency() {
        let project = vec![python_file(
            "orders.py",
            vec![class("OrderService", &["order_service", "order", "orderservice"])],
        )];
        let resolution = DependencyResolver::new().resolve(&project);
        assert!(depends_on(&resolution.graph).is_empty());
        assert!(resolution
            .graph
            .edges
            .iter()
            .all(|e| e.from != e.to));
    }

    #[test]
    fn test_same_named_class_is_not_a_dependency() {
        let project = vec![
            python_file("a/user.py", vec![class("User", &["user"])]),
            python_file("b/user.py", vec![class("User", &[])]),
        ];
        let resolution = DependencyResolver::new().resolve(&project);
        assert!(depends_on(&resolution.graph).is_empty());
        assert_eq!(resolution.graph.nodes_of_kind(NodeKind::Class).count(), 2);
    }

    #[test]
    fn test_cycles_are_allowed() {
        let project = vec![
            python_file("a.py", vec![class("Alpha", &["beta"])]),
            python_file("b.py", vec![class("Beta", &["alpha"])]),
        ];
        let edges = depends_on(&DependencyResolver::new().resolve(&project).graph);
        assert_eq!(
            edges,
            vec![
                ("Alpha".to_string(), "Beta".to_string()),
                ("Beta".to_string(), "Alpha".to_string())
            ]
        );
    }

    #[test]
    fn test_first_match_in_registry_order_and_ambiguity_report() {
        let project = vec![
            python_file("a_gateway.py", vec![class("PaymentGateway", &[])]),
            python_file("b_ledger.py", vec![class("PaymentLedger", &[])]),
            python_file("c_checkout.py", vec![class("Checkout", &["payment"])]),
        ];
        let resolution = DependencyResolver::new().resolve(&project);

        assert_eq!(
            depends_on(&resolution.graph),
            vec![("Checkout".to_string(), "PaymentGateway".to_string())]
        );
        let ambiguity = &resolution.report.ambiguities[0];
        assert_eq!(ambiguity.candidate, "payment");
        assert_eq!(ambiguity.chosen, "PaymentGateway");
        assert_eq!(ambiguity.alternatives, vec!["PaymentLedger"]);
    }

    #[test]
    fn test_methods_keyed_by_owning_class() {
        let mut repo_a = class("UserRepo", &[]);
        repo_a.add_method("save");
        let mut repo_b = class("OrderRepo", &[]);
        repo_b.add_method("save");
        let project = vec![python_file("repos.py", vec![repo_a, repo_b])];

        let graph = DependencyResolver::new().resolve(&project).graph;
        assert_eq!(graph.nodes_of_kind(NodeKind::Method).count(), 2);
        assert_eq!(graph.edges_of_kind(EdgeKind::HasMethod).count(), 2);
    }

    #[test]
    fn test_calls_stay_within_file() {
        let mut a = FileFacts::new(Language::Python, Path::new("a.py"));
        a.add_function("main");
        a.add_call(CallFact::new("main", "helper"));
        let mut b = FileFacts::new(Language::Python, Path::new("b.py"));
        b.add_function("helper");

        let resolution = DependencyResolver::new().resolve(&[a, b]);
        assert_eq!(resolution.report.calls_resolved, 0);
    }

    #[test]
    fn test_module_references() {
        let mut app = FileFacts::new(Language::JavaScript, Path::new("src/app.js"));
        app.add_require("./api");
        app.add_require("../lib/format.js");
        app.add_require("./app");
        app.add_require("./missing");
        let api = FileFacts::new(Language::JavaScript, Path::new("src/api.js"));
        let format = FileFacts::new(Language::JavaScript, Path::new("lib/date_format.js"));

        let resolution = DependencyResolver::new().resolve(&[app, api, format]);
        let graph = &resolution.graph;
        let requires: Vec<(String, String)> = graph
            .edges_of_kind(EdgeKind::Requires)
            .map(|e| {
                (
                    graph.node(e.from).unwrap().label.clone(),
                    graph.node(e.to).unwrap().label.clone(),
                )
            })
            .collect();

        assert_eq!(
            requires,
            vec![
                ("app.js".to_string(), "api.js".to_string()),
                ("app.js".to_string(), "date_format.js".to_string()),
            ]
        );
        assert_eq!(resolution.report.unresolved_requires, 2);
    }

    /// Collects formatted log output of everything run inside `f`.
    fn captured_logs(f: impl FnOnce()) -> String {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl Write for Buffer {
            fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(bytes);
                Ok(bytes.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_ambiguous_module_reference_is_reported_and_logged() {
        let mut app = FileFacts::new(Language::JavaScript, Path::new("src/app.js"));
        app.add_require("./format");
        let date = FileFacts::new(Language::JavaScript, Path::new("lib/date_format.js"));
        let money = FileFacts::new(Language::JavaScript, Path::new("lib/money_format.js"));
        let files = [app, date, money];

        let mut resolution = Resolution::default();
        let logs = captured_logs(|| resolution = DependencyResolver::new().resolve(&files));

        let ambiguity = &resolution.report.ambiguities[0];
        assert_eq!(ambiguity.source, "src/app.js");
        assert_eq!(ambiguity.strategy, "module-containment");
        assert_eq!(ambiguity.chosen, "lib/date_format.js");
        assert_eq!(ambiguity.alternatives, vec!["lib/money_format.js"]);
        assert_eq!(resolution.report.requires_resolved, 1);
        assert!(logs.contains("src/app.js: './format' matched lib/date_format.js by module-containment"));
    }

    #[test]
    fn test_ambiguous_class_candidate_is_logged() {
        let project = vec![
            python_file("a_gateway.py", vec![class("PaymentGateway", &[])]),
            python_file("b_ledger.py", vec![class("PaymentLedger", &[])]),
            python_file("c_checkout.py", vec![class("Checkout", &["payment"])]),
        ];
        let logs = captured_logs(|| {
            DependencyResolver::new().resolve(&project);
        });
        assert!(logs.contains("Checkout: 'payment' matched PaymentGateway"));
    }

    #[test]
    fn test_markup_links_to_scripts() {
        let mut page = FileFacts::new(Language::Html, Path::new("index.html"));
        page.add_require("js/main.js");
        let script = FileFacts::new(Language::JavaScript, Path::new("js/main.js"));

        let graph = DependencyResolver::new().resolve(&[page, script]).graph;
        assert_eq!(graph.nodes_of_kind(NodeKind::File).count(), 2);
        assert_eq!(graph.edges_of_kind(EdgeKind::Requires).count(), 1);
    }

    #[test]
    fn test_module_stem() {
        assert_eq!(module_stem("./utils"), "utils");
        assert_eq!(module_stem("../models/User.js"), "User");
        assert_eq!(module_stem("./users.repository"), "users.repository");
        assert_eq!(module_stem("css/main.css"), "main");
        assert_eq!(module_stem("./components/"), "components");
        assert_eq!(module_stem("."), "");
        assert_eq!(module_stem("./"), "");
    }
}
