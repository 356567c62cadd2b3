use std::path::Path;

use tree_sitter::Tree;

use crate::error::{ArchError, Result};
use crate::facts::FileFacts;
use crate::indexer::parser::ParsedFile;
use crate::indexer::tree_walk::DEFAULT_MAX_DEPTH;
use crate::languages::{css, html, java, javascript, python, typescript, Language};

/// Turns a syntax tree into normalized [`FileFacts`], dispatching on the
/// language tag. Partial trees yield best-effort facts; only a tree with no
/// usable root is an error.
#[derive(Debug, Clone, Copy)]
pub struct FactExtractor {
    max_depth: usize,
}

impl Default for FactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FactExtractor {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn extract(&self, parsed: &ParsedFile, file_path: &Path) -> Result<FileFacts> {
        self.extract_tree(parsed.language, &parsed.tree, parsed.source_bytes(), file_path)
    }

    pub fn extract_tree(
        &self,
        language: Language,
        tree: &Tree,
        source: &[u8],
        file_path: &Path,
    ) -> Result<FileFacts> {
        let root = tree.root_node();
        let path_str = file_path.display().to_string();

        if std::str::from_utf8(source).is_err() {
            return Err(ArchError::extraction(path_str, "source is not valid UTF-8"));
        }
        if root.is_error() || root.is_missing() {
            return Err(ArchError::extraction(path_str, "syntax tree has no usable root"));
        }
        if root.kind() != language.root_kind() {
            return Err(ArchError::extraction(
                path_str,
                format!(
                    "expected {} root for {}, found {}",
                    language.root_kind(),
                    language,
                    root.kind()
                ),
            ));
        }

        let mut facts = FileFacts::new(language, file_path);
        let stats = match language {
            Language::Python => python::extract(root, source, self.max_depth, &mut facts),
            Language::Java => java::extract(root, source, self.max_depth, &mut facts),
            Language::JavaScript => javascript::extract(root, source, self.max_depth, &mut facts),
            Language::TypeScript | Language::Tsx => {
                typescript::extract(root, source, self.max_depth, &mut facts)
            }
            Language::Html => html::extract(root, source, self.max_depth, &mut facts),
            Language::Css => css::extract(root, source, self.max_depth, &mut facts),
        };

        if stats.truncated > 0 {
            tracing::warn!(
                "{}: {} subtrees deeper than {} were not visited",
                path_str,
                stats.truncated,
                self.max_depth
            );
        }
        if root.has_error() {
            tracing::debug!("{}: partial syntax tree, facts are best-effort", path_str);
        }

        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::parser::Parser;

    fn extract(source: &str, language: Language, path: &str) -> Result<FileFacts> {
        let parsed = Parser::new().parse_source(source, language)?;
        FactExtractor::new().extract(&parsed, Path::new(path))
    }

    #[test]
    fn test_dispatch_per_language() {
        let py = extract("class A:\n    pass\n", Language::Python, "a.py").unwrap();
        assert_eq!(py.language, Language::Python);
        assert_eq!(py.classes[0].name, "A");

        let java = extract("class B {}", Language::Java, "B.java").unwrap();
        assert_eq!(java.classes[0].name, "B");

        let ts = extract("interface C { run(): void; }", Language::TypeScript, "c.ts").unwrap();
        assert_eq!(ts.classes[0].name, "C");

        let html = extract("<div id=\"x\"></div>", Language::Html, "i.html").unwrap();
        assert!(html.markup.is_some());

        let css = extract(".x { color: red; }", Language::Css, "s.css").unwrap();
        assert!(css.style.is_some());
    }

    #[test]
    fn test_malformed_source_is_best_effort() {
        let facts = extract(
            "class Broken:\n    def ok(self):\n        pass\n    def (:\n",
            Language::Python,
            "broken.py",
        )
        .unwrap();
        assert_eq!(facts.filename, "broken.py");
    }

    #[test]
    fn test_tree_of_wrong_language_is_extraction_failure() {
        let parsed = Parser::new().parse_source("x = 1\n", Language::Python).unwrap();
        let err = FactExtractor::new()
            .extract_tree(Language::Css, &parsed.tree, parsed.source_bytes(), Path::new("x.css"))
            .unwrap_err();
        assert!(matches!(err, ArchError::ExtractionFailure { .. }));
    }

    #[test]
    fn test_non_utf8_source_is_extraction_failure() {
        let parsed = Parser::new()
            .parse_source(vec![0xff, 0xfe, 0x00, 0x9f], Language::Python)
            .unwrap();
        let err = FactExtractor::new()
            .extract(&parsed, Path::new("bad.py"))
            .unwrap_err();
        assert!(matches!(err, ArchError::ExtractionFailure { ref reason, .. } if reason.contains("UTF-8")));
    }

    #[test]
    fn test_small_depth_still_extracts_top_level() {
        let parsed = Parser::new()
            .parse_source("def main():\n    return 1\n", Language::Python)
            .unwrap();
        let facts = FactExtractor::with_max_depth(2)
            .extract(&parsed, Path::new("main.py"))
            .unwrap();
        assert_eq!(facts.functions, vec!["main"]);
    }
}
