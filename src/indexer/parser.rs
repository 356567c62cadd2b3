use std::path::Path;

use crate::error::{ArchError, Result};
use crate::languages::Language;

/// Adapter over tree-sitter: turns source bytes plus a language tag into a tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile> {
        let language = Language::for_path(path)
            .ok_or_else(|| ArchError::UnsupportedLanguage(path.display().to_string()))?;

        let source = std::fs::read(path)?;
        self.parse_source(source, language)
    }

    pub fn parse_source(&self, source: impl Into<Vec<u8>>, language: Language) -> Result<ParsedFile> {
        let source = source.into();
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| ArchError::Parse(e.to_string()))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ArchError::Parse(format!("Failed to parse {} source", language)))?;

        Ok(ParsedFile {
            tree,
            source,
            language,
        })
    }
}

#[derive(Debug)]
pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: Vec<u8>,
    pub language: Language,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}
