pub mod css;
pub mod html;
pub mod java;
pub mod javascript;
pub mod python;
pub mod typescript;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Languages with a fact extractor. Dispatch on this enum is exhaustive, so a
/// new variant does not compile until it has a grammar and an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    JavaScript,
    TypeScript,
    Tsx,
    Html,
    Css,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Python,
        Language::Java,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
        Language::Html,
        Language::Css,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Html => "html",
            Language::Css => "css",
        }
    }

    pub fn file_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::Java => &["java"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "mts", "cts"],
            Language::Tsx => &["tsx"],
            Language::Html => &["html", "htm"],
            Language::Css => &["css", "scss"],
        }
    }

    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Html => tree_sitter_html::LANGUAGE.into(),
            Language::Css => tree_sitter_css::LANGUAGE.into(),
        }
    }

    /// Kind of the root node a usable tree has for this grammar.
    pub fn root_kind(&self) -> &'static str {
        match self {
            Language::Python => "module",
            Language::Java | Language::JavaScript | Language::TypeScript | Language::Tsx => {
                "program"
            }
            Language::Html => "document",
            Language::Css => "stylesheet",
        }
    }

    /// Markup and style languages only feed cross-language linking.
    pub fn is_markup(&self) -> bool {
        matches!(self, Language::Html | Language::Css)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.name() == name)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.file_extensions().contains(&ext.as_str()))
    }

    pub fn for_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primitive and standard-library type names that never name a project class.
pub fn is_builtin_type(name: &str, language: Language) -> bool {
    match language {
        Language::Java => matches!(
            name,
            "int" | "long" | "short" | "byte" | "float" | "double" | "boolean" | "char"
                | "void" | "Integer" | "Long" | "Short" | "Byte" | "Float" | "Double"
                | "Boolean" | "Character" | "String" | "Object" | "List" | "Set" | "Map"
                | "Optional" | "Collection" | "UUID" | "BigDecimal" | "LocalDate"
                | "LocalDateTime" | "Instant"
        ),
        Language::TypeScript | Language::Tsx | Language::JavaScript => matches!(
            name,
            "string" | "number" | "boolean" | "void" | "null" | "undefined"
                | "any" | "unknown" | "never" | "object" | "symbol" | "bigint"
                | "String" | "Number" | "Boolean" | "Array" | "Object" | "Promise"
                | "Record" | "Partial" | "Map" | "Set" | "Date"
        ),
        Language::Python => matches!(
            name,
            "self" | "cls" | "int" | "str" | "float" | "bool" | "bytes" | "list" | "dict"
                | "set" | "tuple" | "None" | "Any" | "Optional" | "List" | "Dict"
        ),
        Language::Html | Language::Css => false,
    }
}

/// Strips quotes or backticks around a string literal.
pub(crate) fn unquote(text: &str) -> &str {
    text.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Script-style module references that point into the project itself.
pub(crate) fn is_relative_reference(path: &str) -> bool {
    path.starts_with('.')
}
