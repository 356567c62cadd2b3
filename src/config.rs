//! Analysis settings, read from an optional `archmap.toml` at the project root.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::indexer::tree_walk::DEFAULT_MAX_DEPTH;

pub const CONFIG_FILE_NAME: &str = "archmap.toml";
pub const CACHE_DIR_ENV: &str = "ARCHMAP_CACHE_DIR";

const DEFAULT_CACHE_DIR_NAME: &str = ".archmap_cache";

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "venv",
    ".venv",
    "__pycache__",
    "build",
    "dist",
    ".git",
    "target",
    "out",
    ".next",
    ".nuxt",
    "coverage",
    "public",
    "static",
    "assets",
    "test",
    "tests",
    "__tests__",
    "spec",
    "specs",
];

const DEFAULT_EXCLUDED_FILES: &[&str] = &[
    "webpack.config.js",
    "jest.config.js",
    "babel.config.js",
    "vite.config.js",
    "tailwind.config.js",
    "postcss.config.js",
    "rollup.config.js",
    "prettier.config.js",
    ".eslintrc.js",
    "config.js",
    "setup.js",
    "seed.js",
    "__init__.py",
];

/// Per-field truncation applied when building a fact summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryLimits {
    pub functions: usize,
    pub requires: usize,
    pub methods: usize,
    pub annotations: usize,
    pub dependencies: usize,
    pub calls: usize,
    pub components: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            functions: 10,
            requires: 8,
            methods: 8,
            annotations: 6,
            dependencies: 6,
            calls: 10,
            components: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory names never descended into.
    pub excluded_dirs: Vec<String>,
    /// Exact file names that are never architectural.
    pub excluded_files: Vec<String>,
    /// Aggregate html/css files as well as backend sources.
    pub include_markup: bool,
    pub max_tree_depth: usize,
    pub summary: SummaryLimits,
    pub cache_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            excluded_files: DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect(),
            include_markup: false,
            max_tree_depth: DEFAULT_MAX_DEPTH,
            summary: SummaryLimits::default(),
            cache_dir: None,
        }
    }
}

impl AnalysisConfig {
    /// Loads `archmap.toml` from `root` when present, defaults otherwise.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Directory names are compared ignoring ASCII case.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d.eq_ignore_ascii_case(name))
    }

    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.excluded_files.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    /// Cache location: `ARCHMAP_CACHE_DIR`, then the configured directory,
    /// then `~/.archmap_cache`.
    pub fn resolve_cache_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(DEFAULT_CACHE_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert!(config.is_excluded_dir("node_modules"));
        assert!(config.is_excluded_dir("__tests__"));
        assert!(!config.is_excluded_dir("src"));
        assert!(config.is_excluded_dir("Node_Modules"));
        assert!(config.is_excluded_file("webpack.config.js"));
        assert!(config.is_excluded_file("__init__.py"));
        assert!(!config.include_markup);
        assert_eq!(config.max_tree_depth, 512);
        assert_eq!(config.summary.functions, 10);
        assert_eq!(config.summary.calls, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
include_markup = true

[summary]
methods = 3
"#,
        )
        .unwrap();
        assert!(config.include_markup);
        assert_eq!(config.summary.methods, 3);
        assert_eq!(config.summary.functions, 10);
        assert!(config.is_excluded_dir("dist"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AnalysisConfig::from_toml_str("include_markup = \"yes\"").unwrap_err();
        assert!(matches!(err, crate::error::ArchError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AnalysisConfig::load(dir.path()).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_load_from_project_root() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "excluded_dirs = [\"legacy\"]\nmax_tree_depth = 64\n",
        )
        .unwrap();

        let config = AnalysisConfig::load(dir.path()).unwrap();
        assert_eq!(config.excluded_dirs, vec!["legacy"]);
        assert_eq!(config.max_tree_depth, 64);
    }
}
