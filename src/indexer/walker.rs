use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::config::AnalysisConfig;
use crate::error::{ArchError, Result};
use crate::languages::Language;

/// Name suffixes (before the extension) that mark test files.
const TEST_STEM_SUFFIXES: &[&str] = &[".test", ".spec"];

/// Lists the files of a project worth extracting, in directory-listing order.
pub struct FileWalker {
    config: AnalysisConfig,
}

impl FileWalker {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(ArchError::FileNotFound(root.display().to_string()));
        }

        let config = self.config.clone();
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if entry.depth() == 0 || !is_dir {
                    return true;
                }
                !config.is_excluded_dir(&entry.file_name().to_string_lossy())
            })
            .build();

        let mut files = Vec::new();
        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file() && self.is_eligible(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// File-level rules: a supported language, not minified, not a test file,
    /// not a known tool configuration file.
    pub fn is_eligible(&self, path: &Path) -> bool {
        let Some(language) = Language::for_path(path) else {
            return false;
        };
        if language.is_markup() && !self.config.include_markup {
            return false;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_lowercase()) else {
            return false;
        };
        if name.contains(".min.") || self.config.is_excluded_file(&name) {
            return false;
        }

        let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&name);
        !TEST_STEM_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix))
    }
}
