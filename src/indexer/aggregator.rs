use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::cache::CacheKey;
use crate::config::AnalysisConfig;
use crate::error::{ArchError, Result};
use crate::facts::FileFacts;
use crate::indexer::extractor::FactExtractor;
use crate::indexer::parser::Parser;
use crate::indexer::progress::AggregationProgress;
use crate::indexer::walker::FileWalker;
use crate::languages::Language;

/// One upstream input: raw bytes with an already detected language.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, language: Language, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            language,
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Facts of a whole project, grouped by language. Each group keeps
/// directory-listing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectFacts {
    pub by_language: BTreeMap<Language, Vec<FileFacts>>,
    #[serde(skip)]
    pub failures: Vec<FailedFile>,
}

impl ProjectFacts {
    pub fn files(&self) -> impl Iterator<Item = &FileFacts> {
        self.by_language.values().flatten()
    }

    pub fn language(&self, language: Language) -> &[FileFacts] {
        self.by_language
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn file_count(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }

    /// Content key over every extracted fact. Independent of listing order,
    /// so the same sources in another checkout share it.
    pub fn cache_key(&self) -> Result<CacheKey> {
        let mut files: Vec<&FileFacts> = self.files().collect();
        files.sort_by(|a, b| (a.language, &a.filepath).cmp(&(b.language, &b.filepath)));
        CacheKey::for_value(&files)
    }

    fn push(&mut self, facts: FileFacts) {
        self.by_language.entry(facts.language).or_default().push(facts);
    }
}

pub struct ProjectAggregator {
    config: AnalysisConfig,
    progress: AggregationProgress,
}

impl ProjectAggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            progress: AggregationProgress::new(),
        }
    }

    pub fn with_progress(mut self, progress: AggregationProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn progress(&self) -> &AggregationProgress {
        &self.progress
    }

    /// Walks `root` and extracts every eligible file in parallel. A file that
    /// cannot be read or extracted is logged, recorded in `failures` and skipped.
    pub fn aggregate(&self, root: &Path) -> Result<ProjectFacts> {
        let walker = FileWalker::new(&self.config);
        let files = walker.walk(root)?;
        tracing::info!("Found {} files to analyze under {}", files.len(), root.display());

        self.progress.start();

        let results: Vec<(PathBuf, Result<FileFacts>)> = files
            .par_iter()
            .map(|file| {
                let display_path = file.strip_prefix(root).unwrap_or(file);
                let result = self.extract_path(file, display_path);
                match &result {
                    Ok(facts) => self.progress.file_done(facts.classes.len()),
                    Err(_) => self.progress.file_failed(),
                }
                (file.clone(), result)
            })
            .collect();

        let mut project = ProjectFacts::default();
        for (path, result) in results {
            match result {
                Ok(facts) => project.push(facts),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    project.failures.push(FailedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Aggregated {} files ({} skipped)",
            project.file_count(),
            project.failures.len()
        );
        Ok(project)
    }

    /// Single-file entry point. Unlike [`aggregate`](Self::aggregate), every
    /// failure is returned to the caller.
    pub fn analyze_file(&self, path: &Path) -> Result<FileFacts> {
        if !path.is_file() {
            return Err(ArchError::FileNotFound(path.display().to_string()));
        }
        self.extract_path(path, path)
    }

    pub fn extract_source(&self, source: SourceFile) -> Result<FileFacts> {
        let SourceFile {
            path,
            language,
            bytes,
        } = source;
        let parsed = Parser::new().parse_source(bytes, language)?;
        FactExtractor::with_max_depth(self.config.max_tree_depth).extract(&parsed, &path)
    }

    fn extract_path(&self, path: &Path, display_path: &Path) -> Result<FileFacts> {
        let language = Language::for_path(path)
            .ok_or_else(|| ArchError::UnsupportedLanguage(path.display().to_string()))?;
        let bytes = fs::read(path)?;
        self.extract_source(SourceFile::new(display_path, language, bytes))
    }
}
