pub mod aggregator;
pub mod extractor;
pub mod parser;
pub mod progress;
pub mod tree_walk;
pub mod walker;

pub use aggregator::{FailedFile, ProjectAggregator, ProjectFacts, SourceFile};
pub use extractor::FactExtractor;
pub use parser::{ParsedFile, Parser};
pub use progress::{AggregationProgress, ProgressSnapshot};
pub use walker::FileWalker;
