pub mod cache;
pub mod config;
pub mod error;
pub mod facts;
pub mod graph;
pub mod indexer;
pub mod languages;

pub use cache::{CacheInfo, CacheKey, ResultCache};
pub use config::{AnalysisConfig, SummaryLimits};
pub use error::{ArchError, Result};
pub use facts::{
    CallFact, ClassFact, ClassRole, FactSummary, FileFacts, FrameworkPatterns, MarkupFacts,
    ReactPattern, StyleFacts,
};
pub use graph::{
    DependencyResolver, Edge, EdgeKind, Graph, Node, NodeId, NodeKind, Resolution,
    ResolutionReport,
};
pub use indexer::{FactExtractor, FileWalker, Parser, ProjectAggregator, ProjectFacts, SourceFile};
pub use languages::Language;
