pub mod models;
pub mod summary;

pub use models::{
    file_stem, CallFact, ClassFact, ClassRole, FileFacts, FormTarget, FrameworkPatterns,
    MarkupFacts, ReactPattern, SpringPatterns, StyleFacts,
};
pub use summary::{ClassSummary, FactSummary, FileSummary};
