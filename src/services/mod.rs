// StyleGuard Core Services

pub mod analysis;
pub mod config_store;
pub mod document_loader;
pub mod providers;
pub mod text_processor;

pub use config_store::*;
pub use providers::*;
pub use text_processor::*;

pub use analysis::{
    score_segments,
    segment_text,
    style_consistency,
    Analyzer,
    ExplanationEngine,
    FeatureExtractor,
    LinguisticResources,
    TaggerKind,
};
pub use document_loader::{extract_text, load_document, DocumentError};
