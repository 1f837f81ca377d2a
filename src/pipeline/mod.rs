//! The prompt pipeline.
//!
//! ```text
//! RawInput -> split_source -> PromptParser -> Enhancer? -> PromptValidator
//!          -> PromptTransformer::shape -> render -> ExportSink
//! ```
//!
//! Parsing, validation and shaping are pure and synchronous. Enhancers and
//! sinks are async trait objects awaited one item at a time.

pub mod enhancer;
pub mod keywords;
pub mod orchestrator;
pub mod parser;
pub mod render;
pub mod sink;
pub mod source;
pub mod transformer;
pub mod types;
pub mod validator;

pub use enhancer::{Enhancer, KeywordEnhancer, NoopEnhancer};
pub use orchestrator::{
    BatchRequest, EnhancementOptions, EnhancementRequest, ExportOptions, ExportRequest, Pipeline,
    PipelineConfig,
};
pub use parser::PromptParser;
pub use sink::{ExportSink, FileSink, MemorySink, UploadReceipt, UploadRequest};
pub use source::{DirectorySource, DocumentSource, split_source};
pub use transformer::PromptTransformer;
pub use types::{
    Components, DetailLevel, ExportOutcome, ExportSummary, Metadata, ProcessedPrompt, RawInput,
    RenderedExport, ShapedPrompt, SourceKind, StructuredPrompt, ValidationStatus,
    ValidationVerdict,
};
pub use validator::PromptValidator;
