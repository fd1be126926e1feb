// Atlas Core - tree-sitter powered IR extraction for the Atlas diagram pipeline
//
// Converts a TypeScript/JavaScript source tree into a deterministic,
// language-agnostic IR graph (packages, classifiers, relations) consumed by
// the downstream model-to-diagram generator. CLI wiring, the HTTP wrapper
// service, filesystem scanning and tsconfig loading live in external
// collaborators; this crate exposes the contracts they plug into.

pub mod error;
pub mod extract;
pub mod ir;
pub mod language;
pub mod project;
pub mod report;

pub use error::ExtractError;
pub use extract::{extract_model, ExtractOptions, Extraction, Mode, EXIT_UNRESOLVED};
pub use ir::{IrModel, SCHEMA_VERSION};
pub use project::{CompilerOptions, SourceProgram};
pub use report::{ExtractionReport, ReportSnapshot};
