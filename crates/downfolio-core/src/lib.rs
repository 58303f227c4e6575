//! Document customization and conversion for downfolio.
//!
//! - [`ai`]: provider selection, prompts and the HTTP clients.
//! - [`convert`]: Pandoc invocation for docx and pdf output.
//! - [`markdown`]: validation and plain-text preview.
//! - [`pipeline`]: the end-to-end generate flow.

pub mod ai;
pub mod convert;
pub mod markdown;
pub mod pipeline;

pub use ai::{AiError, Customizer, CustomizeRequest, CustomizeResult, HttpBackend, LlmBackend};
pub use convert::{CommandOutput, CommandRunner, ConvertError, Converter, TokioRunner};
pub use pipeline::{
    DocumentSelection, GenerateError, GeneratedDocument, GenerationReport, GenerationRequest,
    Pipeline,
};
