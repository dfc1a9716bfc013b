//! Pipeline error types.
//!
//! Rendering itself never fails: stages render problems in place. These
//! errors only come from building a pipeline or reading its input.

/// Errors that can occur while building or feeding the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
