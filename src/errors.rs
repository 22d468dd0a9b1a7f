// src/errors.rs

//! Crate-wide error types.
//!
//! Pipeline steps report a [`StepError`]; everything above the step boundary
//! uses `anyhow` for context-carrying propagation.

pub use anyhow::{Error, Result};

/// Failure of a single transformation step inside a pipeline run.
///
/// A step error aborts only the current run of the task it occurred in; the
/// watch session and all other tasks keep going.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The preprocessor rejected the source (e.g. invalid Sass).
    #[error("compile error: {0}")]
    Compile(String),

    /// A CSS/JS transformation step failed (prefixing, pixel fallback, printing).
    #[error("transform error: {0}")]
    Transform(String),

    /// The minifier rejected its input.
    #[error("minify error: {0}")]
    Minify(String),

    /// Reading sources or writing artifacts failed.
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StepError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StepError::Io {
            path: path.into(),
            source,
        }
    }
}
