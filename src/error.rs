//! Rust-level error types.
//!
//! Diagnostics about the *program being generated* are data (see
//! `diagnostics.rs`). The errors here describe failures of the generator's own
//! collaborators: file I/O, JSON decoding, per-method conversion and the
//! optimizer.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a batch, cache or configuration collaborator.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid program unit {path}: {source}")]
    InvalidUnit {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("cache error: {0}")]
    Cache(String),
}

/// Structural failure converting one method or constructor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("unsupported operator method: operator {0}")]
    UnsupportedOperator(String),

    #[error("malformed accessor `{name}`: {reason}")]
    MalformedAccessor { name: String, reason: String },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Failure inside the optimizer; the caller keeps the unoptimized text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptimizeError {
    #[error("unterminated {kind} starting at byte {offset}")]
    Unterminated { kind: &'static str, offset: usize },

    #[error("optimizer produced unbalanced output")]
    Unbalanced,
}

pub type CodegenResult<T> = Result<T, CodegenError>;
pub type EmitResult<T> = Result<T, EmitError>;

/// Message carried by a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
