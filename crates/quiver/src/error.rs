//! Error types for Quiver operations.
//!
//! This module provides the main error type [`QuiverError`] which wraps
//! the error conditions that can occur while editing, loading or exporting
//! a diagram.

use std::{io, ops::Range};

use thiserror::Error;

use quiver_core::identifier::EntityId;

/// The main error type for Quiver operations.
///
/// # Recovery
///
/// Most variants are local, recoverable conditions. A graph operation that
/// returns [`QuiverError::InvalidReference`] or
/// [`QuiverError::DegenerateGeometry`] has left the graph untouched, and so
/// has a grouping request rejected with [`QuiverError::GroupTooSmall`].
/// [`QuiverError::EmptyHistory`] and [`QuiverError::NoFutureHistory`] are
/// reported by the snapshot stack; the editor treats them as no-ops.
///
/// # Diagnostic Variants
///
/// The `Document` variant carries an optional byte span into the source the
/// document was read from, so callers can point at the offending snippet.
#[derive(Debug, Error)]
pub enum QuiverError {
    #[error("invalid reference to {id}: {reason}")]
    InvalidReference { id: EntityId, reason: String },

    #[error("nothing to undo")]
    EmptyHistory,

    #[error("nothing to redo")]
    NoFutureHistory,

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("a group needs at least two nodes, got {0}")]
    GroupTooSmall(usize),

    #[error("{message}")]
    Document {
        message: String,
        span: Option<Range<usize>>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<crate::export::Error> for QuiverError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl QuiverError {
    /// Create a new `InvalidReference` error.
    pub fn invalid_reference(id: EntityId, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            id,
            reason: reason.into(),
        }
    }

    /// Create a new `Document` error, optionally pointing at a byte range of the source.
    pub fn new_document_error(message: impl Into<String>, span: Option<Range<usize>>) -> Self {
        Self::Document {
            message: message.into(),
            span,
        }
    }
}
