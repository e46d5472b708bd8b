//! Writing diagrams out.
//!
//! [`svg::Svg`] is the only backend. Failures are reported as [`Error`],
//! which converts into [`QuiverError::Export`].
//!
//! [`QuiverError::Export`]: crate::QuiverError::Export

pub mod svg;

use crate::structure::DiagramGraph;

/// An output format for a [`DiagramGraph`].
pub trait Exporter {
    /// Writes `graph` to the backend's destination.
    ///
    /// # Errors
    ///
    /// [`Error::Render`] when the graph cannot be expressed in the format,
    /// [`Error::Io`] when the destination cannot be written.
    fn export_graph(&self, graph: &DiagramGraph) -> Result<(), Error>;
}

/// Export failure.
#[derive(Debug)]
pub enum Error {
    /// The graph could not be rendered; the message says why.
    Render(String),
    /// The destination could not be written.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
