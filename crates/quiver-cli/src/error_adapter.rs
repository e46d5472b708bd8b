//! Renders [`QuiverError`] through miette.
//!
//! Document errors that carry a byte span become a labeled snippet of the
//! input TOML. Every other error is printed with a `quiver::*` code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use quiver::QuiverError;

/// Adapter for a [`QuiverError::Document`] pointing into the input source.
pub struct DocumentAdapter<'a> {
    message: &'a str,
    span: SourceSpan,
    src: &'a str,
}

impl<'a> DocumentAdapter<'a> {
    pub fn new(message: &'a str, span: SourceSpan, src: &'a str) -> Self {
        Self { message, span, src }
    }
}

impl fmt::Debug for DocumentAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentAdapter")
            .field("message", &self.message)
            .field("span", &self.span)
            .finish()
    }
}

impl fmt::Display for DocumentAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DocumentAdapter<'_> {}

impl MietteDiagnostic for DocumentAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("quiver::document"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            self.span,
        ))))
    }
}

/// Adapter for [`QuiverError`] values without source location.
pub struct ErrorAdapter<'a>(pub &'a QuiverError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            QuiverError::InvalidReference { .. } => "quiver::reference",
            QuiverError::EmptyHistory | QuiverError::NoFutureHistory => "quiver::history",
            QuiverError::DegenerateGeometry(_) => "quiver::geometry",
            QuiverError::UnknownEntity(_) => "quiver::entity",
            QuiverError::GroupTooSmall(_) => "quiver::group",
            QuiverError::Document { .. } => "quiver::document",
            QuiverError::Config(_) => "quiver::config",
            QuiverError::Io(_) => "quiver::io",
            QuiverError::Export(_) => "quiver::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            QuiverError::Config(_) => Some(Box::new(
                "check the configuration file passed with --config or found in quiver/config.toml",
            )),
            _ => None,
        }
    }
}

/// One diagnostic handed to the miette report handler.
#[derive(Debug)]
pub enum Reportable<'a> {
    Document(DocumentAdapter<'a>),
    /// No source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Document(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Document(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Document(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Document(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Document(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Document(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`QuiverError`] into a list of reportable errors.
///
/// `src` is the text of the input document. A [`QuiverError::Document`] with
/// a span that fits inside `src` becomes a labeled snippet; everything else
/// is reported without source location.
pub fn to_reportables<'a>(err: &'a QuiverError, src: &'a str) -> Vec<Reportable<'a>> {
    if let QuiverError::Document {
        message,
        span: Some(span),
    } = err
    {
        if span.end <= src.len() {
            let span = SourceSpan::new(span.start.into(), span.len());
            return vec![Reportable::Document(DocumentAdapter::new(message, span, src))];
        }
    }
    vec![Reportable::Error(ErrorAdapter(err))]
}
