//! CLI logic for the Quiver diagram tool.
//!
//! This module loads a diagram document, reroutes its connectors against the
//! loaded shapes and exports the result as SVG.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{debug, info, warn};

use quiver::{
    Editor, QuiverError,
    document::DiagramDocument,
    export::{Exporter, svg::Svg},
};

/// Run the Quiver CLI application
///
/// This function loads the input document, optionally writes the normalized
/// document, and writes the resulting SVG to the output file.
///
/// # Errors
///
/// Returns `QuiverError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Document parse errors, and dropped records in `--strict` mode
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), QuiverError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let document: DiagramDocument = toml::from_str(&source)
        .map_err(|err| QuiverError::new_document_error(err.message(), err.span()))?;
    debug!(
        shapes = document.shapes.len(),
        connectors = document.connectors.len(),
        labels = document.labels.len(),
        groups = document.groups.len();
        "Document parsed"
    );

    let (editor, report) = Editor::from_document(&app_config, &document)?;
    if !report.is_clean() {
        warn!(
            dropped_connectors = report.dropped_connectors,
            duplicate_shape_ids = report.duplicate_shape_ids,
            invalid_shapes = report.invalid_shapes,
            dropped_groups = report.dropped_groups;
            "Some records could not be loaded"
        );
        if args.strict {
            return Err(QuiverError::new_document_error(
                format!(
                    "{} connector(s), {} duplicate shape(s), {} invalid shape(s) and {} group(s) were dropped",
                    report.dropped_connectors,
                    report.duplicate_shape_ids,
                    report.invalid_shapes,
                    report.dropped_groups
                ),
                None,
            ));
        }
    }

    if let Some(path) = &args.normalize {
        let normalized = toml::to_string(&editor.document())
            .map_err(|err| QuiverError::new_document_error(err.to_string(), None))?;
        fs::write(path, normalized)?;
        info!(path = path.as_str(); "Normalized document written");
    }

    let exporter = Svg::from_style(&args.output, app_config.style())?;
    exporter.export_graph(editor.graph())?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
