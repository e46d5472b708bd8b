//! Quiver - the editing core of an interactive diagram editor.
//!
//! A diagram is a graph of polygonal shape nodes joined by directed
//! connectors, plus free-standing text labels. This crate owns that graph and
//! everything that mutates it: boundary-clipped connector routing, drag-time
//! alignment with sticky snapping, whole-graph undo/redo snapshots, clipboard
//! copy/paste, a format-agnostic persistence contract and SVG export.
//!
//! Most callers drive an [`Editor`], which turns pointer events and commands
//! into graph mutations and history entries. The building blocks are public
//! for callers that want finer control:
//!
//! - [`structure`]: [`structure::DiagramGraph`] and its entity types
//! - [`routing`]: connector line clipping
//! - [`align`]: guide lines and sticky snapping during a drag
//! - [`history`]: the snapshot stack
//! - [`document`]: the serializable document form
//! - [`export`]: exporters
//!
//! # Examples
//!
//! ```rust,no_run
//! use quiver::{Editor, config::AppConfig, geometry::Point, shape::ShapeKind};
//!
//! let mut editor = Editor::new(&AppConfig::default()).expect("valid config");
//! let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
//! let b = editor.insert_node(ShapeKind::Circle, Point::new(300.0, 0.0));
//! editor.connect(a, b).expect("both nodes exist");
//!
//! let svg = editor.render_svg();
//! println!("{svg}");
//! ```

pub mod align;
pub mod clipboard;
pub mod config;
pub mod document;
pub mod export;
pub mod gesture;
pub mod history;
pub mod routing;
pub mod structure;

mod editor;
mod error;

pub use quiver_core::{color, geometry, identifier, shape};

pub use editor::Editor;
pub use error::QuiverError;
