//! Configuration types for the Quiver editor.
//!
//! This module provides configuration structures that control editing
//! behavior, drag alignment and default styling. All types implement
//! [`serde::Deserialize`] for flexible loading from external sources, and
//! every field falls back to its default when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration combining all sections.
//! - [`EditorConfig`] - Undo history capacity and paste offset.
//! - [`AlignmentConfig`] - Guide and sticky tolerances and the guide-line span.
//! - [`StyleConfig`] - Default colors and font for new entities, and the export background.
//!
//! # Example
//!
//! ```
//! # use quiver::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.editor().history_capacity(), 50);
//! ```

use serde::Deserialize;

use quiver_core::{color::Color, geometry::Point};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Editing behavior section.
    #[serde(default)]
    editor: EditorConfig,

    /// Drag alignment section.
    #[serde(default)]
    alignment: AlignmentConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(editor: EditorConfig, alignment: AlignmentConfig, style: StyleConfig) -> Self {
        Self {
            editor,
            alignment,
            style,
        }
    }

    /// Returns the editor configuration.
    pub fn editor(&self) -> &EditorConfig {
        &self.editor
    }

    /// Returns the alignment configuration.
    pub fn alignment(&self) -> &AlignmentConfig {
        &self.alignment
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Checks that every section holds usable values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        if self.editor.history_capacity == 0 {
            return Err("editor.history_capacity must be at least 1".to_string());
        }
        if !self.editor.paste_offset.is_finite() {
            return Err("editor.paste_offset must be finite".to_string());
        }

        let alignment = &self.alignment;
        if !(alignment.guide_tolerance > 0.0) || !(alignment.sticky_tolerance > 0.0) {
            return Err("alignment tolerances must be positive".to_string());
        }
        if alignment.sticky_tolerance < alignment.guide_tolerance {
            return Err(format!(
                "alignment.sticky_tolerance ({}) must not be smaller than alignment.guide_tolerance ({})",
                alignment.sticky_tolerance, alignment.guide_tolerance
            ));
        }
        if !(alignment.scene_width > 0.0) || !(alignment.scene_height > 0.0) {
            return Err("alignment scene size must be positive".to_string());
        }

        self.style.node_fill_color()?;
        self.style.connector_color()?;
        self.style.text_color()?;
        self.style.background_color()?;
        Ok(())
    }
}

/// Editing behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of snapshots kept in the undo history.
    history_capacity: usize,

    /// Translation applied to pasted entities.
    paste_offset: Point,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            paste_offset: Point::new(20.0, 20.0),
        }
    }
}

impl EditorConfig {
    /// Creates a new [`EditorConfig`].
    pub fn new(history_capacity: usize, paste_offset: Point) -> Self {
        Self {
            history_capacity,
            paste_offset,
        }
    }

    /// Returns the undo history capacity.
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Returns the paste translation.
    pub fn paste_offset(&self) -> Point {
        self.paste_offset
    }
}

/// Drag alignment tolerances.
///
/// `guide_tolerance` decides when a guide line is shown; `sticky_tolerance`
/// decides when the dragged node locks onto another node's axis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    guide_tolerance: f32,
    sticky_tolerance: f32,
    scene_width: f32,
    scene_height: f32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            guide_tolerance: 0.1,
            sticky_tolerance: 5.0,
            scene_width: 5000.0,
            scene_height: 5000.0,
        }
    }
}

impl AlignmentConfig {
    /// Creates a new [`AlignmentConfig`] keeping the default scene size.
    pub fn new(guide_tolerance: f32, sticky_tolerance: f32) -> Self {
        Self {
            guide_tolerance,
            sticky_tolerance,
            ..Self::default()
        }
    }

    /// Returns the exact-alignment tolerance used for guide lines.
    pub fn guide_tolerance(&self) -> f32 {
        self.guide_tolerance
    }

    /// Returns the tolerance under which a dragged node latches onto an axis.
    pub fn sticky_tolerance(&self) -> f32 {
        self.sticky_tolerance
    }

    /// Returns the width spanned by horizontal guide lines.
    pub fn scene_width(&self) -> f32 {
        self.scene_width
    }

    /// Returns the height spanned by vertical guide lines.
    pub fn scene_height(&self) -> f32 {
        self.scene_height
    }
}

/// Default styling for new entities and exported documents.
///
/// Colors are kept as strings and parsed on access, so an invalid value is
/// reported where it is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    node_fill_color: String,
    connector_color: String,
    text_color: String,
    text_font: String,
    background_color: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            node_fill_color: "white".to_string(),
            connector_color: "black".to_string(),
            text_color: "black".to_string(),
            text_font: "16px sans-serif".to_string(),
            background_color: None,
        }
    }
}

impl StyleConfig {
    /// Returns a copy of this style with the given background color string.
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Returns the fill [`Color`] of newly inserted nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn node_fill_color(&self) -> Result<Color, String> {
        Color::new(&self.node_fill_color)
            .map_err(|err| format!("Invalid node fill color in config: {err}"))
    }

    /// Returns the [`Color`] of newly drawn connectors.
    pub fn connector_color(&self) -> Result<Color, String> {
        Color::new(&self.connector_color)
            .map_err(|err| format!("Invalid connector color in config: {err}"))
    }

    /// Returns the [`Color`] of newly inserted text labels.
    pub fn text_color(&self) -> Result<Color, String> {
        Color::new(&self.text_color).map_err(|err| format!("Invalid text color in config: {err}"))
    }

    /// Returns the CSS font shorthand of newly inserted text labels.
    pub fn text_font(&self) -> &str {
        &self.text_font
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}
