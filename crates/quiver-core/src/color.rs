//! CSS colors for node fills, connector strokes and label text.
//!
//! [`Color`] is parsed once from a CSS string and stored as a
//! [`DynamicColor`]. Documents and configuration files carry colors as CSS
//! strings, so serialization goes through the same text form as [`Display`].
//!
//! [`Display`]: fmt::Display

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::DynamicColor;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A parsed CSS color. The default is opaque black.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color(DynamicColor);

impl Color {
    /// Parses a CSS color such as `"#ff0000"`, `"rgb(255 0 0 / 50%)"` or `"teal"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quiver_core::color::Color;
    ///
    /// assert!(Color::new("#336699").is_ok());
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(css: &str) -> Result<Self, String> {
        DynamicColor::from_str(css)
            .map(Self)
            .map_err(|err| format!("invalid color `{css}`: {err}"))
    }

    /// Opaque white, the fill of newly inserted nodes.
    pub fn white() -> Self {
        Self::new("white").expect("'white' is a valid CSS color")
    }

    /// Returns this color with its alpha replaced by `alpha`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self(self.0.with_alpha(alpha))
    }

    /// Opacity in `0.0..=1.0`. Exported as `fill-opacity` / `stroke-opacity`.
    pub fn alpha(&self) -> f32 {
        self.0.components[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

// `DynamicColor` holds floats, so equal colors are hashed by their CSS text.
impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.to_string().as_bytes());
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        color.to_string().into()
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let css = String::deserialize(deserializer)?;
        Self::new(&css).map_err(de::Error::custom)
    }
}
