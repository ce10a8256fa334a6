//! Stroke definitions for lines and outlines.
//!
//! A [`StrokeDefinition`] bundles color, width and dash pattern. Apply it to
//! any SVG element with [`apply_stroke!`](crate::apply_stroke!):
//!
//! ```
//! use merrow_core::draw::{StrokeDefinition, StrokeStyle};
//! use svg::node::element::Path;
//!
//! let stroke = StrokeDefinition::new("#333", 1.0).with_style(StrokeStyle::Dotted);
//! let path = merrow_core::apply_stroke!(Path::new().set("d", "M 0 0 L 10 0"), &stroke);
//! assert!(path.to_string().contains("stroke-dasharray"));
//! ```

use std::str::FromStr;

/// Line pattern of a stroke.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// A raw `stroke-dasharray` value.
    Custom(String),
}

impl StrokeStyle {
    /// Returns the `stroke-dasharray` value, or `None` for solid lines.
    pub fn to_svg_value(&self) -> Option<String> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("5,5".to_string()),
            Self::Dotted => Some("3,3".to_string()),
            Self::Custom(pattern) => Some(pattern.clone()),
        }
    }
}

impl FromStr for StrokeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("empty stroke style".to_string()),
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            pattern => Ok(Self::Custom(pattern.to_string())),
        }
    }
}

/// Color, width and pattern of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: String,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    pub fn new(color: impl Into<String>, width: f32) -> Self {
        Self {
            color: color.into(),
            width,
            style: StrokeStyle::Solid,
        }
    }

    pub fn with_style(mut self, style: StrokeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::new("#333", 1.0)
    }
}

/// Sets `stroke`, `stroke-width` and, when patterned, `stroke-dasharray`.
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color())
            .set("stroke-width", $stroke.width());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}
