//! Error types for Merrow operations.
//!
//! [`MerrowError`] is what the facade returns. Renderers report failures as
//! [`RenderError`], which the dispatcher converts once the scratch surface
//! has been released.

use std::io;

use thiserror::Error;

use merrow_core::{kind::DiagramKind, scene::SceneError};
use merrow_parser::error::ParseError;

use crate::config::ConfigError;

/// The main error type for Merrow operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the definition text next to the structured
/// diagnostics so callers can point at the offending source spans.
#[derive(Debug, Error)]
pub enum MerrowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Render error: {0}")]
    Render(RenderError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A definition no registered grammar claims, for callers that treat an
    /// [`Unrecognized`](crate::RenderOutcome::Unrecognized) render as a
    /// failure.
    #[error("`{0}` is not a recognised diagram definition")]
    Unrecognized(String),
}

impl MerrowError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// Converts a renderer failure, lifting grammar errors to `Parse`.
    pub(crate) fn from_render(err: RenderError, src: &str) -> Self {
        match err {
            RenderError::Parse(err) => Self::new_parse_error(err, src),
            other => Self::Render(other),
        }
    }
}

/// Failure reported by a [`DiagramRenderer`](crate::render::DiagramRenderer).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{renderer} renderer cannot draw a {found} model")]
    UnexpectedModel {
        renderer: &'static str,
        found: DiagramKind,
    },

    #[error("Layout error: {0}")]
    Layout(String),
}
