//! Output packaging for rendered diagrams.
//!
//! The last stage of a render call:
//!
//! ```text
//! Definition text
//!     ↓ detect
//! DiagramKind
//!     ↓ renderer (parse, layout, draw)
//! Scratch surface
//!     ↓ package (this module)
//! Serialized markup
//! ```
//!
//! Packaging optionally clones matching document CSS and class definitions
//! into the graphic (see [`embed_styles`]) and serializes the surface with
//! every `url(#fragment)` reference made absolute (see
//! [`rewrite_fragment_urls`]). Absolute references keep markers and clip
//! paths working when the hosting document sets a `<base>` URL.

mod css;

use log::{debug, trace};

use merrow_core::{
    scene::{DocumentLocation, ScratchSurface},
    semantic::ClassDef,
};

const FRAGMENT_URL: &str = "url(#";

/// Copies the scene rules and class definitions that apply to the drawing
/// into a `<style>` element scoped to the surface id.
///
/// Nothing is embedded when no rule applies.
pub fn embed_styles(surface: &mut ScratchSurface<'_>, classes: &[ClassDef]) {
    let markup = surface.markup();
    let css = css::cloned_css(surface.id(), &markup, surface.style_rules(), classes);
    if css.is_empty() {
        trace!(surface = surface.id(); "No styles to embed");
        return;
    }

    debug!(surface = surface.id(), bytes = css.len(); "Embedding cloned styles");
    surface.set_embedded_style(css);
}

/// Serializes the surface, rewriting fragment references against the
/// document location.
pub fn serialize(surface: &ScratchSurface<'_>) -> String {
    rewrite_fragment_urls(&surface.markup(), surface.location())
}

/// Replaces every `url(#name` with `url({protocol}//{host}{path}{search}#name`.
pub fn rewrite_fragment_urls(markup: &str, location: &DocumentLocation) -> String {
    let count = markup.matches(FRAGMENT_URL).count();
    if count == 0 {
        return markup.to_string();
    }

    let base = escape_attribute(&location.base());
    trace!(count, base = base.as_str(); "Rewriting fragment references");
    markup.replace(FRAGMENT_URL, &format!("url({base}#"))
}

/// Escapes the characters that cannot appear verbatim in an attribute value.
fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
