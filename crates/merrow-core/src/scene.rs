//! The presentation substrate rendering happens in.
//!
//! A [`Scene`] stands in for the document a diagram is embedded into. It
//! knows the document [`DocumentLocation`] (needed to make fragment URLs
//! absolute), the [`StyleRule`]s of the document's stylesheets, a set of
//! named anchors surfaces can be attached under, and the diagram definition
//! blocks waiting to be rendered.
//!
//! Every render call borrows a [`ScratchSurface`] from the scene. The surface
//! is detached when the guard is dropped, so no exit path can leave it behind.
//!
//! ```
//! use merrow_core::scene::{DocumentLocation, Scene};
//!
//! let mut scene = Scene::new(DocumentLocation::default());
//! {
//!     let surface = scene.attach(None, "graph1").unwrap();
//!     assert_eq!(surface.id(), "graph1");
//! }
//! assert!(!scene.contains_surface("graph1"));
//! ```

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace};
use svg::{Document, node::element as svg_element};
use thiserror::Error;
use url::Url;

use crate::draw::SvgNode;

/// Anchor surfaces are attached under when the caller names none.
pub const ROOT_ANCHOR: &str = "body";

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Errors raised by scene operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("no anchor named `{0}` exists in the scene")]
    UnknownAnchor(String),

    #[error("a scratch surface with id `{0}` is already attached")]
    DuplicateSurface(String),

    #[error("invalid document location `{0}`")]
    InvalidLocation(String),
}

/// Address of the document hosting the scene.
///
/// Mirrors the parts of a URL that fragment rewriting reproduces:
/// `{protocol}//{host}{path}{search}`. The protocol keeps its trailing colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    protocol: String,
    host: String,
    path: String,
    search: String,
}

impl DocumentLocation {
    pub fn new(
        protocol: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        search: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            path: path.into(),
            search: search.into(),
        }
    }

    /// Parses an absolute URL such as `https://example.com/docs/?page=2#top`.
    ///
    /// The URL is normalized the way a browser reports its location: the
    /// scheme and host are lowercased, credentials and default ports are
    /// dropped, and the path and query are percent-encoded. Any fragment is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidLocation`] when `url` is not an absolute
    /// hierarchical URL.
    pub fn parse(url: &str) -> Result<Self, SceneError> {
        let parsed = Url::parse(url).map_err(|err| {
            debug!(url, err:%; "Rejected document location");
            SceneError::InvalidLocation(url.to_string())
        })?;
        if parsed.cannot_be_a_base() {
            return Err(SceneError::InvalidLocation(url.to_string()));
        }

        Ok(Self::from(&parsed))
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns `{protocol}//{host}{path}{search}`, the prefix placed in front
    /// of `#fragment` references.
    pub fn base(&self) -> String {
        format!(
            "{}//{}{}{}",
            self.protocol, self.host, self.path, self.search
        )
    }
}

impl From<&Url> for DocumentLocation {
    fn from(url: &Url) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        let search = match url.query() {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        };

        Self::new(format!("{}:", url.scheme()), host, url.path(), search)
    }
}

impl Default for DocumentLocation {
    fn default() -> Self {
        Self::new("about:", "", "blank", "")
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base())
    }
}

/// One rule of a document stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    selector: String,
    declarations: String,
}

impl StyleRule {
    pub fn new(selector: impl Into<String>, declarations: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: declarations.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn declarations(&self) -> &str {
        &self.declarations
    }

    /// Returns the rule as CSS text, `selector { declarations }`.
    pub fn css_text(&self) -> String {
        format!("{} {{ {} }}", self.selector, self.declarations)
    }
}

/// A diagram definition embedded in the document, waiting to be rendered.
#[derive(Debug, Clone)]
pub struct DefinitionBlock {
    text: String,
    id: Option<String>,
    markup: Option<String>,
}

impl DefinitionBlock {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Id assigned when the block was rendered.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Rendered markup that replaced the definition text.
    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    pub fn is_processed(&self) -> bool {
        self.markup.is_some()
    }
}

/// The document surfaces are attached to.
#[derive(Debug)]
pub struct Scene {
    location: DocumentLocation,
    style_rules: Vec<StyleRule>,
    anchors: IndexMap<String, Vec<String>>,
    blocks: Vec<DefinitionBlock>,
}

impl Scene {
    /// Creates a scene with only the root anchor.
    pub fn new(location: DocumentLocation) -> Self {
        let mut anchors = IndexMap::new();
        anchors.insert(ROOT_ANCHOR.to_string(), Vec::new());

        Self {
            location,
            style_rules: Vec::new(),
            anchors,
            blocks: Vec::new(),
        }
    }

    pub fn location(&self) -> &DocumentLocation {
        &self.location
    }

    /// Adds a named element surfaces can be attached under.
    pub fn add_anchor(&mut self, name: &str) {
        self.anchors
            .entry(normalize_anchor(name).to_string())
            .or_default();
    }

    pub fn add_style_rule(&mut self, rule: StyleRule) {
        self.style_rules.push(rule);
    }

    pub fn style_rules(&self) -> &[StyleRule] {
        &self.style_rules
    }

    /// Embeds a diagram definition; returns its index.
    pub fn add_block(&mut self, text: impl Into<String>) -> usize {
        self.blocks.push(DefinitionBlock {
            text: text.into(),
            id: None,
            markup: None,
        });
        self.blocks.len() - 1
    }

    pub fn blocks(&self) -> &[DefinitionBlock] {
        &self.blocks
    }

    /// Replaces the content of block `index` with rendered markup.
    pub fn complete_block(&mut self, index: usize, id: &str, markup: String) {
        if let Some(block) = self.blocks.get_mut(index) {
            block.id = Some(id.to_string());
            block.markup = Some(markup);
        }
    }

    /// Returns `true` while a surface for `id` is attached anywhere.
    pub fn contains_surface(&self, id: &str) -> bool {
        let wrapper = wrapper_id(id);
        self.anchors.values().flatten().any(|w| *w == wrapper)
    }

    /// Returns the number of surfaces currently attached.
    pub fn surface_count(&self) -> usize {
        self.anchors.values().map(Vec::len).sum()
    }

    /// Attaches a scratch surface for `id` under `anchor` (or the root).
    ///
    /// `anchor` may be given as `name` or `#name`.
    ///
    /// # Errors
    ///
    /// - [`SceneError::UnknownAnchor`] if the anchor does not exist.
    /// - [`SceneError::DuplicateSurface`] if a surface for `id` is attached.
    pub fn attach(
        &mut self,
        anchor: Option<&str>,
        id: &str,
    ) -> Result<ScratchSurface<'_>, SceneError> {
        let anchor = normalize_anchor(anchor.unwrap_or(ROOT_ANCHOR)).to_string();
        if !self.anchors.contains_key(&anchor) {
            return Err(SceneError::UnknownAnchor(anchor));
        }
        if self.contains_surface(id) {
            return Err(SceneError::DuplicateSurface(id.to_string()));
        }

        let wrapper = wrapper_id(id);
        self.anchors
            .entry(anchor.clone())
            .or_default()
            .push(wrapper.clone());
        debug!(anchor = anchor, surface = wrapper; "Scratch surface attached");

        Ok(ScratchSurface {
            scene: self,
            anchor,
            wrapper,
            drawing: Drawing::new(id),
        })
    }

    fn detach(&mut self, anchor: &str, wrapper: &str) {
        if let Some(surfaces) = self.anchors.get_mut(anchor) {
            surfaces.retain(|w| w != wrapper);
        }
        debug!(anchor = anchor, surface = wrapper; "Scratch surface detached");
    }
}

fn normalize_anchor(name: &str) -> &str {
    name.trim().trim_start_matches('#')
}

fn wrapper_id(id: &str) -> String {
    format!("d{id}")
}

/// The `<svg>` element a renderer draws into.
#[derive(Debug)]
struct Drawing {
    attributes: IndexMap<String, String>,
    embedded_style: Option<String>,
    children: Vec<SvgNode>,
}

impl Drawing {
    fn new(id: &str) -> Self {
        let mut attributes = IndexMap::new();
        attributes.insert("id".to_string(), id.to_string());
        attributes.insert("width".to_string(), "100%".to_string());
        attributes.insert("xmlns".to_string(), SVG_NAMESPACE.to_string());

        Self {
            attributes,
            embedded_style: None,
            children: Vec::new(),
        }
    }

    fn to_markup(&self) -> String {
        let mut document = Document::new();
        for (name, value) in &self.attributes {
            document = document.set(name.as_str(), value.as_str());
        }
        if let Some(css) = &self.embedded_style {
            document = document.add(
                svg_element::Style::new(css.as_str())
                    .set("type", "text/css")
                    .set("title", "merrow-svg-internal-css"),
            );
        }
        for child in &self.children {
            document = document.add(child.clone());
        }
        document.to_string()
    }
}

/// A temporary drawing surface owned by a single render call.
///
/// Holds the scene mutably for its whole lifetime and detaches itself on
/// drop.
pub struct ScratchSurface<'s> {
    scene: &'s mut Scene,
    anchor: String,
    wrapper: String,
    drawing: Drawing,
}

impl ScratchSurface<'_> {
    /// Returns the caller-supplied id, which is also the `<svg>` element id.
    pub fn id(&self) -> &str {
        self.drawing
            .attributes
            .get("id")
            .map_or("", String::as_str)
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn location(&self) -> &DocumentLocation {
        self.scene.location()
    }

    pub fn style_rules(&self) -> &[StyleRule] {
        self.scene.style_rules()
    }

    /// Sets an attribute on the `<svg>` element.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.drawing
            .attributes
            .insert(name.to_string(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.drawing.attributes.get(name).map(String::as_str)
    }

    /// Appends a child node to the `<svg>` element.
    pub fn append(&mut self, node: impl Into<SvgNode>) {
        self.drawing.children.push(node.into());
    }

    /// Appends every group of a rendered layer stack.
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = SvgNode>) {
        self.drawing.children.extend(nodes);
    }

    /// Places a `<style>` element as the first child of the `<svg>` element.
    pub fn set_embedded_style(&mut self, css: impl Into<String>) {
        self.drawing.embedded_style = Some(css.into());
    }

    pub fn is_empty(&self) -> bool {
        self.drawing.children.is_empty()
    }

    /// Serializes the `<svg>` element and everything drawn into it.
    pub fn markup(&self) -> String {
        let markup = self.drawing.to_markup();
        trace!(surface = self.wrapper, bytes = markup.len(); "Surface serialized");
        markup
    }
}

impl fmt::Debug for ScratchSurface<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchSurface")
            .field("anchor", &self.anchor)
            .field("wrapper", &self.wrapper)
            .field("drawing", &self.drawing)
            .finish()
    }
}

impl Drop for ScratchSurface<'_> {
    fn drop(&mut self) {
        self.scene.detach(&self.anchor, &self.wrapper);
    }
}
