//! Merrow - turns mermaid-style diagram definitions into SVG.
//!
//! The [`Merrow`] orchestrator classifies a definition, parses it with the
//! grammar registered for its kind, draws it into a temporary surface of a
//! [`Scene`] and hands back self-contained markup.
//!
//! # Examples
//!
//! ```rust
//! use merrow::{Merrow, RenderOutcome, RenderRequest};
//! use merrow::scene::{DocumentLocation, Scene};
//!
//! let mut merrow = Merrow::with_scene(Scene::new(DocumentLocation::default()));
//!
//! let mut captured = String::new();
//! let request = RenderRequest::new("graph1", "graph TD\n  a[Start] --> b[Done]")
//!     .with_callback(|markup, _bindings| captured = markup.to_string());
//! let outcome = merrow.render(request).expect("renders");
//!
//! assert!(matches!(outcome, RenderOutcome::Rendered { .. }));
//! assert!(captured.starts_with("<svg"));
//! ```

pub mod config;

mod dispatch;
mod error;
mod export;
mod layout;
mod page;
mod registry;
mod render;

pub use merrow_core::{draw, geometry, identifier, kind, scene, semantic};
pub use merrow_parser::error as diagnostics;

pub use error::{MerrowError, RenderError};
pub use export::rewrite_fragment_urls;
pub use registry::{DiagramEntry, entries, entry, parse_diagram};
pub use render::{Bindings, DiagramRenderer};

use std::fmt;

use log::{debug, error, info, trace, warn};
use toml::Table;

use merrow_core::{kind::DiagramKind, scene::Scene};
use merrow_parser::error::ParseError;

use config::Configuration;

/// Returns the library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Receives the serialized markup and interaction bindings of one render.
pub type RenderCallback<'a> = Box<dyn FnOnce(&str, &Bindings) + 'a>;

type ParseErrorHandler = Box<dyn Fn(&ParseError, &str)>;

/// One diagram to render.
pub struct RenderRequest<'a> {
    id: &'a str,
    text: &'a str,
    callback: Option<RenderCallback<'a>>,
    container: Option<&'a str>,
}

impl<'a> RenderRequest<'a> {
    /// Creates a request drawing `text` into a graphic with id `id`.
    pub fn new(id: &'a str, text: &'a str) -> Self {
        Self {
            id,
            text,
            callback: None,
            container: None,
        }
    }

    /// Sets the function receiving the markup and bindings.
    pub fn with_callback(mut self, callback: impl FnOnce(&str, &Bindings) + 'a) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Attaches the scratch surface under the anchor `container` instead of
    /// the scene root.
    pub fn with_container(mut self, container: &'a str) -> Self {
        self.container = Some(container);
        self
    }

    pub fn id(&self) -> &str {
        self.id
    }

    pub fn text(&self) -> &str {
        self.text
    }
}

impl fmt::Debug for RenderRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRequest")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("callback", &self.callback.is_some())
            .field("container", &self.container)
            .finish()
    }
}

/// How a render call ended when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The diagram was drawn and serialized.
    Rendered {
        kind: DiagramKind,
        markup: String,
        bindings: Bindings,
    },
    /// No grammar claims the text. Nothing was drawn.
    Unrecognized,
    /// No scene is attached, so there is nowhere to draw.
    Declined,
}

/// The diagram orchestrator.
///
/// Owns the configuration and, when running inside a document, the
/// [`Scene`] diagrams are drawn into. All operations take `&mut self`, so
/// render calls never overlap.
#[derive(Default)]
pub struct Merrow {
    config: Configuration,
    scene: Option<Scene>,
    parse_error_handler: Option<ParseErrorHandler>,
    charts_rendered: usize,
}

impl Merrow {
    /// Creates a headless orchestrator with the default configuration.
    ///
    /// Headless orchestrators can classify and parse, but decline to render.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an orchestrator drawing into `scene`.
    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene: Some(scene),
            ..Self::default()
        }
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Detaches and returns the scene, leaving the orchestrator headless.
    pub fn take_scene(&mut self) -> Option<Scene> {
        self.scene.take()
    }

    /// Merges `overrides` into the configuration.
    ///
    /// A `logLevel` in the merged configuration becomes the global log
    /// level.
    pub fn initialize(&mut self, overrides: &Table) {
        self.config.merge(overrides);
        if let Some(level) = self.config.log_level() {
            debug!(level:%; "Applying configured log level");
            log::set_max_level(level);
        }
    }

    /// Same as [`Merrow::initialize`].
    pub fn set_configuration(&mut self, overrides: &Table) {
        self.initialize(overrides);
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Classifies `text` by its leading keyword.
    pub fn detect_type(&self, text: &str) -> Option<DiagramKind> {
        merrow_parser::detect_type(text)
    }

    /// Checks whether `text` is a valid definition of a known kind.
    ///
    /// Grammar failures are passed to [`Merrow::parse_error`].
    pub fn parse(&self, text: &str) -> bool {
        let Some(kind) = self.detect_type(text) else {
            debug!("Definition matches no known diagram type");
            return false;
        };

        match registry::parse_diagram(text, kind) {
            Ok(_) => true,
            Err(err) => {
                self.parse_error(&err, text);
                false
            }
        }
    }

    /// Reports a grammar failure to the registered handler, or logs it.
    pub fn parse_error(&self, err: &ParseError, context: &str) {
        match &self.parse_error_handler {
            Some(handler) => handler(err, context),
            None => error!(err:%; "Failed to parse diagram definition"),
        }
    }

    /// Registers the function receiving grammar failures.
    pub fn set_parse_error_handler(&mut self, handler: impl Fn(&ParseError, &str) + 'static) {
        self.parse_error_handler = Some(Box::new(handler));
    }

    /// Renders one diagram.
    ///
    /// The callback, if any, receives the markup before this returns. Text no
    /// grammar claims yields [`RenderOutcome::Unrecognized`] and the callback
    /// receives empty markup.
    ///
    /// # Errors
    ///
    /// - [`MerrowError::Parse`] when the definition does not parse.
    /// - [`MerrowError::Render`] when the renderer fails.
    /// - [`MerrowError::Scene`] for an unknown container or a duplicate id.
    ///
    /// The callback is not invoked on error.
    pub fn render(&mut self, request: RenderRequest<'_>) -> Result<RenderOutcome, MerrowError> {
        let RenderRequest {
            id,
            text,
            callback,
            container,
        } = request;

        let Some(scene) = self.scene.as_mut() else {
            warn!(id; "No scene attached, declining to render");
            return Ok(RenderOutcome::Declined);
        };

        let Some(kind) = merrow_parser::detect_type(text) else {
            warn!(id; "Definition matches no known diagram type");
            if let Some(callback) = callback {
                callback("", &Bindings::default());
            }
            return Ok(RenderOutcome::Unrecognized);
        };
        trace!(id, kind:%; "Definition classified");

        let (markup, bindings) =
            match dispatch::render(scene, &self.config, id, text, kind, container) {
                Ok(rendered) => rendered,
                Err(err) => {
                    if let MerrowError::Parse { err: parse_err, .. } = &err {
                        self.parse_error(parse_err, text);
                    }
                    return Err(err);
                }
            };

        match callback {
            Some(callback) => callback(&markup, &bindings),
            None => warn!(id; "No callback given, rendered markup is only returned"),
        }

        Ok(RenderOutcome::Rendered {
            kind,
            markup,
            bindings,
        })
    }

    /// Renders every unprocessed definition block of the scene.
    ///
    /// Blocks get the ids `merrowChart0`, `merrowChart1`, ... in the order
    /// they are rendered. Blocks no grammar claims are marked processed with
    /// empty content. A block that fails is left unprocessed and the
    /// remaining blocks are still rendered.
    ///
    /// Returns the number of diagrams rendered.
    pub fn init(&mut self) -> usize {
        let Some(scene) = self.scene.as_ref() else {
            warn!("No scene attached, nothing to initialise");
            return 0;
        };

        let pending: Vec<(usize, String)> = scene
            .blocks()
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.is_processed())
            .map(|(index, block)| (index, page::decode_definition(block.text())))
            .collect();
        info!(blocks = pending.len(); "Initialising embedded diagrams");

        let mut rendered = 0;
        for (index, text) in pending {
            let id = page::chart_id(self.charts_rendered);
            self.charts_rendered += 1;

            let markup = match self.render(RenderRequest::new(&id, &text)) {
                Ok(RenderOutcome::Rendered { markup, .. }) => {
                    rendered += 1;
                    markup
                }
                Ok(_) => String::new(),
                Err(err) => {
                    error!(id = id.as_str(), err:%; "Failed to render embedded diagram");
                    continue;
                }
            };

            if let Some(scene) = self.scene.as_mut() {
                scene.complete_block(index, &id, markup);
            }
        }

        rendered
    }

    /// Runs [`Merrow::init`] when `startOnLoad` is set.
    pub fn content_loaded(&mut self) -> usize {
        if self.config.start_on_load() {
            self.init()
        } else {
            debug!("startOnLoad is off, skipping initialisation");
            0
        }
    }
}

impl fmt::Debug for Merrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merrow")
            .field("config", &self.config)
            .field("scene", &self.scene)
            .field("parse_error_handler", &self.parse_error_handler.is_some())
            .field("charts_rendered", &self.charts_rendered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use merrow_core::scene::DocumentLocation;

    use super::*;

    fn merrow() -> Merrow {
        Merrow::with_scene(Scene::new(DocumentLocation::new(
            "http:",
            "localhost:9000",
            "/page.html",
            "",
        )))
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_headless_declines() {
        let mut merrow = Merrow::new();
        let outcome = merrow
            .render(RenderRequest::new("g", "graph TD\na-->b"))
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Declined);
        assert!(merrow.parse("graph TD\na-->b"));
    }

    #[test]
    fn test_unrecognized_calls_back_with_empty_markup() {
        let mut merrow = merrow();
        let mut received = None;
        let outcome = merrow
            .render(
                RenderRequest::new("g", "pie\n\"a\": 1")
                    .with_callback(|markup, _| received = Some(markup.to_string())),
            )
            .unwrap();

        assert_eq!(outcome, RenderOutcome::Unrecognized);
        assert_eq!(received.as_deref(), Some(""));
        assert_eq!(merrow.scene().unwrap().surface_count(), 0);
    }

    #[test]
    fn test_parse_error_handler_receives_failures() {
        let mut merrow = merrow();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        merrow.set_parse_error_handler(move |err, context| {
            sink.borrow_mut().push((err.to_string(), context.to_string()));
        });

        assert!(!merrow.parse("graph TB\na--"));
        let err = merrow
            .render(RenderRequest::new("g", "graph TB\na--"))
            .unwrap_err();

        assert!(matches!(err, MerrowError::Parse { .. }));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, "graph TB\na--");
    }

    #[test]
    fn test_callback_not_invoked_on_failure() {
        let mut merrow = merrow();
        let mut called = false;
        let result = merrow.render(
            RenderRequest::new("g", "graph TD\na--").with_callback(|_, _| called = true),
        );

        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn test_initialize_applies_log_level() {
        let mut merrow = Merrow::new();
        merrow.initialize(&Configuration::parse_overrides("logLevel = 2").unwrap());
        assert_eq!(log::max_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_init_renders_pending_blocks() {
        let mut merrow = merrow();
        let scene = merrow.scene_mut().unwrap();
        scene.add_block("graph TD\n  a--&gt;b");
        scene.add_block("not a diagram");
        scene.add_block("info");

        assert_eq!(merrow.init(), 2);

        let blocks = merrow.scene().unwrap().blocks();
        assert!(blocks.iter().all(|block| block.is_processed()));
        assert_eq!(blocks[0].id(), Some("merrowChart0"));
        assert!(blocks[0].markup().unwrap().contains(r#"id="merrowChart0""#));
        assert_eq!(blocks[1].markup(), Some(""));
        assert_eq!(blocks[2].id(), Some("merrowChart2"));

        assert_eq!(merrow.init(), 0);
    }

    #[test]
    fn test_init_continues_past_failures() {
        let mut merrow = merrow();
        let scene = merrow.scene_mut().unwrap();
        scene.add_block("graph TD\na--");
        scene.add_block("info");

        assert_eq!(merrow.init(), 1);
        let blocks = merrow.scene().unwrap().blocks();
        assert!(!blocks[0].is_processed());
        assert!(blocks[1].is_processed());
    }

    #[test]
    fn test_content_loaded_follows_start_on_load() {
        let mut merrow = merrow();
        merrow.scene_mut().unwrap().add_block("info");
        merrow.initialize(&Configuration::parse_overrides("startOnLoad = false").unwrap());
        assert_eq!(merrow.content_loaded(), 0);

        merrow.initialize(&Configuration::parse_overrides("startOnLoad = true").unwrap());
        assert_eq!(merrow.content_loaded(), 1);
    }
}
