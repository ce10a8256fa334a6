//! The render dispatcher: one classified definition in, packaged markup out.

use log::{debug, info};

use merrow_core::{kind::DiagramKind, scene::Scene};

use crate::{
    config::Configuration,
    error::MerrowError,
    export, registry,
    render::{Bindings, DiagramRenderer},
};

/// Renders `text` of `kind` into a scratch surface for `id` and packages it.
///
/// The surface lives under `container` (or the root anchor) for the duration
/// of the call only; it is detached on every return path.
///
/// # Errors
///
/// - [`MerrowError::Scene`] if the surface cannot be attached.
/// - [`MerrowError::Parse`] if `text` does not parse.
/// - [`MerrowError::Render`] if the renderer fails.
pub(crate) fn render(
    scene: &mut Scene,
    config: &Configuration,
    id: &str,
    text: &str,
    kind: DiagramKind,
    container: Option<&str>,
) -> Result<(String, Bindings), MerrowError> {
    let entry = registry::entry(kind);
    let mut renderer = entry.renderer();
    renderer.set_config(entry.namespace().and_then(|name| config.namespace(name)));

    let target = Target {
        id,
        container,
        clone_css_styles: config.clone_css_styles(),
    };
    draw_and_package(scene, renderer.as_mut(), &target, text, kind)
}

/// Where a render goes and how it is packaged.
struct Target<'a> {
    id: &'a str,
    container: Option<&'a str>,
    clone_css_styles: bool,
}

fn draw_and_package(
    scene: &mut Scene,
    renderer: &mut dyn DiagramRenderer,
    target: &Target<'_>,
    text: &str,
    kind: DiagramKind,
) -> Result<(String, Bindings), MerrowError> {
    let id = target.id;
    let mut surface = scene.attach(target.container, id)?;

    debug!(id, kind:%; "Dispatching to renderer");
    let bindings = renderer
        .draw(text, &mut surface, kind)
        .map_err(|err| MerrowError::from_render(err, text))?;

    if target.clone_css_styles {
        export::embed_styles(&mut surface, renderer.classes().unwrap_or_default());
    }

    let markup = export::serialize(&surface);
    info!(id, kind:%, bytes = markup.len(); "Diagram rendered");
    Ok((markup, bindings))
}

#[cfg(test)]
mod tests {
    use merrow_core::scene::{DocumentLocation, SceneError, ScratchSurface, StyleRule};
    use svg::node::element::Group;
    use toml::Table;

    use super::*;
    use crate::error::RenderError;

    fn scene() -> Scene {
        Scene::new(DocumentLocation::new("http:", "localhost", "/index.html", ""))
    }

    /// Draws a group and then gives up.
    struct StalledRenderer;

    impl DiagramRenderer for StalledRenderer {
        fn set_config(&mut self, _namespace: Option<&Table>) {}

        fn draw(
            &mut self,
            _text: &str,
            surface: &mut ScratchSurface<'_>,
            _kind: DiagramKind,
        ) -> Result<Bindings, RenderError> {
            surface.append(Group::new());
            Err(RenderError::Layout("no room left".to_string()))
        }
    }

    #[test]
    fn test_surface_released_after_success() {
        let mut scene = scene();
        let (markup, _) = render(
            &mut scene,
            &Configuration::default(),
            "ok",
            "graph TD\na-->b",
            DiagramKind::Flowchart,
            None,
        )
        .unwrap();

        assert!(markup.contains(r#"id="ok""#));
        assert!(markup.contains("url(http://localhost/index.html#arrowhead)"));
        assert_eq!(scene.surface_count(), 0);
    }

    #[test]
    fn test_surface_released_after_parse_failure() {
        let mut scene = scene();
        let err = render(
            &mut scene,
            &Configuration::default(),
            "bad",
            "graph TD\na--",
            DiagramKind::Flowchart,
            None,
        )
        .unwrap_err();

        assert!(matches!(err, MerrowError::Parse { .. }));
        assert!(!scene.contains_surface("bad"));
    }

    #[test]
    fn test_surface_released_after_renderer_failure() {
        let mut scene = scene();
        let target = Target {
            id: "stalled",
            container: None,
            clone_css_styles: true,
        };

        let err = draw_and_package(
            &mut scene,
            &mut StalledRenderer,
            &target,
            "info",
            DiagramKind::Info,
        )
        .unwrap_err();

        assert!(matches!(err, MerrowError::Render(RenderError::Layout(_))));
        assert!(!scene.contains_surface("stalled"));
        assert_eq!(scene.surface_count(), 0);
    }

    #[test]
    fn test_unknown_container() {
        let mut scene = scene();
        let err = render(
            &mut scene,
            &Configuration::default(),
            "x",
            "info",
            DiagramKind::Info,
            Some("#missing"),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            MerrowError::Scene(SceneError::UnknownAnchor(_))
        ));
    }

    #[test]
    fn test_named_container() {
        let mut scene = scene();
        scene.add_anchor("holder");
        let result = render(
            &mut scene,
            &Configuration::default(),
            "inside",
            "info",
            DiagramKind::Info,
            Some("#holder"),
        );

        assert!(result.is_ok());
        assert_eq!(scene.surface_count(), 0);
    }

    #[test]
    fn test_css_cloning_follows_configuration() {
        let text = "graph TD\na-->b\nclassDef hot fill:#f00\nclass a hot";
        let mut scene = scene();
        scene.add_style_rule(StyleRule::new(".node", "stroke: blue"));

        let (markup, _) = render(
            &mut scene,
            &Configuration::default(),
            "styled",
            text,
            DiagramKind::Flowchart,
            None,
        )
        .unwrap();
        assert!(markup.contains("#styled .node { stroke: blue }"));
        assert!(markup.contains("#styled .hot"));

        let mut config = Configuration::default();
        config.merge(&Configuration::parse_overrides("cloneCssStyles = false").unwrap());
        let (markup, _) =
            render(&mut scene, &config, "plain", text, DiagramKind::Flowchart, None).unwrap();
        assert!(!markup.contains("<style"));
    }
}
