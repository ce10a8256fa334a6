//! The configuration store.
//!
//! A [`Configuration`] is a TOML table at most two levels deep. Level one
//! holds global flags (`cloneCssStyles`, `startOnLoad`, `logLevel`) and one
//! namespace table per diagram type (`flowchart`, `sequenceDiagram`,
//! `gantt`). Level two holds the settings of a namespace.
//!
//! Overrides are merged key by key: a namespace in the overrides never
//! replaces the stored namespace wholesale, it only updates the keys it
//! names.
//!
//! # Example
//!
//! ```
//! # use merrow::config::Configuration;
//! let mut config = Configuration::default();
//! let overrides = Configuration::parse_overrides("[flowchart]\nhtmlLabels = false").unwrap();
//! config.merge(&overrides);
//!
//! assert!(!config.flowchart().html_labels());
//! assert!(config.flowchart().use_max_width());
//! ```
//!
//! Typed views such as [`SequenceConfig`] deserialize a namespace with serde.
//! A namespace holding a value of the wrong type yields the defaults and a
//! warning instead of an error.

use log::{LevelFilter, debug, warn};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use toml::{Table, Value};

/// Global key that turns CSS cloning on.
pub const CLONE_CSS_STYLES: &str = "cloneCssStyles";
/// Global key that makes [`content_loaded`](crate::Merrow::content_loaded) render.
pub const START_ON_LOAD: &str = "startOnLoad";
/// Global key selecting the log level, `1` (debug) to `5` (fatal).
pub const LOG_LEVEL: &str = "logLevel";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Effective configuration of one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    table: Table,
}

impl Configuration {
    /// Parses TOML text into an overrides table for [`Configuration::merge`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when `text` is not valid TOML.
    pub fn parse_overrides(text: &str) -> Result<Table, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The whole effective configuration.
    pub fn resolve(&self) -> &Table {
        &self.table
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.table.get(key)
    }

    /// Returns the namespace table stored under `name`, if any.
    pub fn namespace(&self, name: &str) -> Option<&Table> {
        self.table.get(name).and_then(Value::as_table)
    }

    /// Merges `overrides` into the configuration.
    ///
    /// For every level-one key: a table merges each of its keys into the
    /// namespace of the same name, creating the namespace if missing; any
    /// other value replaces the stored value. Keys not named by `overrides`
    /// keep their values.
    pub fn merge(&mut self, overrides: &Table) {
        for (key, value) in overrides {
            match value {
                Value::Table(entries) => {
                    let slot = self
                        .table
                        .entry(key.clone())
                        .or_insert_with(|| Value::Table(Table::new()));
                    if !slot.is_table() {
                        debug!(key = key.as_str(); "Replacing global value with a namespace");
                        *slot = Value::Table(Table::new());
                    }
                    if let Value::Table(namespace) = slot {
                        for (setting, setting_value) in entries {
                            if !is_known(Some(key), setting) {
                                debug!(namespace = key.as_str(), key = setting.as_str(); "Unknown configuration key");
                            }
                            namespace.insert(setting.clone(), setting_value.clone());
                        }
                    }
                }
                scalar => {
                    if !is_known(None, key) {
                        debug!(key = key.as_str(); "Unknown configuration key");
                    }
                    self.table.insert(key.clone(), scalar.clone());
                }
            }
        }
    }

    pub fn clone_css_styles(&self) -> bool {
        self.flag(CLONE_CSS_STYLES, true)
    }

    pub fn start_on_load(&self) -> bool {
        self.flag(START_ON_LOAD, true)
    }

    /// Maps `logLevel` onto a [`LevelFilter`].
    ///
    /// Accepts `1` (debug) through `5` (fatal, treated as error) or a level
    /// name such as `"warn"`. Returns `None` when unset or unusable.
    pub fn log_level(&self) -> Option<LevelFilter> {
        match self.table.get(LOG_LEVEL)? {
            Value::Integer(1) => Some(LevelFilter::Debug),
            Value::Integer(2) => Some(LevelFilter::Info),
            Value::Integer(3) => Some(LevelFilter::Warn),
            Value::Integer(4 | 5) => Some(LevelFilter::Error),
            Value::String(name) if name.eq_ignore_ascii_case("fatal") => Some(LevelFilter::Error),
            Value::String(name) => name.parse().ok(),
            other => {
                warn!(value:% = other; "Ignoring unusable logLevel");
                None
            }
        }
    }

    pub fn flowchart(&self) -> FlowchartConfig {
        FlowchartConfig::from_namespace(self.namespace("flowchart"))
    }

    pub fn sequence(&self) -> SequenceConfig {
        SequenceConfig::from_namespace(self.namespace("sequenceDiagram"))
    }

    pub fn gantt(&self) -> GanttConfig {
        GanttConfig::from_namespace(self.namespace("gantt"))
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.table.get(key) {
            Some(Value::Boolean(value)) => *value,
            Some(other) => {
                warn!(key, value:% = other; "Expected a boolean, using the default");
                default
            }
            None => default,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            table: default_table(),
        }
    }
}

/// Returns `true` for keys that appear in the defaults (or `logLevel`).
fn is_known(namespace: Option<&str>, key: &str) -> bool {
    let defaults = default_table();
    match namespace {
        None => key == LOG_LEVEL || defaults.contains_key(key),
        Some(namespace) => defaults
            .get(namespace)
            .and_then(Value::as_table)
            .is_some_and(|table| table.contains_key(key)),
    }
}

fn table<const N: usize>(entries: [(&str, Value); N]) -> Table {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn default_table() -> Table {
    let axis_formatter = [
        ("%I:%M", "hour"),
        ("w. %U", "week"),
        ("%a %d", "day"),
        ("%b %d", "day"),
        ("%m-%y", "month"),
    ]
    .into_iter()
    .map(|(format, granularity)| {
        Value::Array(vec![
            Value::String(format.to_string()),
            Value::String(granularity.to_string()),
        ])
    })
    .collect();

    table([
        (CLONE_CSS_STYLES, Value::Boolean(true)),
        (START_ON_LOAD, Value::Boolean(true)),
        (
            "flowchart",
            Value::Table(table([
                ("htmlLabels", Value::Boolean(true)),
                ("useMaxWidth", Value::Boolean(true)),
            ])),
        ),
        (
            "sequenceDiagram",
            Value::Table(table([
                ("diagramMarginX", Value::Integer(50)),
                ("diagramMarginY", Value::Integer(10)),
                ("actorMargin", Value::Integer(50)),
                ("width", Value::Integer(150)),
                ("height", Value::Integer(65)),
                ("boxMargin", Value::Integer(10)),
                ("boxTextMargin", Value::Integer(5)),
                ("noteMargin", Value::Integer(10)),
                ("messageMargin", Value::Integer(40)),
                ("mirrorActors", Value::Boolean(false)),
                ("bottomMarginAdj", Value::Integer(1)),
                ("useMaxWidth", Value::Boolean(true)),
            ])),
        ),
        (
            "gantt",
            Value::Table(table([
                ("titleTopMargin", Value::Integer(25)),
                ("barHeight", Value::Integer(20)),
                ("barGap", Value::Integer(4)),
                ("topPadding", Value::Integer(50)),
                ("sidePadding", Value::Integer(75)),
                ("gridLineStartPadding", Value::Integer(35)),
                ("fontSize", Value::Integer(11)),
                (
                    "fontFamily",
                    Value::String("\"Open-Sans\", \"sans-serif\"".to_string()),
                ),
                ("numberSectionStyles", Value::Integer(3)),
                ("axisFormatter", Value::Array(axis_formatter)),
            ])),
        ),
    ])
}

/// Deserializes a namespace, falling back to `T::default()`.
fn view<T: DeserializeOwned + Default>(name: &str, namespace: Option<&Table>) -> T {
    let Some(namespace) = namespace else {
        return T::default();
    };
    Value::Table(namespace.clone())
        .try_into()
        .unwrap_or_else(|err| {
            warn!(namespace = name, err:%; "Unusable configuration, using defaults");
            T::default()
        })
}

/// Settings of the `flowchart` namespace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowchartConfig {
    html_labels: bool,
    use_max_width: bool,
}

impl FlowchartConfig {
    pub fn from_namespace(namespace: Option<&Table>) -> Self {
        view("flowchart", namespace)
    }

    /// Draw labels as HTML inside `<foreignObject>` instead of SVG text.
    pub fn html_labels(&self) -> bool {
        self.html_labels
    }

    /// Let the graphic shrink to its container instead of fixing its size.
    pub fn use_max_width(&self) -> bool {
        self.use_max_width
    }
}

impl Default for FlowchartConfig {
    fn default() -> Self {
        Self {
            html_labels: true,
            use_max_width: true,
        }
    }
}

/// Settings of the `sequenceDiagram` namespace. Lengths are in pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SequenceConfig {
    diagram_margin_x: f32,
    diagram_margin_y: f32,
    actor_margin: f32,
    width: f32,
    height: f32,
    box_margin: f32,
    box_text_margin: f32,
    note_margin: f32,
    message_margin: f32,
    mirror_actors: bool,
    bottom_margin_adj: f32,
    use_max_width: bool,
}

impl SequenceConfig {
    pub fn from_namespace(namespace: Option<&Table>) -> Self {
        view("sequenceDiagram", namespace)
    }

    pub fn diagram_margin_x(&self) -> f32 {
        self.diagram_margin_x
    }

    pub fn diagram_margin_y(&self) -> f32 {
        self.diagram_margin_y
    }

    /// Horizontal gap between actor boxes.
    pub fn actor_margin(&self) -> f32 {
        self.actor_margin
    }

    /// Actor box width.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Actor box height.
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn box_margin(&self) -> f32 {
        self.box_margin
    }

    pub fn box_text_margin(&self) -> f32 {
        self.box_text_margin
    }

    pub fn note_margin(&self) -> f32 {
        self.note_margin
    }

    /// Vertical distance between consecutive messages.
    pub fn message_margin(&self) -> f32 {
        self.message_margin
    }

    /// Repeat the actor boxes below the lifelines.
    pub fn mirror_actors(&self) -> bool {
        self.mirror_actors
    }

    pub fn bottom_margin_adj(&self) -> f32 {
        self.bottom_margin_adj
    }

    pub fn use_max_width(&self) -> bool {
        self.use_max_width
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            diagram_margin_x: 50.0,
            diagram_margin_y: 10.0,
            actor_margin: 50.0,
            width: 150.0,
            height: 65.0,
            box_margin: 10.0,
            box_text_margin: 5.0,
            note_margin: 10.0,
            message_margin: 40.0,
            mirror_actors: false,
            bottom_margin_adj: 1.0,
            use_max_width: true,
        }
    }
}

/// Tick granularity an axis format applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Week,
    Day,
    Month,
}

/// One `[strftime format, granularity]` pair of `axisFormatter`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AxisFormat(String, Granularity);

impl AxisFormat {
    pub fn new(format: impl Into<String>, granularity: Granularity) -> Self {
        Self(format.into(), granularity)
    }

    pub fn format(&self) -> &str {
        &self.0
    }

    pub fn granularity(&self) -> Granularity {
        self.1
    }
}

/// Settings of the `gantt` namespace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GanttConfig {
    title_top_margin: f32,
    bar_height: f32,
    bar_gap: f32,
    top_padding: f32,
    side_padding: f32,
    grid_line_start_padding: f32,
    font_size: f32,
    font_family: String,
    number_section_styles: u32,
    axis_formatter: Vec<AxisFormat>,
}

impl GanttConfig {
    pub fn from_namespace(namespace: Option<&Table>) -> Self {
        view("gantt", namespace)
    }

    pub fn title_top_margin(&self) -> f32 {
        self.title_top_margin
    }

    pub fn bar_height(&self) -> f32 {
        self.bar_height
    }

    pub fn bar_gap(&self) -> f32 {
        self.bar_gap
    }

    pub fn top_padding(&self) -> f32 {
        self.top_padding
    }

    pub fn side_padding(&self) -> f32 {
        self.side_padding
    }

    pub fn grid_line_start_padding(&self) -> f32 {
        self.grid_line_start_padding
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Number of alternating section styles, at least one.
    pub fn number_section_styles(&self) -> u32 {
        self.number_section_styles.max(1)
    }

    pub fn axis_formatter(&self) -> &[AxisFormat] {
        &self.axis_formatter
    }
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            title_top_margin: 25.0,
            bar_height: 20.0,
            bar_gap: 4.0,
            top_padding: 50.0,
            side_padding: 75.0,
            grid_line_start_padding: 35.0,
            font_size: 11.0,
            font_family: "\"Open-Sans\", \"sans-serif\"".to_string(),
            number_section_styles: 3,
            axis_formatter: vec![
                AxisFormat::new("%I:%M", Granularity::Hour),
                AxisFormat::new("w. %U", Granularity::Week),
                AxisFormat::new("%a %d", Granularity::Day),
                AxisFormat::new("%b %d", Granularity::Day),
                AxisFormat::new("%m-%y", Granularity::Month),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(text: &str) -> Table {
        Configuration::parse_overrides(text).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert!(config.clone_css_styles());
        assert!(config.start_on_load());
        assert_eq!(config.log_level(), None);
        assert!(config.namespace("info").is_none());
        assert_eq!(config.sequence(), SequenceConfig::default());
        assert_eq!(config.gantt(), GanttConfig::default());
    }

    #[test]
    fn test_typed_views_match_default_table() {
        let config = Configuration::default();
        assert_eq!(
            FlowchartConfig::from_namespace(config.namespace("flowchart")),
            FlowchartConfig::default()
        );
        assert_eq!(config.gantt().axis_formatter().len(), 5);
        assert_eq!(config.gantt().axis_formatter()[1].format(), "w. %U");
    }

    #[test]
    fn test_merge_keeps_sibling_keys() {
        let mut config = Configuration::default();
        config.merge(&overrides("[flowchart]\nhtmlLabels = false"));

        let flowchart = config.namespace("flowchart").unwrap();
        assert_eq!(flowchart.get("htmlLabels"), Some(&Value::Boolean(false)));
        assert_eq!(flowchart.get("useMaxWidth"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_merge_replaces_scalars() {
        let mut config = Configuration::default();
        config.merge(&overrides("cloneCssStyles = false"));
        assert!(!config.clone_css_styles());
        assert!(config.start_on_load());
    }

    #[test]
    fn test_merge_creates_missing_namespace() {
        let mut config = Configuration::default();
        config.merge(&overrides("[pie]\ntextPosition = 0.5"));
        assert!(config.namespace("pie").is_some());
    }

    #[test]
    fn test_merge_accepts_unknown_keys() {
        let mut config = Configuration::default();
        config.merge(&overrides("theme = \"dark\"\n[gantt]\nbarRadius = 3"));
        assert_eq!(config.get("theme"), Some(&Value::String("dark".to_string())));
        assert_eq!(config.gantt().bar_height(), 20.0);
    }

    #[test]
    fn test_wrong_type_falls_back_to_defaults() {
        let mut config = Configuration::default();
        config.merge(&overrides("[sequenceDiagram]\nwidth = \"wide\""));
        assert_eq!(config.sequence(), SequenceConfig::default());
    }

    #[test]
    fn test_sequence_override() {
        let mut config = Configuration::default();
        config.merge(&overrides("[sequenceDiagram]\nmirrorActors = true\nactorMargin = 20"));
        let sequence = config.sequence();
        assert!(sequence.mirror_actors());
        assert_eq!(sequence.actor_margin(), 20.0);
        assert_eq!(sequence.width(), 150.0);
    }

    #[test]
    fn test_log_levels() {
        let mut config = Configuration::default();
        for (value, expected) in [
            ("1", LevelFilter::Debug),
            ("3", LevelFilter::Warn),
            ("5", LevelFilter::Error),
            ("\"info\"", LevelFilter::Info),
        ] {
            config.merge(&overrides(&format!("logLevel = {value}")));
            assert_eq!(config.log_level(), Some(expected));
        }
    }

    #[test]
    fn test_invalid_overrides() {
        assert!(Configuration::parse_overrides("[flowchart").is_err());
    }
}
