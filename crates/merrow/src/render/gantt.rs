//! Gantt chart renderer.
//!
//! One row per task in source order. Time maps linearly onto a fixed-width
//! chart between the side paddings, and the grid picks its tick interval
//! from the total time range.

use std::fmt::Write as _;

use chrono::{Months, NaiveDateTime, TimeDelta, Timelike};
use log::{debug, warn};
use svg::node::element as svg_element;
use toml::Table;

use merrow_core::{
    apply_stroke,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition},
    geometry::{Bounds, Point},
    kind::DiagramKind,
    scene::ScratchSurface,
    semantic::{Diagram, GanttModel, Task, TaskStatus},
};

use super::{Bindings, DiagramRenderer, finish_surface, fragment_url, label_text};
use crate::{
    config::{GanttConfig, Granularity},
    error::RenderError,
    registry::parse_diagram,
};

/// Chart width; the graphic scales to its container from here.
const CHART_WIDTH: f32 = 1200.0;
const MAX_TICKS: usize = 200;
const FALLBACK_TICK_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default)]
pub struct GanttRenderer {
    config: GanttConfig,
}

impl GanttRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn row_top(&self, row: usize) -> f32 {
        self.config.top_padding() + row as f32 * (self.config.bar_height() + self.config.bar_gap())
    }

    fn draw_sections(&self, model: &GanttModel, output: &mut LayeredOutput) {
        let styles = self.config.number_section_styles() as usize;
        let row_height = self.config.bar_height() + self.config.bar_gap();

        for (row, task) in model.tasks().iter().enumerate() {
            let stripe = svg_element::Rectangle::new()
                .set("class", format!("section section{}", task.section() % styles))
                .set("x", 0)
                .set("y", self.row_top(row) - self.config.bar_gap() / 2.0)
                .set("width", CHART_WIDTH)
                .set("height", row_height);
            output.add_to_layer(RenderLayer::Background, Box::new(stripe));
        }

        for (index, name) in model.sections().iter().enumerate() {
            let rows: Vec<usize> = model
                .tasks()
                .iter()
                .enumerate()
                .filter(|(_, task)| task.section() == index)
                .map(|(row, _)| row)
                .collect();
            let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            let middle =
                (self.row_top(*first) + self.row_top(*last) + self.config.bar_height()) / 2.0;
            let title = svg_element::Text::new(name.as_str())
                .set("class", format!("sectionTitle sectionTitle{}", index % styles))
                .set("x", 10)
                .set("y", middle)
                .set("dominant-baseline", "central")
                .set("font-size", self.config.font_size());
            output.add_to_layer(RenderLayer::Text, Box::new(title));
        }
    }

    fn draw_task(
        &self,
        row: usize,
        task: &Task,
        scale: &TimeScale,
        clip: &str,
        output: &mut LayeredOutput,
    ) {
        let left = scale.x(task.start());
        let right = scale.x(task.end());
        let top = self.row_top(row);
        let styles = self.config.number_section_styles() as usize;

        let mut class = format!("task task{}", task.section() % styles);
        match task.status() {
            TaskStatus::Active => class.push_str(" active"),
            TaskStatus::Done => class.push_str(" done"),
            TaskStatus::Pending => {}
        }
        if task.is_critical() {
            class.push_str(" crit");
        }

        let bar = svg_element::Rectangle::new()
            .set("id", task.id())
            .set("class", class)
            .set("x", left)
            .set("y", top)
            .set("width", (right - left).max(0.0))
            .set("height", self.config.bar_height())
            .set("rx", 3)
            .set("ry", 3)
            .set("clip-path", clip);
        output.add_to_layer(RenderLayer::Content, Box::new(bar));

        let text_width = super::estimate_text_width(task.name(), self.config.font_size());
        let middle = top + self.config.bar_height() / 2.0;
        let label = if text_width < right - left {
            let center = Point::new((left + right) / 2.0, middle);
            label_text(task.name(), center, self.config.font_size()).set("class", "taskText")
        } else {
            svg_element::Text::new(task.name())
                .set("class", "taskTextOutsideRight")
                .set("x", right + 5.0)
                .set("y", middle)
                .set("dominant-baseline", "central")
                .set("font-size", self.config.font_size())
        };
        output.add_to_layer(RenderLayer::Text, Box::new(label));
    }

    fn draw_grid(&self, scale: &TimeScale, bottom: f32, output: &mut LayeredOutput) {
        let granularity = scale.granularity();
        let format = self
            .config
            .axis_formatter()
            .iter()
            .find(|format| format.granularity() == granularity)
            .map_or(FALLBACK_TICK_FORMAT, |format| format.format());
        let top = self.config.top_padding() - self.config.bar_gap();
        let stroke = StrokeDefinition::new("lightgrey", 1.0);

        for tick in scale.ticks() {
            let x = scale.x(tick);
            let line = svg_element::Line::new()
                .set("class", "tick")
                .set("x1", x)
                .set("y1", top)
                .set("x2", x)
                .set("y2", bottom);
            output.add_to_layer(RenderLayer::Grid, Box::new(apply_stroke!(line, &stroke)));

            let label = svg_element::Text::new(format_tick(tick, format))
                .set("class", "tickText")
                .set("x", x)
                .set("y", bottom + self.config.grid_line_start_padding() / 2.0)
                .set("text-anchor", "middle")
                .set("font-size", self.config.font_size());
            output.add_to_layer(RenderLayer::Text, Box::new(label));
        }
    }
}

impl DiagramRenderer for GanttRenderer {
    fn set_config(&mut self, namespace: Option<&Table>) {
        self.config = GanttConfig::from_namespace(namespace);
    }

    fn draw(
        &mut self,
        text: &str,
        surface: &mut ScratchSurface<'_>,
        kind: DiagramKind,
    ) -> Result<Bindings, RenderError> {
        let model = match parse_diagram(text, kind)? {
            Diagram::Gantt(model) => model,
            other => {
                return Err(RenderError::UnexpectedModel {
                    renderer: "gantt",
                    found: other.kind(),
                });
            }
        };
        debug!(
            tasks = model.tasks().len(),
            sections = model.sections().len();
            "Drawing gantt chart"
        );

        let rows = model.tasks().len();
        let bottom = self.row_top(rows);
        let height =
            bottom + self.config.grid_line_start_padding() + self.config.top_padding() / 2.0;
        let mut output = LayeredOutput::new();

        if let Some(title) = model.title() {
            let title = label_text(
                title,
                Point::new(CHART_WIDTH / 2.0, self.config.title_top_margin()),
                self.config.font_size() * 1.5,
            )
            .set("class", "titleText");
            output.add_to_layer(RenderLayer::Text, Box::new(title));
        }

        self.draw_sections(&model, &mut output);

        let clip_id = format!("{}-tasks-clip", surface.id());
        let definitions = svg_element::Definitions::new().add(
            svg_element::ClipPath::new().set("id", clip_id.as_str()).add(
                svg_element::Rectangle::new()
                    .set("x", self.config.side_padding())
                    .set("y", 0)
                    .set("width", CHART_WIDTH - 2.0 * self.config.side_padding())
                    .set("height", height),
            ),
        );

        if let Some((start, end)) = model.time_range() {
            let scale = TimeScale::new(
                start,
                end,
                self.config.side_padding(),
                CHART_WIDTH - self.config.side_padding(),
            );
            self.draw_grid(&scale, bottom, &mut output);

            let clip = fragment_url(&clip_id);
            for (row, task) in model.tasks().iter().enumerate() {
                self.draw_task(row, task, &scale, &clip, &mut output);
            }
        }

        let border = svg_element::Rectangle::new()
            .set("class", "chart-border")
            .set("x", 0)
            .set("y", 0)
            .set("width", CHART_WIDTH)
            .set("height", height)
            .set("fill", "none");
        output.add_to_layer(RenderLayer::Background, Box::new(border));

        finish_surface(
            surface,
            Some(definitions),
            output,
            Bounds::new(0.0, 0.0, CHART_WIDTH, height),
            true,
        );
        Ok(Bindings::default())
    }
}

/// Linear mapping from time to the X axis.
#[derive(Debug)]
struct TimeScale {
    start: NaiveDateTime,
    end: NaiveDateTime,
    left: f32,
    right: f32,
}

impl TimeScale {
    fn new(start: NaiveDateTime, end: NaiveDateTime, left: f32, right: f32) -> Self {
        Self {
            start,
            end,
            left,
            right,
        }
    }

    fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    fn x(&self, time: NaiveDateTime) -> f32 {
        let span = self.span().num_seconds().max(1) as f32;
        let offset = (time - self.start).num_seconds() as f32;
        self.left + offset / span * (self.right - self.left)
    }

    fn granularity(&self) -> Granularity {
        let span = self.span();
        if span <= TimeDelta::days(1) {
            Granularity::Hour
        } else if span <= TimeDelta::weeks(2) {
            Granularity::Day
        } else if span <= TimeDelta::weeks(13) {
            Granularity::Week
        } else {
            Granularity::Month
        }
    }

    /// Tick positions covering the range, aligned to the granularity.
    fn ticks(&self) -> Vec<NaiveDateTime> {
        let granularity = self.granularity();
        let midnight = self.start.date().and_time(Default::default());
        let mut tick = match granularity {
            Granularity::Hour => midnight + TimeDelta::hours(i64::from(self.start.hour())),
            Granularity::Day | Granularity::Week | Granularity::Month => midnight,
        };

        let mut ticks = Vec::new();
        while tick <= self.end && ticks.len() < MAX_TICKS {
            if tick >= self.start {
                ticks.push(tick);
            }
            let next = match granularity {
                Granularity::Hour => tick.checked_add_signed(TimeDelta::hours(1)),
                Granularity::Day => tick.checked_add_signed(TimeDelta::days(1)),
                Granularity::Week => tick.checked_add_signed(TimeDelta::weeks(1)),
                Granularity::Month => tick.checked_add_months(Months::new(1)),
            };
            match next {
                Some(next) => tick = next,
                None => break,
            }
        }
        ticks
    }
}

/// Formats a tick label, falling back when `format` is not a valid strftime
/// pattern.
fn format_tick(tick: NaiveDateTime, format: &str) -> String {
    let mut label = String::new();
    if write!(label, "{}", tick.format(format)).is_err() {
        warn!(format; "Invalid axis format, using the default");
        label.clear();
        label.push_str(&tick.format(FALLBACK_TICK_FORMAT).to_string());
    }
    label
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use merrow_core::scene::{DocumentLocation, Scene};

    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn draw(renderer: &mut GanttRenderer, text: &str) -> (Result<Bindings, RenderError>, String) {
        let mut scene = Scene::new(DocumentLocation::default());
        let mut surface = scene.attach(None, "plan").unwrap();
        let result = renderer.draw(text, &mut surface, DiagramKind::Gantt);
        let markup = surface.markup();
        (result, markup)
    }

    const PLAN: &str = "gantt\n\
        dateFormat YYYY-MM-DD\n\
        title Adding GANTT diagram\n\
        section A section\n\
        Completed task :done, des1, 2014-01-06, 2014-01-08\n\
        Active task :active, des2, 2014-01-09, 3d\n\
        section Critical tasks\n\
        Future task :crit, des3, after des2, 5d";

    #[test]
    fn test_draws_bars_and_title() {
        let (result, markup) = draw(&mut GanttRenderer::new(), PLAN);

        assert!(result.unwrap().is_empty());
        assert!(markup.contains("Adding GANTT diagram"));
        assert!(markup.contains("task task0 done"));
        assert!(markup.contains("task task0 active"));
        assert!(markup.contains("task task1 crit"));
        assert!(markup.contains("Critical tasks"));
    }

    #[test]
    fn test_bars_reference_clip_path() {
        let (_, markup) = draw(&mut GanttRenderer::new(), PLAN);

        assert!(markup.contains(r#"id="plan-tasks-clip""#));
        assert!(markup.contains(r#"clip-path="url(#plan-tasks-clip)""#));
    }

    #[test]
    fn test_empty_chart() {
        let (result, markup) = draw(&mut GanttRenderer::new(), "gantt\ntitle Nothing yet");
        assert!(result.is_ok());
        assert!(!markup.contains("class=\"tick\""));
    }

    #[test]
    fn test_scale_maps_range_onto_axis() {
        let scale = TimeScale::new(at(1, 0), at(11, 0), 100.0, 1100.0);
        assert_eq!(scale.x(at(1, 0)), 100.0);
        assert_eq!(scale.x(at(6, 0)), 600.0);
        assert_eq!(scale.x(at(11, 0)), 1100.0);
    }

    #[test]
    fn test_granularity_follows_span() {
        assert_eq!(TimeScale::new(at(1, 0), at(1, 8), 0.0, 1.0).granularity(), Granularity::Hour);
        assert_eq!(TimeScale::new(at(1, 0), at(9, 0), 0.0, 1.0).granularity(), Granularity::Day);
        assert_eq!(TimeScale::new(at(1, 0), at(30, 0), 0.0, 1.0).granularity(), Granularity::Week);
    }

    #[test]
    fn test_daily_ticks() {
        let ticks = TimeScale::new(at(1, 0), at(4, 0), 0.0, 1.0).ticks();
        assert_eq!(ticks, vec![at(1, 0), at(2, 0), at(3, 0), at(4, 0)]);
    }

    #[test]
    fn test_hourly_ticks_start_inside_range() {
        let ticks = TimeScale::new(at(1, 9), at(1, 12), 0.0, 1.0).ticks();
        assert_eq!(ticks.first(), Some(&at(1, 9)));
        assert_eq!(ticks.len(), 4);
    }

    #[test]
    fn test_tick_format() {
        assert_eq!(format_tick(at(6, 0), "%b %d"), "Jan 06");
        assert_eq!(format_tick(at(6, 0), "%Q"), "2014-01-06");
    }
}
