//! `gantt` grammar.
//!
//! ```text
//! gantt
//!     dateFormat YYYY-MM-DD
//!     title Release plan
//!     section Design
//!     Sketch        :done, des1, 2014-01-06, 2014-01-08
//!     Review        :active, des2, after des1, 3d
//!     section Build
//!     Implement     :crit, 5d
//! ```
//!
//! Task dates are resolved while parsing, so the model only holds absolute
//! start and end times.

use chrono::{
    NaiveDateTime, NaiveTime, TimeDelta,
    format::{self, Parsed, StrftimeItems},
};
use winnow::{
    Parser,
    ascii::{Caseless, digit1, space1},
    combinator::{opt, preceded, terminated},
    error::ModalResult,
    token::{one_of, take_until},
};

use merrow_core::semantic::{Diagram, GanttModel, Task, TaskStatus};

use super::{
    Expected, Input, PResult, Statement, parse_statement, rest_of_line, statements,
};
use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError};

/// `dateFormat` used until the definition sets one.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

/// Parses a `gantt` definition, resolving every task to absolute times.
pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    let stmts = statements(source, 0, false);
    let Some((head, body)) = stmts.split_first() else {
        return Err(Diagnostic::error("definition is empty")
            .with_code(ErrorCode::E001)
            .with_help("start the definition with `gantt`")
            .into());
    };
    parse_statement(head, header)?;

    let mut builder = Builder::new();
    let mut diagnostics = DiagnosticCollector::new();
    for stmt in body {
        let result = match stmt.keyword() {
            "dateFormat" => parse_statement(stmt, setting("dateFormat"))
                .map(|format| builder.model.set_date_format(format)),
            "title" => parse_statement(stmt, setting("title"))
                .map(|title| builder.model.set_title(title)),
            "section" => parse_statement(stmt, setting("section")).map(|name| {
                builder.model.add_section(name);
            }),
            _ => parse_statement(stmt, task_line)
                .and_then(|(name, items)| builder.add_task(stmt, name, items)),
        };
        diagnostics.collect(result);
    }

    diagnostics.finish(builder.model).map(Diagram::Gantt)
}

fn header(input: &mut Input<'_>) -> PResult<()> {
    Caseless("gantt")
        .void()
        .context(
            Expected::new(ErrorCode::E001, "expected a `gantt` header")
                .with_help("start the definition with `gantt`"),
        )
        .parse_next(input)
}

/// `<keyword> <value>` where the value runs to the end of the statement.
fn setting<'a>(keyword: &'static str) -> impl Parser<Input<'a>, &'a str, super::PError> {
    preceded((keyword, space1), rest_of_line.verify(|value: &str| !value.is_empty()))
}

/// `Task name : item, item, ...`
fn task_line<'a>(input: &mut Input<'a>) -> PResult<(&'a str, &'a str)> {
    (
        terminated(take_until(1.., ":"), ':').map(str::trim),
        rest_of_line,
    )
        .verify(|(name, _): &(&str, &str)| !name.is_empty())
        .context(
            Expected::new(ErrorCode::E100, "expected a task")
                .with_help("tasks look like `Name :id, 2014-01-06, 3d`"),
        )
        .parse_next(input)
}

/// Where a task starts.
enum Start<'a> {
    Date(&'a str),
    After(&'a str),
    Previous,
}

struct Builder {
    model: GanttModel,
    task_count: usize,
    previous_end: Option<NaiveDateTime>,
}

impl Builder {
    fn new() -> Self {
        Self {
            model: GanttModel::new(DEFAULT_DATE_FORMAT),
            task_count: 0,
            previous_end: None,
        }
    }

    fn add_task(
        &mut self,
        stmt: &Statement<'_>,
        name: &str,
        items: &str,
    ) -> Result<(), Diagnostic> {
        let mut items: Vec<&str> = items.split(',').map(str::trim).collect();

        let mut status = TaskStatus::Pending;
        let mut critical = false;
        while let Some(first) = items.first().copied() {
            match first {
                "crit" => critical = true,
                "active" => status = TaskStatus::Active,
                "done" => status = TaskStatus::Done,
                _ => break,
            }
            items.remove(0);
        }

        self.task_count += 1;
        let (id, start, end) = match items.as_slice() {
            [end] => (None, Start::Previous, *end),
            [start, end] => (None, start_of(start), *end),
            [id, start, end] => (Some(*id), start_of(start), *end),
            _ => {
                return Err(Diagnostic::error(format!("task `{name}` needs a start and an end"))
                    .with_code(ErrorCode::E101)
                    .with_label(stmt.span, ErrorCode::E101.description())
                    .with_help("write `Name :[id,] <start|after id>, <end|duration>`"));
            }
        };

        let start = self.resolve_start(stmt, start)?;
        let end = self.resolve_end(stmt, start, end)?;

        let section = match self.model.sections().len() {
            0 => self.model.add_section(""),
            n => n - 1,
        };
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| format!("task{}", self.task_count));

        self.model.add_task(
            Task::new(id, name, section, start, end)
                .with_status(status)
                .with_critical(critical),
        );
        self.previous_end = Some(end);
        Ok(())
    }

    fn resolve_start(
        &self,
        stmt: &Statement<'_>,
        start: Start<'_>,
    ) -> Result<NaiveDateTime, Diagnostic> {
        match start {
            Start::Previous => self.previous_end.ok_or_else(|| {
                Diagnostic::error("the first task needs a start date")
                    .with_code(ErrorCode::E200)
                    .with_label(stmt.span, ErrorCode::E200.description())
                    .with_help("give a date such as `2014-01-06` before the duration")
            }),
            Start::After(reference) => self
                .model
                .task(reference)
                .map(Task::end)
                .ok_or_else(|| {
                    Diagnostic::error(format!("no task with id `{reference}`"))
                        .with_code(ErrorCode::E202)
                        .with_label(stmt.span_of(reference), ErrorCode::E202.description())
                        .with_help("`after` must name a task defined earlier")
                }),
            Start::Date(text) => parse_date(text, self.model.date_format()).ok_or_else(|| {
                Diagnostic::error(format!(
                    "`{text}` does not match date format `{}`",
                    self.model.date_format()
                ))
                .with_code(ErrorCode::E200)
                .with_label(stmt.span_of(text), ErrorCode::E200.description())
            }),
        }
    }

    /// The end is a date in the chart's format or a duration from `start`.
    fn resolve_end(
        &self,
        stmt: &Statement<'_>,
        start: NaiveDateTime,
        end: &str,
    ) -> Result<NaiveDateTime, Diagnostic> {
        if let Some(date) = parse_date(end, self.model.date_format()) {
            return Ok(date);
        }
        parse_duration(end)
            .and_then(|duration| start.checked_add_signed(duration))
            .ok_or_else(|| {
                Diagnostic::error(format!("`{end}` is neither a date nor a duration"))
                    .with_code(ErrorCode::E201)
                    .with_label(stmt.span_of(end), ErrorCode::E201.description())
                    .with_help("durations are a number and a unit: `3d`, `1w`, `12h`")
            })
    }
}

fn start_of(text: &str) -> Start<'_> {
    match text.strip_prefix("after ") {
        Some(reference) => Start::After(reference.trim()),
        None => Start::Date(text),
    }
}

/// Parses `text` with a `dateFormat` such as `YYYY-MM-DD`.
///
/// A missing month or day defaults to the first. Formats without a time
/// component yield midnight.
pub fn parse_date(text: &str, date_format: &str) -> Option<NaiveDateTime> {
    let pattern = chrono_format(date_format);
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, text, StrftimeItems::new(&pattern)).ok()?;

    if parsed.month().is_none() {
        parsed.set_month(1).ok()?;
    }
    if parsed.day().is_none() {
        parsed.set_day(1).ok()?;
    }

    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

/// Translates `dateFormat` tokens into a chrono format string.
fn chrono_format(date_format: &str) -> String {
    const TOKENS: &[(&str, &str)] = &[
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut format = String::with_capacity(date_format.len() * 2);
    let mut rest = date_format;
    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                format.push_str(replacement);
                rest = after;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                format.push('%');
            }
            format.push(c);
        }
        rest = chars.as_str();
    }
    format
}

/// Parses a duration such as `3d`, `1.5w` or `90m`.
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let (value, unit) = duration.parse(text).ok()?;
    let value: f64 = value.parse().ok()?;
    let unit_ms = match unit {
        's' => 1_000.0,
        'm' => 60_000.0,
        'h' => 3_600_000.0,
        'd' => 86_400_000.0,
        _ => 604_800_000.0,
    };
    TimeDelta::try_milliseconds((value * unit_ms).round() as i64)
}

fn duration<'a>(input: &mut &'a str) -> ModalResult<(&'a str, char)> {
    (
        (digit1, opt(('.', digit1))).take(),
        one_of(['s', 'm', 'h', 'd', 'w']),
    )
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn gantt(source: &str) -> GanttModel {
        match parse(source).unwrap() {
            Diagram::Gantt(model) => model,
            other => panic!("expected gantt, got {:?}", other.kind()),
        }
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn first_code(source: &str) -> Option<ErrorCode> {
        parse(source).unwrap_err().diagnostics()[0].code()
    }

    const CHART: &str = "gantt
    dateFormat  YYYY-MM-DD
    title Adding GANTT diagram functionality
    section A section
    Completed task            :done,    des1, 2014-01-06,2014-01-08
    Active task               :active,  des2, 2014-01-09, 3d
    Future task               :         des3, after des2, 5d
    section Critical tasks
    Critical done             :crit, done, 2014-01-06,24h
    Follow up                 :crit, 2d";

    #[test]
    fn test_chart_resolves_tasks() {
        let model = gantt(CHART);
        assert_eq!(model.title(), Some("Adding GANTT diagram functionality"));
        assert_eq!(model.sections(), ["A section", "Critical tasks"]);

        let des1 = model.task("des1").unwrap();
        assert_eq!((des1.start(), des1.end()), (day(6), day(8)));
        assert_eq!(des1.status(), TaskStatus::Done);

        let des3 = model.task("des3").unwrap();
        assert_eq!(des3.start(), day(12));
        assert_eq!(des3.end(), day(17));
        assert_eq!(des3.section(), 0);

        let follow = model.task("task5").unwrap();
        assert!(follow.is_critical());
        assert_eq!(follow.start(), day(7));
        assert_eq!(follow.section(), 1);
    }

    #[test]
    fn test_task_before_section_gets_implicit_section() {
        let model = gantt("gantt\nWork :2014-01-01, 1w");
        assert_eq!(model.sections(), [String::new()]);
        assert_eq!(model.tasks()[0].duration(), TimeDelta::weeks(1));
    }

    #[test]
    fn test_custom_date_format() {
        let model = gantt("gantt\ndateFormat DD.MM.YYYY HH:mm\nWork :01.02.2014 08:30, 90m");
        let task = &model.tasks()[0];
        assert_eq!(
            task.start(),
            NaiveDate::from_ymd_opt(2014, 2, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap()
        );
        assert_eq!(task.duration(), TimeDelta::minutes(90));
    }

    #[test]
    fn test_year_only_format() {
        let date = parse_date("9999", "YYYY").unwrap();
        assert_eq!(
            date,
            NaiveDate::from_ymd_opt(9999, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );

        let date = parse_date("2014-03", "YYYY-MM").unwrap();
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2014, 3, 1).unwrap());

        let model = gantt("gantt\ndateFormat YYYY\nLaunch :l1, 9999, 2d");
        assert_eq!(model.tasks().len(), 1);
    }

    #[test]
    fn test_time_errors() {
        assert_eq!(first_code("gantt\nWork :2014-13-45, 1d"), Some(ErrorCode::E200));
        assert_eq!(first_code("gantt\nWork :2014-01-01, soon"), Some(ErrorCode::E201));
        assert_eq!(first_code("gantt\nWork :after nope, 1d"), Some(ErrorCode::E202));
        assert_eq!(first_code("gantt\nWork :1d"), Some(ErrorCode::E200));
    }

    #[test]
    fn test_unknown_reference_span() {
        let source = "gantt\nWork :after nope, 1d";
        let err = parse(source).unwrap_err();
        let span = err.diagnostics()[0].labels()[0].span();
        assert_eq!(&source[span.start()..span.end()], "nope");
    }

    #[test]
    fn test_durations() {
        assert_eq!(parse_duration("3d"), Some(TimeDelta::days(3)));
        assert_eq!(parse_duration("1.5h"), Some(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("2w"), Some(TimeDelta::weeks(2)));
        assert_eq!(parse_duration("d"), None);
        assert_eq!(parse_duration("3y"), None);
    }
}
