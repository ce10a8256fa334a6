//! Gantt chart model.

use chrono::{NaiveDateTime, TimeDelta};

/// Progress marker of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskStatus {
    #[default]
    Pending,
    Active,
    Done,
}

/// A task with resolved start and end times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: String,
    name: String,
    section: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
    status: TaskStatus,
    critical: bool,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        section: usize,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            section,
            start,
            end,
            status: TaskStatus::default(),
            critical: false,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index into [`GanttModel::sections`].
    pub fn section(&self) -> usize {
        self.section
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }
}

#[derive(Debug, Clone, Default)]
pub struct GanttModel {
    title: Option<String>,
    date_format: String,
    sections: Vec<String>,
    tasks: Vec<Task>,
}

impl GanttModel {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            ..Self::default()
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// The `dateFormat` the task dates were written in.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn set_date_format(&mut self, format: impl Into<String>) {
        self.date_format = format.into();
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Opens a new section and returns its index.
    pub fn add_section(&mut self, name: impl Into<String>) -> usize {
        self.sections.push(name.into());
        self.sections.len() - 1
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Earliest start and latest end over all tasks.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.tasks.iter().map(Task::start).min()?;
        let end = self.tasks.iter().map(Task::end).max()?;
        Some((start, end))
    }
}
