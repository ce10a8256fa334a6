//! Info diagram model.

/// An `info` definition. Carries only whether `showInfo` was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InfoModel {
    show_info: bool,
}

impl InfoModel {
    pub fn new(show_info: bool) -> Self {
        Self { show_info }
    }

    pub fn show_info(&self) -> bool {
        self.show_info
    }
}
