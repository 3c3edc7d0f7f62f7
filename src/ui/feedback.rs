// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! User feedback: display text plus status indicator code, always set together.

use core::fmt;

use heapless::String;

use crate::io::{Display, Status, StatusIndicator};

/// Characters per display row.
pub const LINE_WIDTH: usize = 16;

/// One display row. Writes past the row width are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line(String<LINE_WIDTH>);

impl Line {
    pub fn new() -> Self {
        Self(String::new())
    }

    pub fn format(args: fmt::Arguments<'_>) -> Self {
        let mut line = Self::new();
        let _ = fmt::write(&mut line, args);
        line
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Write for Line {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Display and status indicator of one step.
pub struct Feedback<'a> {
    pub display: &'a mut dyn Display,
    pub status: &'a mut dyn StatusIndicator,
}

impl<'a> Feedback<'a> {
    pub fn new(display: &'a mut dyn Display, status: &'a mut dyn StatusIndicator) -> Self {
        Self { display, status }
    }

    pub fn show(&mut self, line1: &str, line2: &str, status: Status) {
        self.display.show_lines(line1, line2);
        self.status.set_status(status);
    }

    pub fn show_fmt(&mut self, line1: &str, line2: fmt::Arguments<'_>, status: Status) {
        let line2 = Line::format(line2);
        self.show(line1, line2.as_str(), status);
    }
}
