//! Operator-facing console lines. Diagnostics go through `tracing`
//! instead; these are the results a person running the CLI reads.

use crate::utils::colors::{BLUE, BOLD, GREEN, RESET, YELLOW};
use std::fmt;

#[derive(Clone, Copy)]
enum Level {
    Info,
    Success,
    Warning,
}

impl Level {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Level::Info => (BLUE, "ℹ️"),
            Level::Success => (GREEN, "✅"),
            Level::Warning => (YELLOW, "⚠️"),
        }
    }
}

fn emit(level: Level, msg: &dyn fmt::Display) {
    let (color, icon) = level.style();
    println!("{color}{BOLD}{icon} {RESET}{msg}");
}

pub fn info<T: fmt::Display>(msg: T) {
    emit(Level::Info, &msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    emit(Level::Success, &msg);
}

/// Also used for a batch that finished with failed groups.
pub fn warning<T: fmt::Display>(msg: T) {
    emit(Level::Warning, &msg);
}
