use serde::Serialize;

/// Which bucket of minutes an interval feeds.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Category {
    Clock,
    Break,
    Drive,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeEventKind {
    ClockIn,
    ClockOut,
    BreakStart,
    BreakStop,
    DriveStart,
    DriveStop,
}

impl TimeEventKind {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TimeEventKind::ClockIn => "clock_in",
            TimeEventKind::ClockOut => "clock_out",
            TimeEventKind::BreakStart => "break_start",
            TimeEventKind::BreakStop => "break_stop",
            TimeEventKind::DriveStart => "drive_start",
            TimeEventKind::DriveStop => "drive_stop",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "clock_in" => Some(TimeEventKind::ClockIn),
            "clock_out" => Some(TimeEventKind::ClockOut),
            "break_start" => Some(TimeEventKind::BreakStart),
            "break_stop" => Some(TimeEventKind::BreakStop),
            "drive_start" => Some(TimeEventKind::DriveStart),
            "drive_stop" => Some(TimeEventKind::DriveStop),
            _ => None,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            TimeEventKind::ClockIn | TimeEventKind::ClockOut => Category::Clock,
            TimeEventKind::BreakStart | TimeEventKind::BreakStop => Category::Break,
            TimeEventKind::DriveStart | TimeEventKind::DriveStop => Category::Drive,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(
            self,
            TimeEventKind::ClockIn | TimeEventKind::BreakStart | TimeEventKind::DriveStart
        )
    }
}
