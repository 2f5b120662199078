use super::{event_type::TimeEventKind, job::JobRef};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A raw clock punch (one `time_events` row). Written by the clock command
/// handler, only ever read here.
#[derive(Debug, Clone, Serialize)]
pub struct TimeEvent {
    pub id: i64,
    pub owner: String,
    pub employee_name: String,
    pub kind: TimeEventKind,
    pub ts: DateTime<Utc>,
    pub job_ref: Option<JobRef>,
}
