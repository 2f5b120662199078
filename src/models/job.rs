use serde::Serialize;
use std::fmt;

/// Reserved job_no for minutes with no job tag.
pub const UNASSIGNED_JOB_NO: i64 = 0;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Job {
    pub owner: String,
    pub job_no: i64,
    pub name: String,
    pub active: bool,
    pub created_at: String,
}

/// A job reference as collaborators write it: a job number or a job name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobRef {
    No(i64),
    Name(String),
}

impl JobRef {
    /// All-digit text is a job number, anything else a name. Blank → None.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if s.chars().all(|c| c.is_ascii_digit())
            && let Ok(n) = s.parse::<i64>()
        {
            return Some(JobRef::No(n));
        }
        Some(JobRef::Name(s.to_string()))
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobRef::No(n) => write!(f, "{n}"),
            JobRef::Name(name) => f.write_str(name),
        }
    }
}

/// Case-insensitive lookup key for job names.
pub fn normalize_job_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
