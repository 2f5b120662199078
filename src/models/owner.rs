use crate::errors::{AppError, AppResult};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

const MAX_OWNER_LEN: usize = 64;

/// Validated tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let s = raw.trim();
        let valid = !s.is_empty()
            && s.len() <= MAX_OWNER_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(AppError::InvalidOwner(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-owner policy inputs (one `owner_settings` row).
#[derive(Debug, Clone)]
pub struct OwnerSettings {
    pub owner: Owner,
    pub timezone: Tz,
    /// Paid minutes above this are overtime; 0 disables OT.
    pub daily_ot_threshold_minutes: i64,
}

pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| AppError::InvalidTimezone(name.to_string()))
}
