use crate::models::event::TimeEvent;
use crate::models::event_type::Category;
use chrono::{DateTime, Utc};

/// A closed `[start, end)` span of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub category: Category,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Pair one employee's chronologically ordered events into intervals.
///
/// Every `*_start` is pushed; a `*_stop` pops the most recent unmatched
/// start of the same category. A stop with nothing to close is ignored,
/// and starts still open at the end of the slice are dropped: the shift
/// is picked up once its stop arrives.
pub fn reconstruct_intervals(events: &[TimeEvent]) -> Vec<Interval> {
    let mut open: Vec<(Category, DateTime<Utc>)> = Vec::new();
    let mut out = Vec::new();

    for ev in events {
        let category = ev.kind.category();

        if ev.kind.is_start() {
            open.push((category, ev.ts));
            continue;
        }

        if let Some(pos) = open.iter().rposition(|(c, _)| *c == category) {
            let (_, start) = open.remove(pos);
            if ev.ts > start {
                out.push(Interval {
                    category,
                    start,
                    end: ev.ts,
                });
            }
        }
    }

    out
}
