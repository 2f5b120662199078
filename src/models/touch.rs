use serde::Serialize;

/// "(owner, job?, day) needs recompute" (one `touches` row). Owner and day stay
/// raw until the group is processed so one bad row fails only its group.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Touch {
    pub id: i64,
    pub owner: String,
    pub job_ref: Option<String>,
    pub day: String,
}

/// All touches claimed for one (owner, day), coalesced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchGroup {
    pub owner: String,
    pub day: String,
    /// Distinct job references, first-seen order.
    pub job_refs: Vec<String>,
    /// How many touches collapsed into this group.
    pub touch_count: usize,
}
