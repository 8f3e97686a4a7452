use chrono::{DateTime, Utc};

use dobby_core::types::Role;

/// One retained conversation turn. Immutable once created.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Decision from the pipeline's first gate.
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub should_process: bool,
    pub reason: &'static str,
    /// Canned reply to send on rejection, when one applies.
    pub response: Option<String>,
}

/// Point-in-time view of a user's remaining reply budget.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub remaining: usize,
    /// When the oldest in-window reply ages out; `now` when no replies
    /// are recorded.
    pub reset_time: DateTime<Utc>,
}

/// Counters for the periodic status log.
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub active_conversations: usize,
    pub tracked_users: usize,
}
