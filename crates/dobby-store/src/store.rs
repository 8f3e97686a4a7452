//! In-memory conversation history and per-user rate limiting.
//!
//! All state lives for the process lifetime only. Keys are created on
//! first touch — absence of a key behaves exactly like an empty entry,
//! so there is no "not found" error anywhere in this module.
//!
//! DashMap gives per-key serialization of mutations; no guard is held
//! across an await point.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use dobby_core::types::{ContextMessage, ConversationId, Role, UserAddress};

use crate::types::{GateDecision, HistoryEntry, RateLimitStatus, StoreStats};

/// Most recent turns retained per conversation (FIFO eviction).
const MAX_HISTORY_ENTRIES: usize = 20;
/// Sliding window for reply counting.
const RATE_LIMIT_WINDOW_SECS: i64 = 60 * 60;
/// Entries older than this are discarded wholesale by `cleanup`.
const RETENTION_SECS: i64 = 24 * 60 * 60;

/// Canned reply for rate-limited users.
const RATE_LIMIT_RESPONSE: &str = "I'm getting a bit overwhelmed with messages right now. \
     Give me a moment to catch up, and I'll be back to chat soon! 💕";

/// Per-conversation history and per-user reply timestamps.
///
/// Constructed once at startup, shared by handle, torn down at shutdown.
pub struct ConversationStore {
    conversations: DashMap<ConversationId, Vec<HistoryEntry>>,
    replies: DashMap<UserAddress, Vec<DateTime<Utc>>>,
    max_replies_per_hour: usize,
}

impl ConversationStore {
    pub fn new(max_replies_per_hour: usize) -> Self {
        Self {
            conversations: DashMap::new(),
            replies: DashMap::new(),
            max_replies_per_hour,
        }
    }

    /// True when the user has exhausted their reply budget for the
    /// trailing hour. Prunes the stored timestamps down to the window as
    /// a side effect of every call.
    pub fn is_rate_limited(&self, user: &UserAddress) -> bool {
        self.is_rate_limited_at(user, Utc::now())
    }

    fn is_rate_limited_at(&self, user: &UserAddress, now: DateTime<Utc>) -> bool {
        let cutoff = now - Duration::seconds(RATE_LIMIT_WINDOW_SECS);
        let mut entry = self.replies.entry(user.clone()).or_default();
        entry.retain(|ts| *ts > cutoff);
        entry.len() >= self.max_replies_per_hour
    }

    /// Record a sent reply. Call only after the send actually happened,
    /// never speculatively.
    pub fn record_reply(&self, user: &UserAddress) {
        self.record_reply_at(user, Utc::now());
    }

    fn record_reply_at(&self, user: &UserAddress, now: DateTime<Utc>) {
        self.replies.entry(user.clone()).or_default().push(now);
    }

    /// Remaining budget and when the oldest in-window reply ages out.
    pub fn rate_limit_status(&self, user: &UserAddress) -> RateLimitStatus {
        self.rate_limit_status_at(user, Utc::now())
    }

    fn rate_limit_status_at(&self, user: &UserAddress, now: DateTime<Utc>) -> RateLimitStatus {
        let cutoff = now - Duration::seconds(RATE_LIMIT_WINDOW_SECS);
        let window: Vec<DateTime<Utc>> = self
            .replies
            .get(user)
            .map(|entry| entry.iter().filter(|ts| **ts > cutoff).copied().collect())
            .unwrap_or_default();

        let remaining = self.max_replies_per_hour.saturating_sub(window.len());
        let reset_time = window
            .iter()
            .min()
            .map(|oldest| *oldest + Duration::seconds(RATE_LIMIT_WINDOW_SECS))
            .unwrap_or(now);

        RateLimitStatus {
            remaining,
            reset_time,
        }
    }

    /// Append a turn to a conversation, evicting from the front once the
    /// history exceeds [`MAX_HISTORY_ENTRIES`].
    pub fn add_message(&self, conversation: &ConversationId, role: Role, content: &str) {
        self.add_message_at(conversation, role, content, Utc::now());
    }

    fn add_message_at(
        &self,
        conversation: &ConversationId,
        role: Role,
        content: &str,
        now: DateTime<Utc>,
    ) {
        let mut history = self.conversations.entry(conversation.clone()).or_default();
        history.push(HistoryEntry {
            role,
            content: content.to_string(),
            timestamp: now,
        });
        if history.len() > MAX_HISTORY_ENTRIES {
            let excess = history.len() - MAX_HISTORY_ENTRIES;
            history.drain(..excess);
        }
    }

    /// The retained history for a conversation, stripped of timestamps,
    /// in original order — the exact payload for the generation clients.
    pub fn context(&self, conversation: &ConversationId) -> Vec<ContextMessage> {
        self.conversations
            .get(conversation)
            .map(|history| {
                history
                    .iter()
                    .map(|entry| ContextMessage::new(entry.role, entry.content.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First gate in the pipeline: rejects rate-limited users (with a
    /// canned apology) and empty messages (silently).
    pub fn should_process(
        &self,
        conversation: &ConversationId,
        user: &UserAddress,
        message: &str,
    ) -> GateDecision {
        self.should_process_at(conversation, user, message, Utc::now())
    }

    fn should_process_at(
        &self,
        _conversation: &ConversationId,
        user: &UserAddress,
        message: &str,
        now: DateTime<Utc>,
    ) -> GateDecision {
        if self.is_rate_limited_at(user, now) {
            warn!(user = %user, "rate limit exceeded");
            return GateDecision {
                should_process: false,
                reason: "Rate limit exceeded",
                response: Some(RATE_LIMIT_RESPONSE.to_string()),
            };
        }

        if message.trim().is_empty() {
            return GateDecision {
                should_process: false,
                reason: "Empty message",
                response: None,
            };
        }

        GateDecision {
            should_process: true,
            reason: "Message approved",
            response: None,
        }
    }

    /// Day-scale retention pass: drops reply timestamps and history
    /// entries older than 24 hours, and drops a key entirely once nothing
    /// newer remains. Runs hourly and once at graceful shutdown.
    pub fn cleanup(&self) {
        self.cleanup_at(Utc::now());
    }

    fn cleanup_at(&self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(RETENTION_SECS);

        self.replies.retain(|_, timestamps| {
            timestamps.retain(|ts| *ts > cutoff);
            !timestamps.is_empty()
        });

        self.conversations.retain(|_, history| {
            history.retain(|entry| entry.timestamp > cutoff);
            !history.is_empty()
        });

        info!(
            conversations = self.conversations.len(),
            users = self.replies.len(),
            "conversation store cleanup completed"
        );
    }

    /// Counters for the periodic status log.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            active_conversations: self.conversations.len(),
            tracked_users: self.replies.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
