use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dobby_core::types::{ConversationId, UserAddress};

/// A single event delivered by the messaging transport.
///
/// The transport decodes protocol frames into this shape; the bot never
/// sees anything lower-level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Assigned at receipt (UUIDv7 — time-sortable for log correlation).
    pub id: Uuid,
    pub conversation: ConversationId,
    pub sender: UserAddress,
    pub kind: EventKind,
    pub received_at: DateTime<Utc>,
}

/// Closed set of event kinds the transport can deliver.
///
/// Dispatch is an explicit `match` over this enum — adding a kind is a
/// compile error at every dispatch site until it is handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Plain text in a two-party conversation.
    Text { content: String },
    /// Media the bot cannot render; the payload stays with the transport.
    Attachment,
    /// An emoji reaction to an earlier message.
    Reaction { emoji: String },
    /// Plain text in a group conversation.
    Group { content: String },
}

impl InboundEvent {
    fn new(conversation: ConversationId, sender: UserAddress, kind: EventKind) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation,
            sender,
            kind,
            received_at: Utc::now(),
        }
    }

    pub fn text(
        conversation: impl Into<ConversationId>,
        sender: impl Into<UserAddress>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation.into(),
            sender.into(),
            EventKind::Text {
                content: content.into(),
            },
        )
    }

    pub fn attachment(
        conversation: impl Into<ConversationId>,
        sender: impl Into<UserAddress>,
    ) -> Self {
        Self::new(conversation.into(), sender.into(), EventKind::Attachment)
    }

    pub fn reaction(
        conversation: impl Into<ConversationId>,
        sender: impl Into<UserAddress>,
        emoji: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation.into(),
            sender.into(),
            EventKind::Reaction {
                emoji: emoji.into(),
            },
        )
    }

    pub fn group(
        conversation: impl Into<ConversationId>,
        sender: impl Into<UserAddress>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation.into(),
            sender.into(),
            EventKind::Group {
                content: content.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_event_carries_content() {
        let event = InboundEvent::text("topic-1", "0xabc", "hello");
        match event.kind {
            EventKind::Text { ref content } => assert_eq!(content, "hello"),
            ref other => panic!("unexpected kind: {other:?}"),
        }
        assert_eq!(event.sender.as_str(), "0xabc");
    }

    #[test]
    fn kind_serializes_with_type_tag() {
        let event = InboundEvent::reaction("topic-1", "0xabc", "❤️");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "reaction");
        assert_eq!(json["kind"]["emoji"], "❤️");
    }

    #[test]
    fn event_ids_are_unique() {
        let a = InboundEvent::attachment("topic-1", "0xabc");
        let b = InboundEvent::attachment("topic-1", "0xabc");
        assert_ne!(a.id, b.id);
    }
}
