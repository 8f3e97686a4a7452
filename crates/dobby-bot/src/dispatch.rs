//! Inbound event dispatch.
//!
//! Every transport event lands here and is routed by an explicit `match`
//! over the closed [`EventKind`] enum. Only text messages in two-party
//! conversations enter the generation pipeline; attachments, reactions
//! and group messages get fixed canned handling and never touch the
//! generation clients.

use tracing::{debug, info, warn};

use dobby_core::types::{ConversationId, UserAddress};
use dobby_transport::{EventKind, InboundEvent, Transport};

use crate::handler;
use crate::state::BotContext;

/// Canned reply for media the bot cannot render.
pub const ATTACHMENT_RESPONSE: &str = "Oh, you're sharing something with me! 💕 I can't see \
     images, but I'd love to hear about it. What's on your mind?";

/// Canned redirect for group conversations.
pub const GROUP_REDIRECT_RESPONSE: &str = "Hey there! 💕 I'd love to chat about love and \
     relationships, but let's keep those private. DM me, and I'll be your Love Doctor! 💌";

/// Lowercase substrings that make the bot answer in a group at all.
const GROUP_TRIGGER_KEYWORDS: [&str; 2] = ["dobby", "love"];

/// Route one inbound event to its handler.
///
/// Events from the bot's own address are dropped up front — the bot only
/// ever replies, it never converses with itself.
pub async fn dispatch_event<T: Transport + ?Sized>(
    ctx: &BotContext,
    transport: &T,
    event: InboundEvent,
) {
    if event.sender == *transport.local_address() {
        debug!(event = %event.id, "ignoring own message");
        return;
    }

    match event.kind {
        EventKind::Text { content } => {
            handler::handle_text_message(ctx, transport, &event.conversation, &event.sender, &content)
                .await;
        }
        EventKind::Attachment => {
            handle_attachment(transport, &event.conversation, &event.sender).await;
        }
        EventKind::Reaction { emoji } => {
            handle_reaction(transport, &event.conversation, &event.sender, &emoji).await;
        }
        EventKind::Group { content } => {
            handle_group(transport, &event.conversation, &event.sender, &content).await;
        }
    }
}

async fn handle_attachment<T: Transport + ?Sized>(
    transport: &T,
    conversation: &ConversationId,
    sender: &UserAddress,
) {
    info!(sender = %sender, "📎 attachment received");
    if let Err(e) = transport.send_text(conversation, ATTACHMENT_RESPONSE).await {
        warn!(sender = %sender, err = %e, "failed to send attachment reply");
    }
}

async fn handle_reaction<T: Transport + ?Sized>(
    transport: &T,
    conversation: &ConversationId,
    sender: &UserAddress,
    emoji: &str,
) {
    info!(sender = %sender, emoji = %emoji, "💫 reaction received");
    let reply = reaction_reply(emoji);
    if let Err(e) = transport.send_reaction(conversation, reply).await {
        warn!(sender = %sender, err = %e, "failed to send reaction reply");
    }
}

async fn handle_group<T: Transport + ?Sized>(
    transport: &T,
    conversation: &ConversationId,
    sender: &UserAddress,
    content: &str,
) {
    info!(sender = %sender, preview = %content.chars().take(120).collect::<String>(), "👥 group message");

    // Plain substring match on the lowercased text; unrelated words that
    // happen to contain a keyword also trigger the redirect.
    let lowered = content.to_lowercase();
    if GROUP_TRIGGER_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        if let Err(e) = transport.send_text(conversation, GROUP_REDIRECT_RESPONSE).await {
            warn!(sender = %sender, err = %e, "failed to send group redirect");
        }
    }
}

/// Map a received reaction to the bot's answering reaction.
fn reaction_reply(emoji: &str) -> &'static str {
    match emoji {
        "❤️" | "💕" | "😍" => "💕",
        "😢" | "😭" => "🤗",
        _ => "💖",
    }
}
