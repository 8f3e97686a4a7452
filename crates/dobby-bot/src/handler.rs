//! The text-message pipeline.
//!
//! One inbound text message moves through an ordered decision sequence:
//! gate (rate limit / empty) → safety validation → context assembly →
//! generation with failover → response safety check → send + record.
//! History and rate-limit updates land before the send, so a failed send
//! leaves consistent state behind (at-least-once, no retry).

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use dobby_core::types::{ConversationId, Role, UserAddress};
use dobby_transport::Transport;

use crate::state::BotContext;

/// Handle one inbound text message end to end.
///
/// Never returns an error: every failure mode inside the pipeline is
/// either recovered (generation) or logged and dropped (send).
pub async fn handle_text_message<T: Transport + ?Sized>(
    ctx: &BotContext,
    transport: &T,
    conversation: &ConversationId,
    sender: &UserAddress,
    content: &str,
) {
    info!(sender = %sender, preview = %preview(content), "💬 message received");

    let gate = ctx.store.should_process(conversation, sender, content);
    if !gate.should_process {
        if let Some(response) = gate.response {
            if let Err(e) = transport.send_text(conversation, &response).await {
                warn!(sender = %sender, err = %e, "failed to send gate response");
            }
        }
        return;
    }

    let validation = ctx.safety.validate_user_message(content);
    if !validation.is_valid {
        warn!(
            sender = %sender,
            reason = validation.reason.as_deref().unwrap_or("unknown"),
            "message blocked"
        );
        return;
    }
    for warning in &validation.warnings {
        info!(sender = %sender, %warning, "processing with warning");
    }

    ctx.store.add_message(conversation, Role::User, content);
    let history = ctx.store.context(conversation);

    let mut rng = StdRng::from_os_rng();
    let response = dobby_agent::failover::generate(
        ctx.primary.as_ref(),
        ctx.fallback.as_deref(),
        &mut rng,
        content,
        &history,
    )
    .await;

    let safe_response = ctx.safety.get_safe_response(&response);

    ctx.store.add_message(conversation, Role::Assistant, &safe_response);
    ctx.store.record_reply(sender);

    match transport.send_text(conversation, &safe_response).await {
        Ok(()) => {
            info!(sender = %sender, preview = %preview(&safe_response), "💞 response sent");
        }
        Err(e) => {
            // The reply is already in history and counted against the rate
            // limit; it is simply lost on the wire.
            warn!(sender = %sender, err = %e, "failed to send response — message dropped");
        }
    }
}

/// First 120 characters, for log lines.
fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}
