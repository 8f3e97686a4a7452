use async_trait::async_trait;

use dobby_core::types::{ConversationId, UserAddress};

use crate::error::TransportError;

/// Outbound capabilities of the messaging transport.
///
/// Implementations must be `Send + Sync` so a connected transport can be
/// shared across concurrently running event handlers. The protocol
/// session, frame signing, and key management all live behind this
/// boundary — the bot only sees conversations, addresses, and text.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Stable lowercase identifier for this transport (e.g. `"console"`).
    fn name(&self) -> &str;

    /// The bot's own address on the network. Events from this address are
    /// never processed (reply-only bot).
    fn local_address(&self) -> &UserAddress;

    /// Establish the messaging session.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Release the messaging session.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Deliver plain text to a conversation.
    ///
    /// `&self` on purpose: sends from concurrent handlers must not require
    /// a mutable borrow.
    async fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError>;

    /// Deliver an emoji reaction to a conversation.
    async fn send_reaction(
        &self,
        conversation: &ConversationId,
        emoji: &str,
    ) -> Result<(), TransportError>;
}
