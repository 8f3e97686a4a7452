//! Console transport — a stdin/stdout implementation of [`Transport`].
//!
//! Used for local runs and manual smoke tests: every line typed becomes a
//! text event from the configured test address, and outbound messages are
//! printed. The real messaging session lives behind the same trait in an
//! out-of-tree transport; this keeps the whole pipeline drivable without
//! network access.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use dobby_core::types::{ConversationId, UserAddress};
use dobby_transport::{InboundEvent, Transport, TransportError};

pub struct ConsoleTransport {
    address: UserAddress,
    peer: UserAddress,
    conversation: ConversationId,
}

impl ConsoleTransport {
    /// `peer_address` is the address the typed lines appear to come from
    /// (the diagnostics test address from config).
    pub fn new(peer_address: &str) -> Self {
        Self {
            address: UserAddress::from("console:dobby"),
            peer: UserAddress::from(peer_address),
            conversation: ConversationId::from("console"),
        }
    }

    /// Spawn the stdin reader. Each line becomes a `Text` event from the
    /// peer; the stream closes on EOF (ctrl-d), which the event loop
    /// treats as a shutdown request.
    pub fn spawn_event_stream(&self) -> mpsc::Receiver<InboundEvent> {
        let (tx, rx) = mpsc::channel(64);
        let peer = self.peer.clone();
        let conversation = self.conversation.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let event = InboundEvent::text(conversation.clone(), peer.clone(), line);
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    fn local_address(&self) -> &UserAddress {
        &self.address
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        info!(peer = %self.peer, "console transport connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        info!("console transport disconnected");
        Ok(())
    }

    async fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        println!("[{conversation}] 💌 {text}");
        Ok(())
    }

    async fn send_reaction(
        &self,
        conversation: &ConversationId,
        emoji: &str,
    ) -> Result<(), TransportError> {
        println!("[{conversation}] {emoji}");
        Ok(())
    }
}
