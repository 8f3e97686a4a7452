//! End-to-end pipeline tests with a mock transport and mock generation
//! backends: gating, validation, failover, special event kinds, and the
//! at-least-once send semantics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dobby_agent::emergency::EMERGENCY_RESPONSES;
use dobby_agent::{GenerationClient, GenerationError};
use dobby_bot::{dispatch, BotContext};
use dobby_core::config::{
    BotConfig, DobbyConfig, LoggingConfig, Network, PrimaryModelConfig, TestConfig, WalletConfig,
};
use dobby_core::types::{ContextMessage, ConversationId, Role, UserAddress};
use dobby_transport::{InboundEvent, Transport, TransportError};

// --- Mocks -----------------------------------------------------------------

struct MockTransport {
    address: UserAddress,
    sent_texts: Mutex<Vec<(ConversationId, String)>>,
    sent_reactions: Mutex<Vec<(ConversationId, String)>>,
    fail_sends: bool,
}

impl MockTransport {
    fn new() -> Self {
        Self {
            address: UserAddress::from("0xbot"),
            sent_texts: Mutex::new(Vec::new()),
            sent_reactions: Mutex::new(Vec::new()),
            fail_sends: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::new()
        }
    }

    fn texts(&self) -> Vec<String> {
        self.sent_texts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn reactions(&self) -> Vec<String> {
        self.sent_reactions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, emoji)| emoji.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    fn local_address(&self) -> &UserAddress {
        &self.address
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::SendFailed("wire down".to_string()));
        }
        self.sent_texts
            .lock()
            .unwrap()
            .push((conversation.clone(), text.to_string()));
        Ok(())
    }

    async fn send_reaction(
        &self,
        conversation: &ConversationId,
        emoji: &str,
    ) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::SendFailed("wire down".to_string()));
        }
        self.sent_reactions
            .lock()
            .unwrap()
            .push((conversation.clone(), emoji.to_string()));
        Ok(())
    }
}

struct MockClient {
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockClient {
    fn ok(reply: &str) -> (Box<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                reply: Some(reply.to_string()),
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    fn failing() -> (Box<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                reply: None,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_response(
        &self,
        _user_message: &str,
        _history: &[ContextMessage],
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(GenerationError::Parse("simulated timeout".to_string())),
        }
    }

    async fn test_connection(&self) -> bool {
        self.reply.is_some()
    }
}

fn test_config() -> DobbyConfig {
    DobbyConfig {
        network: Network::Dev,
        wallet: WalletConfig {
            private_key: "ab".repeat(32),
            db_encryption_key: None,
        },
        primary: PrimaryModelConfig {
            api_url: "https://primary.example".to_string(),
            api_key: "pk".to_string(),
            model: "persona-model".to_string(),
            temperature: 0.3,
        },
        fallback: None,
        bot: BotConfig::default(),
        logging: LoggingConfig::default(),
        test: TestConfig::default(),
    }
}

fn context_with(
    primary: Box<dyn GenerationClient>,
    fallback: Option<Box<dyn GenerationClient>>,
) -> BotContext {
    BotContext::new(test_config(), primary, fallback)
}

fn text_event(content: &str) -> InboundEvent {
    InboundEvent::text("topic-1", "0xalice", content)
}

// --- Scenarios -------------------------------------------------------------

#[tokio::test]
async fn replies_until_rate_limit_then_apologizes() {
    let (primary, calls) = MockClient::ok("warm reply 💕");
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    for i in 0..50 {
        dispatch::dispatch_event(&ctx, &transport, text_event(&format!("hello {i}"))).await;
    }
    let texts = transport.texts();
    assert_eq!(texts.len(), 50);
    assert!(texts.iter().all(|t| t == "warm reply 💕"));
    assert_eq!(calls.load(Ordering::SeqCst), 50);

    // The 51st message inside the same hour stops at the gate: a canned
    // apology goes out and no generation call is made.
    dispatch::dispatch_event(&ctx, &transport, text_event("hello again")).await;
    let texts = transport.texts();
    assert_eq!(texts.len(), 51);
    assert!(texts[50].contains("overwhelmed"));
    assert_eq!(calls.load(Ordering::SeqCst), 50);
}

#[tokio::test]
async fn blocked_content_gets_no_reply_and_no_history() {
    let (primary, calls) = MockClient::ok("should never be used");
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    dispatch::dispatch_event(&ctx, &transport, text_event("I keep thinking about suicide")).await;

    assert!(transport.texts().is_empty());
    assert!(ctx.store.context(&ConversationId::from("topic-1")).is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fallback_reply_is_sent_and_recorded() {
    let (primary, _) = MockClient::failing();
    let (fallback, fallback_calls) = MockClient::ok("fallback comfort 💕");
    let ctx = context_with(primary, Some(fallback));
    let transport = MockTransport::new();

    dispatch::dispatch_event(&ctx, &transport, text_event("are you there?")).await;

    assert_eq!(transport.texts(), vec!["fallback comfort 💕"]);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);

    let history = ctx.store.context(&ConversationId::from("topic-1"));
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "fallback comfort 💕");

    let status = ctx.store.rate_limit_status(&UserAddress::from("0xalice"));
    assert_eq!(status.remaining, 49);
}

#[tokio::test]
async fn emergency_reply_when_primary_fails_without_fallback() {
    let (primary, _) = MockClient::failing();
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    dispatch::dispatch_event(&ctx, &transport, text_event("talk to me")).await;

    let texts = transport.texts();
    assert_eq!(texts.len(), 1);
    assert!(EMERGENCY_RESPONSES.contains(&texts[0].as_str()));

    let history = ctx.store.context(&ConversationId::from("topic-1"));
    assert_eq!(history[1].content, texts[0]);
}

#[tokio::test]
async fn failed_send_still_updates_history_and_rate_limit() {
    let (primary, _) = MockClient::ok("lost on the wire");
    let ctx = context_with(primary, None);
    let transport = MockTransport::failing();

    dispatch::dispatch_event(&ctx, &transport, text_event("hello?")).await;

    // Nothing went out, but the state updates had already happened —
    // at-least-once semantics, no retry.
    assert!(transport.texts().is_empty());
    let history = ctx.store.context(&ConversationId::from("topic-1"));
    assert_eq!(history.len(), 2);
    let status = ctx.store.rate_limit_status(&UserAddress::from("0xalice"));
    assert_eq!(status.remaining, 49);
}

#[tokio::test]
async fn over_long_generation_is_truncated_before_send() {
    let long_reply = "d".repeat(1500);
    let (primary, _) = MockClient::ok(&long_reply);
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    dispatch::dispatch_event(&ctx, &transport, text_event("tell me everything")).await;

    let texts = transport.texts();
    assert_eq!(texts[0].chars().count(), 1003);
    assert!(texts[0].ends_with("..."));
}

// --- Special inputs --------------------------------------------------------

#[tokio::test]
async fn attachments_get_the_canned_media_reply() {
    let (primary, calls) = MockClient::ok("unused");
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    let event = InboundEvent::attachment("topic-1", "0xalice");
    dispatch::dispatch_event(&ctx, &transport, event).await;

    assert_eq!(transport.texts(), vec![dispatch::ATTACHMENT_RESPONSE.to_string()]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reactions_are_answered_with_reactions() {
    let (primary, _) = MockClient::ok("unused");
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    dispatch::dispatch_event(&ctx, &transport, InboundEvent::reaction("topic-1", "0xalice", "❤️"))
        .await;
    dispatch::dispatch_event(&ctx, &transport, InboundEvent::reaction("topic-1", "0xalice", "😭"))
        .await;
    dispatch::dispatch_event(&ctx, &transport, InboundEvent::reaction("topic-1", "0xalice", "👍"))
        .await;

    assert_eq!(transport.reactions(), vec!["💕", "🤗", "💖"]);
    assert!(transport.texts().is_empty());
}

#[tokio::test]
async fn group_messages_only_answer_on_trigger_keywords() {
    let (primary, calls) = MockClient::ok("unused");
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    dispatch::dispatch_event(
        &ctx,
        &transport,
        InboundEvent::group("group-1", "0xalice", "what do you all think about love?"),
    )
    .await;
    dispatch::dispatch_event(
        &ctx,
        &transport,
        InboundEvent::group("group-1", "0xalice", "anyone up for lunch?"),
    )
    .await;

    assert_eq!(transport.texts(), vec![dispatch::GROUP_REDIRECT_RESPONSE.to_string()]);
    // Group messages never reach the generation clients.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(ctx.store.context(&ConversationId::from("group-1")).is_empty());
}

#[tokio::test]
async fn own_messages_are_ignored() {
    let (primary, calls) = MockClient::ok("unused");
    let ctx = context_with(primary, None);
    let transport = MockTransport::new();

    let event = InboundEvent::text("topic-1", "0xbot", "echo of myself");
    dispatch::dispatch_event(&ctx, &transport, event).await;

    assert!(transport.texts().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
