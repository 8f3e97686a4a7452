use dobby_agent::GenerationClient;
use dobby_core::DobbyConfig;
use dobby_safety::SafetyFilter;
use dobby_store::ConversationStore;

/// Everything the event handlers need, built once at startup and shared
/// by `Arc` handle. The store is mutated only through its documented
/// operations and torn down with the process.
pub struct BotContext {
    pub config: DobbyConfig,
    pub store: ConversationStore,
    pub safety: SafetyFilter,
    pub primary: Box<dyn GenerationClient>,
    pub fallback: Option<Box<dyn GenerationClient>>,
}

impl BotContext {
    pub fn new(
        config: DobbyConfig,
        primary: Box<dyn GenerationClient>,
        fallback: Option<Box<dyn GenerationClient>>,
    ) -> Self {
        let store = ConversationStore::new(config.bot.max_replies_per_hour);
        Self {
            config,
            store,
            safety: SafetyFilter::new(),
            primary,
            fallback,
        }
    }
}
