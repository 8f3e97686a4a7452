use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use dobby_agent::{CompletionClient, GenerationClient};
use dobby_bot::{console::ConsoleTransport, dispatch, maintenance, BotContext};
use dobby_core::config::LoggingConfig;
use dobby_core::{DobbyConfig, DobbyError};
use dobby_transport::Transport;

/// Delay before a non-zero exit so the log writer can flush.
const LOG_FLUSH_DELAY: Duration = Duration::from_millis(1500);
/// How long in-flight handlers get to finish during shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Tracing may not be initialized yet (config errors), so the
        // fatal line goes to stderr unconditionally too.
        eprintln!("💥 Fatal error starting Dr. Dobby agent: {e}");
        error!(err = %e, "fatal error");
        tokio::time::sleep(LOG_FLUSH_DELAY).await;
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = std::env::var("DOBBY_CONFIG").ok();
    let config = DobbyConfig::load(config_path.as_deref())?;

    init_tracing(&config.logging)?;

    info!(network = %config.network, persona = %config.bot.persona, "🚀 Starting Dr. Dobby agent...");

    // Build the generation backends and confirm at least one is usable.
    let primary = CompletionClient::primary(&config);
    let fallback = config
        .fallback
        .as_ref()
        .map(|fb| CompletionClient::fallback(&config, fb));

    let primary_ok = primary.test_connection().await;
    let fallback_configured = fallback.is_some();
    info!(
        primary = primary_ok,
        fallback = fallback_configured,
        "AI model connection status"
    );
    if !primary_ok && !fallback_configured {
        return Err(DobbyError::Generation("No working AI models available".to_string()).into());
    }

    let ctx = Arc::new(BotContext::new(
        config,
        Box::new(primary),
        fallback.map(|c| Box::new(c) as Box<dyn GenerationClient>),
    ));

    // Bring up the messaging session.
    let mut transport = ConsoleTransport::new(&ctx.config.test.address);
    transport
        .connect()
        .await
        .map_err(|e| DobbyError::Transport(e.to_string()))?;
    let mut events = transport.spawn_event_stream();
    let transport = Arc::new(transport);

    info!(
        address = %transport.local_address(),
        test_address = %ctx.config.test.address,
        "💖 Dr. Dobby is online and ready to heal hearts!"
    );

    // Background maintenance, cancelled through the shutdown channel.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let cleanup_task = tokio::spawn(maintenance::run_cleanup_loop(
        Arc::clone(&ctx),
        shutdown_rx.clone(),
    ));
    let status_task = tokio::spawn(maintenance::run_status_loop(
        Arc::clone(&ctx),
        shutdown_rx,
    ));

    // Event loop: one spawned handler per inbound event, so a stuck
    // generation call never blocks other conversations.
    let mut handlers: JoinSet<()> = JoinSet::new();
    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => {
                        let ctx = Arc::clone(&ctx);
                        let transport = Arc::clone(&transport);
                        handlers.spawn(async move {
                            dispatch::dispatch_event(ctx.as_ref(), transport.as_ref(), event).await;
                        });
                    }
                    None => {
                        info!("event stream closed");
                        break;
                    }
                }
            }
            Some(finished) = handlers.join_next(), if !handlers.is_empty() => {
                if let Err(e) = finished {
                    error!(err = %e, "event handler aborted");
                }
            }
            _ = shutdown_signal() => {
                info!("Received shutdown signal, Dr. Dobby signing off gracefully...");
                break;
            }
        }
    }

    // Graceful shutdown: stop the loops, give in-flight handlers a
    // bounded grace period, run a final cleanup, release the session.
    let _ = shutdown_tx.send(true);

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(finished) = handlers.join_next().await {
            if let Err(e) = finished {
                error!(err = %e, "event handler aborted");
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!("in-flight handlers exceeded the grace period — abandoned");
        handlers.abort_all();
    }

    let _ = tokio::time::timeout(Duration::from_secs(1), async {
        let _ = cleanup_task.await;
        let _ = status_task.await;
    })
    .await;

    ctx.store.cleanup();

    match Arc::try_unwrap(transport) {
        Ok(mut transport) => {
            if let Err(e) = transport.disconnect().await {
                warn!(err = %e, "transport disconnect failed");
            }
        }
        Err(_) => warn!("transport still referenced by abandoned handlers — session not released"),
    }

    info!("✅ Dr. Dobby stopped gracefully.");
    Ok(())
}

/// Resolves when SIGINT (ctrl-c) or SIGTERM arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
            return;
        }
    }
    let _ = tokio::signal::ctrl_c().await;
}

/// Level comes from config (RUST_LOG wins when set); output goes to the
/// configured log file, or stderr when none is set.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}
