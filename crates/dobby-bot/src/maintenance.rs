//! Background loops: hourly store cleanup and a 5-minute status heartbeat.
//!
//! Both loops are cancellable through a `watch` shutdown channel and are
//! stopped explicitly during graceful shutdown; a final cleanup pass runs
//! in the shutdown path itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::state::BotContext;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const STATUS_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Hourly eviction of day-old state. Runs until shutdown is signalled.
pub async fn run_cleanup_loop(ctx: Arc<BotContext>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    // The first tick fires immediately; the first real pass is due one
    // interval from now.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                ctx.store.cleanup();
                info!("🧹 Dr. Dobby performed periodic cleanup");
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("cleanup loop shutting down");
                    break;
                }
            }
        }
    }
}

/// Periodic status heartbeat for the log.
pub async fn run_status_loop(ctx: Arc<BotContext>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(STATUS_INTERVAL);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let stats = ctx.store.stats();
                info!(
                    conversations = stats.active_conversations,
                    tracked_users = stats.tracked_users,
                    network = %ctx.config.network,
                    "❤️ Dr. Dobby status"
                );
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("status loop shutting down");
                    break;
                }
            }
        }
    }
}
