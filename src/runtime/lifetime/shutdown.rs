use tokio::signal;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::events::EventBus;

/// 等待 Ctrl+C，随后停止截止时间巡检
pub async fn listen_for_shutdown(ticker: Option<JoinHandle<()>>, events: EventBus) {
    signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
    warn!("Shutdown signal received, initiating graceful shutdown...");

    if let Some(handle) = ticker {
        handle.abort();
        warn!("Deadline ticker stopped");
    }
    warn!(
        "{} event subscriber(s) detached",
        events.receiver_count()
    );
}
