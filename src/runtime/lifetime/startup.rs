use crate::config::AppConfig;
use crate::events::{EventBus, spawn_event_logger};
use crate::services::WorkshopService;
use crate::storage::Storage;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub events: EventBus,
    pub service: Arc<WorkshopService>,
    pub ticker: Option<JoinHandle<()>>,
}

/// 准备服务器启动的上下文
/// 包括存储、事件总线与后台任务
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        crate::strategies::registry::debug_strategy_registry();
        debug!("Debug mode: Strategy registry dumped");
    }

    let config = AppConfig::get();

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    let events = EventBus::new(config.workshop.event_capacity);
    spawn_event_logger(&events);

    let service = Arc::new(WorkshopService::new(
        storage.clone(),
        events.clone(),
        config.workshop.clone(),
    ));

    let ticker = if config.workshop.ticker_interval > 0 {
        let handle = crate::runtime::ticker::spawn_ticker(
            service.clone(),
            std::time::Duration::from_secs(config.workshop.ticker_interval),
        );
        warn!(
            "Deadline ticker started, interval {}s",
            config.workshop.ticker_interval
        );
        Some(handle)
    } else {
        None
    };

    StartupContext {
        storage,
        events,
        service,
        ticker,
    }
}
