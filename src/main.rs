use std::sync::Arc;

use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};

use solana_tx_notifier::{
    config::AppConfig,
    fetch::{RateLimitedFetcher, SignatureFeed, SolanaRpcSource, TransactionSource},
    monitor::{webhook, AddressPoller, DedupStore, TransactionPipeline},
    notify::{FeishuChannel, NotificationChannel, NotificationDispatcher, TelegramChannel},
    ClassifierChain,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::load_from_env()?;
    info!(
        "Starting Solana transaction notifier against {} ({:?})",
        config.solana.masked_rpc_url(),
        config.solana.commitment.commitment
    );

    let channels = build_channels(&config)?;
    if channels.is_empty() {
        warn!("No notification channel enabled, events will only be logged");
    }
    let dispatcher = NotificationDispatcher::new(channels, config.notify_retry.clone());

    let rpc = Arc::new(SolanaRpcSource::new(config.solana.create_rpc_client()));
    let fetcher = RateLimitedFetcher::new(
        rpc.clone() as Arc<dyn TransactionSource>,
        config.fetcher.clone(),
    );
    // Polling shares the fetcher's request spacing
    let throttle = fetcher.throttle();

    let pipeline = Arc::new(TransactionPipeline::new(
        DedupStore::new(config.dedup_ceiling),
        fetcher,
        ClassifierChain::standard(config.classifier_context()),
        dispatcher,
    ));

    if config.enable_polling {
        if config.watch_addresses.is_empty() {
            warn!("Polling enabled but WATCH_ADDRESSES is empty");
        } else {
            let poller = AddressPoller::new(
                rpc as Arc<dyn SignatureFeed>,
                pipeline.clone(),
                throttle,
                config.poller_config(),
            );
            tokio::spawn(poller.run());
        }
    }

    if config.enable_webhook {
        let pipeline = pipeline.clone();
        let port = config.port;
        tokio::spawn(async move {
            if let Err(e) = webhook::serve(pipeline, port).await {
                error!("Webhook endpoint stopped: {}", e);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!(
        "Shutting down, {} signature(s) seen this session",
        pipeline.dedup().size()
    );

    Ok(())
}

fn build_channels(
    config: &AppConfig,
) -> Result<Vec<Arc<dyn NotificationChannel>>, Box<dyn std::error::Error>> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

    if let Some(telegram) = &config.telegram {
        channels.push(Arc::new(TelegramChannel::new(&telegram.token, &telegram.chat_id)?));
        info!("Telegram channel enabled");
    }
    if let Some(url) = &config.feishu_webhook_url {
        let feishu = FeishuChannel::new(url)?;
        info!("Feishu channel enabled ({})", feishu.masked_url());
        channels.push(Arc::new(feishu));
    }

    Ok(channels)
}
