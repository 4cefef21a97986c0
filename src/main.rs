//! Paybridge server entrypoint.
//!
//! Loads configuration, wires the adapters into the payment application
//! state, registers the webhook endpoint with the processor when a public
//! URL is configured, and serves the HTTP API.

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use paybridge::adapters::http::payment::{payment_router, PaymentAppState};
use paybridge::adapters::memory::{InMemoryOrderLock, InMemoryOrderStore, NoopHooks};
use paybridge::adapters::processor::HttpProcessorClient;
use paybridge::config::AppConfig;
use paybridge::domain::webhook::WebhookVerifier;
use paybridge::ports::{ProcessorClient, WebhookSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.log_level))
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        test_mode = config.processor.test_mode,
        "starting paybridge"
    );

    let processor_client: Arc<dyn ProcessorClient> =
        Arc::new(HttpProcessorClient::new(&config.processor)?);

    if let Some(webhook_url) = &config.processor.webhook_url {
        match processor_client
            .configure_webhooks(WebhookSettings {
                urls: vec![webhook_url.clone()],
                disabled: false,
            })
            .await
        {
            Ok(()) => tracing::info!(url = %webhook_url, "webhook endpoint registered"),
            Err(error) => tracing::warn!(%error, "webhook registration failed"),
        }
    }

    let state = PaymentAppState {
        order_store: Arc::new(InMemoryOrderStore::new()),
        processor_client,
        order_lock: Arc::new(InMemoryOrderLock::new()),
        hooks: Arc::new(NoopHooks),
        webhook_verifier: WebhookVerifier::new(config.processor.webhook_secret.clone()),
        settle_policy: config.settlement.settle_policy()?,
        handle_failover: config.settlement.handle_failover,
        skip_order_lines: config.settlement.skip_order_lines,
    };

    let app = payment_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
