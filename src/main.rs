//! Storefront Payments server.
//!
//! Startup order: configuration, tracing, payment provider, webhook
//! registry, router, then serve until Ctrl+C or SIGTERM.

use std::sync::Arc;

use storefront_payments::adapters::http::{build_router, AppState};
use storefront_payments::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use storefront_payments::application::{register_default_handlers, WebhookRegistry};
use storefront_payments::config::{AppConfig, ServerConfig};
use storefront_payments::ports::PaymentProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing or malformed Stripe keys while enabled abort startup here
    let config = AppConfig::load_validated()?;

    init_tracing(&config.server);

    tracing::info!(
        environment = ?config.server.environment,
        stripe_enabled = config.stripe.enabled,
        test_mode = config.stripe.is_test_mode(),
        webhook_secret = config.stripe.has_webhook_secret(),
        "Starting storefront payments"
    );

    let stripe_config = StripeConfig::from(&config.stripe);
    let payment_provider: Arc<dyn PaymentProvider> =
        Arc::new(StripePaymentAdapter::new(stripe_config)?);

    let webhook_registry = Arc::new(WebhookRegistry::new());
    register_default_handlers(&webhook_registry);
    tracing::info!(
        event_types = webhook_registry.event_types().len(),
        "Registered default webhook handlers"
    );

    let state = AppState::new(
        payment_provider,
        webhook_registry,
        config.stripe.clone(),
        config.shop.clone(),
    );
    let app = build_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    tracing::info!("storefront payments listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// `RUST_LOG` wins over the configured level. JSON output in production.
fn init_tracing(server: &ServerConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
