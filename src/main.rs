use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use credits_webhook_backend::{
    create_router, CreditStore, ServiceConfig, SupabaseCreditStore, WebhookState, WEBHOOK_PATH,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if available
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env();

    if config.webhook_secret.is_none() {
        tracing::warn!("LEMON_SQUEEZY_WEBHOOK_SECRET is not set, webhooks will not be authenticated");
    }

    let store: Option<Arc<dyn CreditStore>> = match config.store.clone() {
        Some(supabase) => {
            let store = SupabaseCreditStore::new(supabase);
            if let Err(e) = store.probe().await {
                tracing::warn!(error = %e, "Credit store is not reachable yet");
            }
            Some(Arc::new(store))
        }
        None => {
            tracing::warn!("SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY not set, purchases will fail");
            None
        }
    };

    tracing::info!(
        signature_check = config.webhook_secret.is_some(),
        store_configured = store.is_some(),
        credits = config.credit_grant.credits,
        policy = ?config.credit_grant.policy,
        "Service configuration loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_router(WebhookState::new(config, store));

    tracing::info!(%addr, webhook = WEBHOOK_PATH, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, shutting down gracefully");
}
