use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tracing::info;

use crate::relay::{IngestOutcome, Relay};

pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/webhooks", post(handle_webhook))
        .with_state(relay)
}

/// Bind the listener and serve until shutdown. `port` 0 picks an ephemeral
/// port; the bound address is logged either way.
pub async fn serve(relay: Arc<Relay>, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "webhook server listening");
    axum::serve(listener, router(relay)).await?;
    Ok(())
}

async fn handle_webhook(
    State(relay): State<Arc<Relay>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let event_kind = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Fire-and-forget from GitHub's perspective: internal failures are
    // handled (and logged) inside the relay, only bad signatures surface.
    match relay.handle_push_event(event_kind, &body, signature).await {
        IngestOutcome::Rejected => StatusCode::UNAUTHORIZED,
        IngestOutcome::Ignored | IngestOutcome::CleanedUp | IngestOutcome::Delivered => {
            StatusCode::OK
        }
    }
}
