//! WebSocket push channel feeding backend scan events into the reconcile
//! queue.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use shared::protocol::ScanEvent;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::warn;

use crate::ScanClient;

fn push_url(server_url: &str) -> Result<String> {
    let ws_base = if let Some(rest) = server_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(anyhow!("server_url must start with http:// or https://"));
    };
    Ok(format!("{}/scan/events", ws_base.trim_end_matches('/')))
}

impl ScanClient {
    /// Connect the push channel and pump scan events into the reconcile
    /// queue until the socket closes. Envelopes that fail to parse are
    /// reported and skipped; the stream itself stays up. A client without a
    /// connected push channel is the degenerate request/response-only case:
    /// every other operation still works, reconciliation events just never
    /// arrive.
    pub async fn connect_push_channel(self: &Arc<Self>, server_url: &str) -> Result<JoinHandle<()>> {
        let url = push_url(server_url)?;
        let (ws_stream, _) = connect_async(&url)
            .await
            .with_context(|| format!("failed to connect scan push channel: {url}"))?;
        let (_, mut reader) = ws_stream.split();

        let client = Arc::clone(self);
        Ok(tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ScanEvent>(&text) {
                        Ok(event) => client.push_event(event).await,
                        Err(err) => warn!("invalid scan event envelope: {err}"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!("scan push channel receive failed: {err}");
                        break;
                    }
                }
            }
        }))
    }
}
