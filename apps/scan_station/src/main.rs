use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{Cart, ClientEvent, HttpBackend, ScanClient};
use storage::CartStore;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: String,
    #[arg(long, default_value = "sqlite://scan_station.db")]
    database_url: String,
    #[arg(long)]
    port_index: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let backend = Arc::new(HttpBackend::new(&args.server_url));
    let client = ScanClient::new(backend.clone(), backend.clone());
    let cart = Cart::load(CartStore::new(&args.database_url).await?).await?;
    if !cart.is_empty().await {
        info!("label cart has {} saved item(s)", cart.items().await.len());
    }

    for port in client.list_ports().await? {
        println!("port {}: {} ({})", port.index, port.device, port.description);
    }

    client.connect_push_channel(&args.server_url).await?;
    let session_id = client.start_session(args.port_index).await?;
    println!(
        "scan session {} listening on port {}; Ctrl-C to stop",
        session_id.0, args.port_index
    );

    let mut events = client.subscribe_events();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::RecordDisplayed(record)) => {
                    println!("scanned {} ({})", record.unique_id(), record.name());
                }
                Ok(ClientEvent::FlipCommitted { unique_id }) => {
                    println!("flipped {unique_id}");
                }
                Ok(ClientEvent::FlipCommitFailed { unique_id, reason }) => {
                    eprintln!("flip for {unique_id} may not be saved: {reason}");
                }
                Ok(ClientEvent::ScanNotRecognized) => {
                    eprintln!("QR code not recognized, try again");
                }
                Ok(ClientEvent::SessionStopped) => {
                    println!("scan session stopped");
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                client.shutdown().await;
                break;
            }
        }
    }

    Ok(())
}
