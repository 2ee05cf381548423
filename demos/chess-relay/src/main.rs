//! Relay server for the chess web client.
//!
//! The server knows nothing about chess — legality and mate detection
//! live in the client's rules library. This binary is just the relay
//! wired for that deployment: ten-minute clocks, one-second ticks, and
//! the port taken from the environment.

use tempo::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{port}");

    let server = RelayServerBuilder::new()
        .bind(&addr)
        .room_config(RoomConfig::default())
        .build()
        .await?;

    tracing::info!(%addr, "chess relay listening");
    server.run().await?;
    Ok(())
}
