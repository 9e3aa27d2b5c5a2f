//! Channel intake — one concurrent pipeline run per inbound message.
//!
//! A slow model call on one channel must never delay intake or replies on
//! another, so every message is handed to its own task. Per-message faults
//! are logged and dropped; only the intake stream closing ends the loop.

use crate::pipeline::{Outcome, Pipeline};
use banter_core::channel::Channel;
use banter_core::error::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Start a channel and serve messages until its stream closes.
pub async fn run_intake(channel: Arc<dyn Channel>, pipeline: Arc<Pipeline>) -> Result<()> {
    let mut rx = channel.start().await.map_err(Error::Channel)?;
    info!(channel = %channel.name(), "Message intake started");

    while let Some(event) = rx.recv().await {
        let msg = match event {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Channel delivered an error event");
                continue;
            }
        };

        let pipeline = pipeline.clone();
        let channel = channel.clone();
        tokio::spawn(async move {
            match pipeline.handle(&msg).await {
                Ok(Outcome::Silent) => {}
                Ok(Outcome::Reply(text)) => {
                    if let Err(e) = channel.send(&msg.channel_id, &text).await {
                        warn!(channel = %msg.channel_id, error = %e, "Reply delivery failed");
                    }
                }
                Ok(Outcome::Ephemeral(text)) => {
                    if let Err(e) = channel
                        .send_ephemeral(&msg.channel_id, &msg.sender_id, &text)
                        .await
                    {
                        warn!(channel = %msg.channel_id, error = %e, "Ephemeral delivery failed");
                    }
                }
                Err(e) => {
                    // Aborts this message only; the loop keeps serving.
                    warn!(channel = %msg.channel_id, error = %e, "Message evaluation aborted");
                }
            }
        });
    }

    info!(channel = %channel.name(), "Channel intake stream closed");
    Ok(())
}
