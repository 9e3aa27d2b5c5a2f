//! Discord channel adapter (stub).
//!
//! Implements the Channel trait for Discord Bot API.
//! In production, this would use `serenity` for the WebSocket gateway and
//! resolve the mention flag from the message's mention list. Currently a
//! stub with in-process message injection for testing.

use async_trait::async_trait;
use banter_core::channel::{Channel, ChannelId, InboundMessage};
use banter_core::error::ChannelError;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Discord channel configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token from the Discord Developer Portal.
    pub bot_token: String,
    /// Channel IDs to listen in. Empty = all channels.
    pub channel_filter: Vec<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("channel_filter", &self.channel_filter)
            .finish()
    }
}

/// Discord channel adapter.
pub struct DiscordChannel {
    config: DiscordConfig,
    inject_tx: tokio::sync::Mutex<Option<mpsc::Sender<Result<InboundMessage, ChannelError>>>>,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            inject_tx: tokio::sync::Mutex::new(None),
        }
    }

    /// Whether this adapter listens on the given conversation stream.
    fn listens_on(&self, channel_id: &ChannelId) -> bool {
        self.config.channel_filter.is_empty()
            || self.config.channel_filter.iter().any(|c| c == channel_id.as_str())
    }

    /// Inject a message as if it came from Discord (for testing).
    ///
    /// Messages on filtered-out channels are dropped, matching what the
    /// production gateway subscription would deliver.
    pub async fn inject_message(&self, msg: InboundMessage) -> Result<(), ChannelError> {
        if !self.listens_on(&msg.channel_id) {
            debug!(channel = %msg.channel_id, "Dropping message outside channel filter");
            return Ok(());
        }

        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(msg))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Message channel closed".into()))
        } else {
            Err(ChannelError::ConnectionLost("Channel not started".into()))
        }
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<InboundMessage, ChannelError>>, ChannelError> {
        if self.config.bot_token.is_empty() {
            return Err(ChannelError::NotConfigured("Discord bot token is empty".into()));
        }

        info!("Discord channel starting (stub mode)");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn send(&self, channel_id: &ChannelId, content: &str) -> Result<(), ChannelError> {
        info!(
            channel = %channel_id,
            content_len = content.len(),
            "Discord send (stub)"
        );
        Ok(())
    }

    async fn send_ephemeral(
        &self,
        channel_id: &ChannelId,
        user_id: &str,
        content: &str,
    ) -> Result<(), ChannelError> {
        info!(
            channel = %channel_id,
            user = %user_id,
            content_len = content.len(),
            "Discord ephemeral send (stub)"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Discord channel stopping");
        *self.inject_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(!self.config.bot_token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> DiscordConfig {
        DiscordConfig {
            bot_token: "test-discord-token".into(),
            channel_filter: vec![],
        }
    }

    fn test_message(channel: &str) -> InboundMessage {
        InboundMessage {
            channel_id: ChannelId(channel.into()),
            sender_id: "user456".into(),
            sender_name: Some("Bob".into()),
            content: "Hey from Discord!".into(),
            mentions_agent: false,
        }
    }

    #[test]
    fn channel_name() {
        let ch = DiscordChannel::new(test_config());
        assert_eq!(ch.name(), "discord");
    }

    #[test]
    fn debug_redacts_token() {
        let config = test_config();
        assert!(!format!("{config:?}").contains("test-discord-token"));
    }

    #[tokio::test]
    async fn start_inject_and_receive() {
        let ch = DiscordChannel::new(test_config());
        let mut rx = ch.start().await.unwrap();

        ch.inject_message(test_message("general")).await.unwrap();
        let received = rx.recv().await.unwrap().unwrap();
        assert_eq!(received.content, "Hey from Discord!");
    }

    #[tokio::test]
    async fn inject_before_start_fails() {
        let ch = DiscordChannel::new(test_config());
        assert!(ch.inject_message(test_message("general")).await.is_err());
    }

    #[tokio::test]
    async fn channel_filter_drops_other_streams() {
        let ch = DiscordChannel::new(DiscordConfig {
            channel_filter: vec!["general".into()],
            ..test_config()
        });
        let mut rx = ch.start().await.unwrap();

        ch.inject_message(test_message("off-topic")).await.unwrap();
        ch.inject_message(test_message("general")).await.unwrap();

        let received = rx.recv().await.unwrap().unwrap();
        assert_eq!(received.channel_id.as_str(), "general");
    }

    #[tokio::test]
    async fn empty_token_refuses_to_start() {
        let ch = DiscordChannel::new(DiscordConfig {
            bot_token: String::new(),
            channel_filter: vec![],
        });
        assert!(ch.start().await.is_err());
        assert!(!ch.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn send_and_health() {
        let ch = DiscordChannel::new(test_config());
        assert!(ch.send(&ChannelId("c1".into()), "Hello!").await.is_ok());
        assert!(ch.health_check().await.unwrap());
    }
}
