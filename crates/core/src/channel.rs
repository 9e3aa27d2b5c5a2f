//! Channel trait — the abstraction over chat platforms.
//!
//! A Channel connects banter to a messaging platform. It yields inbound
//! message events and exposes the two outbound primitives the pipeline
//! needs: send text to a conversation, and send an ephemeral response to a
//! privileged command invocation. Connection/session lifecycle is the
//! implementation's business.

use crate::error::ChannelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier of one isolated conversation stream on the platform.
///
/// History and reply ordering are scoped per channel id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inbound message event from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The conversation stream this message arrived on
    pub channel_id: ChannelId,

    /// Platform user ID of the author
    pub sender_id: String,

    /// Human-readable author name (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    /// The text content
    pub content: String,

    /// Whether the agent's identity was explicitly addressed
    #[serde(default)]
    pub mentions_agent: bool,
}

/// The core Channel trait.
///
/// Implementations handle platform-specific connection logic, event
/// delivery, and message formatting.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel adapter name (e.g., "discord").
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    ///
    /// Returns a receiver that yields inbound events. The implementation
    /// handles polling, webhooks, or websocket connections internally.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<InboundMessage, ChannelError>>,
        ChannelError,
    >;

    /// Send a reply to a conversation stream.
    async fn send(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> std::result::Result<(), ChannelError>;

    /// Send an ephemeral response to a privileged command invocation —
    /// visible to the invoking user only, where the platform supports it.
    async fn send_ephemeral(
        &self,
        channel_id: &ChannelId,
        user_id: &str,
        content: &str,
    ) -> std::result::Result<(), ChannelError>;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Health check — is the channel connected and operational?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}
