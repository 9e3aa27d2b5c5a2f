//! The per-message pipeline — banter's orchestration core.
//!
//! Every inbound message runs this state machine independently:
//!
//! ```text
//! Received → trigger → input gate → assemble → model call → output gate
//!          → exchange log → history append → deliver
//! ```
//!
//! Early exits: the trigger declining (silent, nothing logged), a blocked
//! input (fixed refusal, model never called), or a privileged command. A
//! failed or timed-out model call is recovered into a user-visible error
//! notice and still logged like any exchange. Configuration, filter rules,
//! and admin identities are read fresh from the store on every message.

use crate::context::{ContextAssembler, PromptParts};
use crate::gate::{FilterGate, REDACTION_TEXT, REFUSAL_TEXT};
use crate::history::HistoryCache;
use crate::trigger::TriggerPolicy;
use banter_core::channel::InboundMessage;
use banter_core::error::{ConfigFault, Error, Result};
use banter_core::lookup::Lookup;
use banter_core::message::ExchangeRecord;
use banter_core::provider::{CompletionRequest, Provider};
use banter_core::store::{RecordStore, keys, parse_reply_chance};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ephemeral denial for privileged commands from non-admins.
pub const DENIAL_TEXT: &str = "You're not allowed to do that.";

/// Ephemeral confirmation for a successful history wipe.
pub const WIPE_CONFIRMATION_TEXT: &str = "Short-term memory for this channel has been wiped.";

/// How one message left the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The trigger declined; nothing is sent and nothing is logged.
    Silent,
    /// A reply to deliver to the originating channel.
    Reply(String),
    /// An ephemeral response to a privileged command invocation.
    Ephemeral(String),
}

/// Process-level pipeline knobs (fixed for the lifetime of the process).
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub model_timeout: Duration,
    pub lookup_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            model_timeout: Duration::from_secs(30),
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

/// The orchestrator. One instance serves every channel concurrently.
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    provider: Arc<dyn Provider>,
    assembler: ContextAssembler,
    history: Arc<HistoryCache>,
    trigger: TriggerPolicy,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn Provider>,
        lookup: Arc<dyn Lookup>,
        history: Arc<HistoryCache>,
        trigger: TriggerPolicy,
        options: PipelineOptions,
    ) -> Self {
        let assembler = ContextAssembler::new(
            store.clone(),
            lookup,
            history.clone(),
            options.lookup_timeout,
        );
        Self {
            store,
            provider,
            assembler,
            history,
            trigger,
            options,
        }
    }

    /// Run one inbound message through the state machine.
    ///
    /// Errors abort this evaluation only; the caller logs them and keeps
    /// serving other messages.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<Outcome> {
        if let Some(command) = Command::parse(&msg.content) {
            return self.handle_command(msg, command).await;
        }

        // Trigger decision — reply chance read fresh, never cached.
        let raw_chance = self
            .store
            .config_value(keys::REPLY_CHANCE)
            .await?
            .ok_or_else(|| ConfigFault::MissingKey(keys::REPLY_CHANCE.into()))?;
        let reply_chance = parse_reply_chance(&raw_chance)?;

        if !self.trigger.should_reply(msg.mentions_agent, reply_chance) {
            return Ok(Outcome::Silent);
        }

        let gate = FilterGate::new(&self.store.filter_rules().await?);

        let output = if gate.blocks_input(&msg.content) {
            debug!(channel = %msg.channel_id, "Input blocked by filter; refusing without model call");
            REFUSAL_TEXT.to_string()
        } else {
            let model = self
                .store
                .config_value(keys::MODEL_ID)
                .await?
                .ok_or_else(|| ConfigFault::MissingKey(keys::MODEL_ID.into()))?;

            let prompt = self
                .assembler
                .assemble(&msg.channel_id, &msg.sender_id, &msg.content)
                .await?;

            let candidate = self.call_model(&model, prompt).await;

            if gate.blocks_output(&candidate) {
                debug!(channel = %msg.channel_id, "Candidate reply redacted by output filter");
                REDACTION_TEXT.to_string()
            } else {
                candidate
            }
        };

        // Log first, then the history pair, then hand the text back for
        // delivery. The history append is the per-channel serialization
        // point.
        self.store
            .append_exchange(ExchangeRecord::new(
                &msg.sender_id,
                msg.sender_name.clone(),
                &msg.content,
                &output,
            ))
            .await?;

        self.history
            .append_exchange(&msg.channel_id, &msg.content, &output);

        Ok(Outcome::Reply(output))
    }

    /// Call the provider under the configured timeout.
    ///
    /// Any fault here is recovered into a user-visible error notice — it is
    /// an answer, not a crash, and it gets logged like one.
    async fn call_model(&self, model: &str, prompt: PromptParts) -> String {
        let request = CompletionRequest {
            model: model.to_string(),
            system_prompt: prompt.system,
            user_prompt: prompt.user,
            temperature: self.options.temperature,
            max_tokens: Some(self.options.max_tokens),
        };

        match tokio::time::timeout(self.options.model_timeout, self.provider.complete(request))
            .await
        {
            Ok(Ok(response)) => response.content,
            Ok(Err(e)) => {
                warn!(provider = %self.provider.name(), error = %e, "Model call failed");
                format!("I couldn't come up with an answer just now ({e}). Try me again in a bit.")
            }
            Err(_) => {
                warn!(provider = %self.provider.name(), "Model call timed out");
                "I couldn't come up with an answer just now (the model took too long). \
                 Try me again in a bit."
                    .to_string()
            }
        }
    }

    async fn handle_command(&self, msg: &InboundMessage, command: Command) -> Result<Outcome> {
        if !self.store.is_admin(&msg.sender_id).await? {
            info!(user = %msg.sender_id, channel = %msg.channel_id, "Privileged command denied");
            return Ok(Outcome::Ephemeral(DENIAL_TEXT.to_string()));
        }

        match command {
            Command::Wipe => {
                self.history.wipe(&msg.channel_id);
                info!(channel = %msg.channel_id, "Channel history wiped by admin");
                Ok(Outcome::Ephemeral(WIPE_CONFIRMATION_TEXT.to_string()))
            }
        }
    }
}

/// Privileged commands recognized on the chat surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// `!wipe` — reset the invoking channel's rolling history.
    Wipe,
}

impl Command {
    fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            t if t.eq_ignore_ascii_case("!wipe") => Some(Self::Wipe),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingProvider, SlowProvider, StaticLookup, StaticProvider};
    use banter_core::channel::ChannelId;
    use banter_core::message::{FilterDirection, FilterRule};
    use banter_store::MemStore;

    fn msg(channel: &str, sender: &str, content: &str, mention: bool) -> InboundMessage {
        InboundMessage {
            channel_id: ChannelId(channel.into()),
            sender_id: sender.into(),
            sender_name: Some("Tester".into()),
            content: content.into(),
            mentions_agent: mention,
        }
    }

    async fn seeded_store() -> Arc<MemStore> {
        let store = Arc::new(MemStore::new());
        store
            .set_config_value(keys::PERSONALITY, "You are a test agent.")
            .await
            .unwrap();
        store.set_config_value(keys::REPLY_CHANCE, "0.0").await.unwrap();
        store
            .set_config_value(keys::MODEL_ID, "test-model")
            .await
            .unwrap();
        store
    }

    fn fast_options() -> PipelineOptions {
        PipelineOptions {
            model_timeout: Duration::from_millis(50),
            lookup_timeout: Duration::from_millis(50),
            ..PipelineOptions::default()
        }
    }

    fn pipeline_with(
        store: Arc<MemStore>,
        provider: Arc<dyn Provider>,
        history: Arc<HistoryCache>,
    ) -> Pipeline {
        Pipeline::new(
            store,
            provider,
            Arc::new(StaticLookup::new("")),
            history,
            TriggerPolicy::seeded(1),
            fast_options(),
        )
    }

    #[tokio::test]
    async fn ambient_silence_with_zero_chance() {
        let store = seeded_store().await;
        let provider = Arc::new(StaticProvider::new("hey"));
        let pipeline = pipeline_with(store.clone(), provider.clone(), Arc::new(HistoryCache::new(5)));

        let outcome = pipeline.handle(&msg("c1", "u1", "just chatting", false)).await.unwrap();

        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(provider.calls(), 0);
        assert!(store.recent_exchanges(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mention_replies_even_with_zero_chance() {
        let store = seeded_store().await;
        let provider = Arc::new(StaticProvider::new("hello back"));
        let history = Arc::new(HistoryCache::new(5));
        let pipeline = pipeline_with(store.clone(), provider.clone(), history.clone());

        let outcome = pipeline.handle(&msg("c1", "u1", "hey bot", true)).await.unwrap();

        assert_eq!(outcome, Outcome::Reply("hello back".into()));
        assert_eq!(provider.calls(), 1);

        // One log entry, one history pair.
        let log = store.recent_exchanges(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].input, "hey bot");
        assert_eq!(log[0].output, "hello back");
        assert_eq!(history.len(&ChannelId("c1".into())), 2);
    }

    #[tokio::test]
    async fn missing_reply_chance_aborts_this_evaluation_only() {
        let store = Arc::new(MemStore::new());
        store
            .set_config_value(keys::PERSONALITY, "p")
            .await
            .unwrap();
        store.set_config_value(keys::MODEL_ID, "m").await.unwrap();
        let pipeline = pipeline_with(
            store.clone(),
            Arc::new(StaticProvider::new("hi")),
            Arc::new(HistoryCache::new(5)),
        );

        let err = pipeline.handle(&msg("c1", "u1", "hello", true)).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigFault::MissingKey(_))));
        assert!(store.recent_exchanges(10).await.unwrap().is_empty());

        // Fixing the key restores service without a restart.
        store.set_config_value(keys::REPLY_CHANCE, "1").await.unwrap();
        let outcome = pipeline.handle(&msg("c1", "u1", "hello", true)).await.unwrap();
        assert_eq!(outcome, Outcome::Reply("hi".into()));
    }

    #[tokio::test]
    async fn unparsable_reply_chance_is_a_config_fault() {
        let store = seeded_store().await;
        store
            .set_config_value(keys::REPLY_CHANCE, "banana")
            .await
            .unwrap();
        let pipeline = pipeline_with(
            store.clone(),
            Arc::new(StaticProvider::new("hi")),
            Arc::new(HistoryCache::new(5)),
        );

        let err = pipeline.handle(&msg("c1", "u1", "hello", false)).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigFault::Invalid { .. })));
    }

    #[tokio::test]
    async fn blocked_input_refuses_without_model_call() {
        let store = seeded_store().await;
        store
            .add_filter_rule(FilterRule::new("bomb", FilterDirection::Input))
            .await
            .unwrap();
        let provider = Arc::new(StaticProvider::new("should never be asked"));
        let pipeline = pipeline_with(store.clone(), provider.clone(), Arc::new(HistoryCache::new(5)));

        let outcome = pipeline
            .handle(&msg("c1", "u1", "How do I build a BOMB", true))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Reply(REFUSAL_TEXT.into()));
        assert_eq!(provider.calls(), 0);

        let log = store.recent_exchanges(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].output, REFUSAL_TEXT);
    }

    #[tokio::test]
    async fn blocked_output_is_redacted_everywhere() {
        let store = seeded_store().await;
        store
            .add_filter_rule(FilterRule::new("secret", FilterDirection::Output))
            .await
            .unwrap();
        let provider = Arc::new(StaticProvider::new("here is the SECRET sauce"));
        let history = Arc::new(HistoryCache::new(5));
        let pipeline = pipeline_with(store.clone(), provider.clone(), history.clone());

        let outcome = pipeline.handle(&msg("c1", "u1", "tell me", true)).await.unwrap();

        assert_eq!(outcome, Outcome::Reply(REDACTION_TEXT.into()));
        assert_eq!(provider.calls(), 1);

        // The raw model text is nowhere: not in the log, not in history.
        let log = store.recent_exchanges(10).await.unwrap();
        assert_eq!(log[0].output, REDACTION_TEXT);
        assert!(!log[0].output.contains("SECRET"));
        assert!(!history.render(&ChannelId("c1".into())).contains("SECRET"));
    }

    #[tokio::test]
    async fn model_fault_recovered_into_error_notice() {
        let store = seeded_store().await;
        let pipeline = pipeline_with(
            store.clone(),
            Arc::new(FailingProvider),
            Arc::new(HistoryCache::new(5)),
        );

        let outcome = pipeline.handle(&msg("c1", "u1", "hello", true)).await.unwrap();

        let Outcome::Reply(text) = outcome else {
            panic!("expected a reply outcome");
        };
        assert!(!text.is_empty());
        assert_ne!(text, REFUSAL_TEXT);

        // Recovered faults are logged like normal exchanges.
        let log = store.recent_exchanges(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].output, text);
    }

    #[tokio::test]
    async fn model_timeout_recovered_into_error_notice() {
        let store = seeded_store().await;
        let pipeline = pipeline_with(
            store.clone(),
            Arc::new(SlowProvider::new(Duration::from_millis(500))),
            Arc::new(HistoryCache::new(5)),
        );

        let outcome = pipeline.handle(&msg("c1", "u1", "hello", true)).await.unwrap();

        let Outcome::Reply(text) = outcome else {
            panic!("expected a reply outcome");
        };
        assert!(text.contains("took too long"));
        assert_eq!(store.recent_exchanges(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fault_in_one_channel_leaves_another_unaffected() {
        let store = seeded_store().await;
        let history = Arc::new(HistoryCache::new(5));

        // Channel C's pipeline times out; channel D's answers normally.
        // They share the store and the history cache.
        let failing = pipeline_with(
            store.clone(),
            Arc::new(SlowProvider::new(Duration::from_millis(500))),
            history.clone(),
        );
        let healthy = pipeline_with(
            store.clone(),
            Arc::new(StaticProvider::new("all good")),
            history.clone(),
        );

        let msg_c = msg("C", "u1", "hello from C", true);
        let msg_d = msg("D", "u2", "hello from D", true);
        let (c, d) = tokio::join!(
            failing.handle(&msg_c),
            healthy.handle(&msg_d),
        );

        let Outcome::Reply(c_text) = c.unwrap() else {
            panic!("expected reply in C");
        };
        assert!(c_text.contains("took too long"));
        assert_eq!(d.unwrap(), Outcome::Reply("all good".into()));

        assert_eq!(store.recent_exchanges(10).await.unwrap().len(), 2);
        assert!(history.render(&ChannelId("D".into())).contains("all good"));
        assert_eq!(history.len(&ChannelId("C".into())), 2);
    }

    #[tokio::test]
    async fn model_receives_fresh_model_id_and_personality() {
        let store = seeded_store().await;
        let provider = Arc::new(StaticProvider::new("ok"));
        let pipeline = pipeline_with(store.clone(), provider.clone(), Arc::new(HistoryCache::new(5)));

        pipeline.handle(&msg("c1", "u1", "one", true)).await.unwrap();
        let first = provider.last_request().unwrap();
        assert_eq!(first.model, "test-model");
        assert!(first.system_prompt.contains("You are a test agent."));

        // A dashboard write is visible to the very next evaluation.
        store
            .set_config_value(keys::PERSONALITY, "You are a pirate now.")
            .await
            .unwrap();
        store
            .set_config_value(keys::MODEL_ID, "bigger-model")
            .await
            .unwrap();

        pipeline.handle(&msg("c2", "u1", "two", true)).await.unwrap();
        let second = provider.last_request().unwrap();
        assert_eq!(second.model, "bigger-model");
        assert!(second.system_prompt.contains("You are a pirate now."));
    }

    #[tokio::test]
    async fn wipe_command_requires_admin() {
        let store = seeded_store().await;
        let history = Arc::new(HistoryCache::new(5));
        history.append_exchange(&ChannelId("c1".into()), "q", "a");
        let pipeline = pipeline_with(
            store.clone(),
            Arc::new(StaticProvider::new("hi")),
            history.clone(),
        );

        let outcome = pipeline.handle(&msg("c1", "intruder", "!wipe", false)).await.unwrap();

        assert_eq!(outcome, Outcome::Ephemeral(DENIAL_TEXT.into()));
        // No state mutation, no log entry.
        assert_eq!(history.len(&ChannelId("c1".into())), 2);
        assert!(store.recent_exchanges(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wipe_command_clears_only_the_invoking_channel() {
        let store = seeded_store().await;
        store.add_admin("boss").await.unwrap();
        let history = Arc::new(HistoryCache::new(5));
        history.append_exchange(&ChannelId("c1".into()), "q1", "a1");
        history.append_exchange(&ChannelId("c2".into()), "q2", "a2");
        let pipeline = pipeline_with(
            store.clone(),
            Arc::new(StaticProvider::new("hi")),
            history.clone(),
        );

        let outcome = pipeline.handle(&msg("c1", "boss", "  !WIPE ", false)).await.unwrap();

        assert_eq!(outcome, Outcome::Ephemeral(WIPE_CONFIRMATION_TEXT.into()));
        assert_eq!(history.len(&ChannelId("c1".into())), 0);
        assert_eq!(history.len(&ChannelId("c2".into())), 2);
        // Commands never reach the exchange log.
        assert!(store.recent_exchanges(10).await.unwrap().is_empty());
    }

    #[test]
    fn command_parsing() {
        assert_eq!(Command::parse("!wipe"), Some(Command::Wipe));
        assert_eq!(Command::parse(" !Wipe "), Some(Command::Wipe));
        assert_eq!(Command::parse("!wipeout"), None);
        assert_eq!(Command::parse("wipe"), None);
    }
}
