//! The message-to-reply pipeline for banter.
//!
//! This crate owns the end-to-end "message in → reply out, or silence" flow
//! and the concurrently-shared mutable state behind it:
//!
//! - **Trigger policy** — mention or probabilistic ambient reply
//! - **Filter gate** — input and output block patterns
//! - **Rolling history** — per-channel bounded window of recent turns
//! - **Context assembler** — personality + memories + history + web lookup
//! - **Pipeline** — the per-message state machine, including privileged
//!   commands
//! - **Intake loop** — one spawned task per inbound message
//!
//! Configuration, filter rules, memory facts, and admin identities are
//! re-read from the record store on every message; nothing durable is ever
//! cached across a suspension point.

pub mod context;
pub mod gate;
pub mod history;
pub mod pipeline;
pub mod runtime;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{ContextAssembler, PromptParts, wants_lookup};
pub use gate::{FilterGate, REDACTION_TEXT, REFUSAL_TEXT};
pub use history::{DEFAULT_WINDOW, HistoryCache};
pub use pipeline::{Outcome, Pipeline, PipelineOptions};
pub use runtime::run_intake;
pub use trigger::TriggerPolicy;
