//! Trigger policy — should the agent respond to this message at all?
//!
//! Respond if the agent was mentioned, or if a fresh uniform draw in [0,1)
//! lands strictly below the configured reply chance. No state is retained
//! between evaluations beyond the RNG itself, which is seedable so tests
//! can pin the draw sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub struct TriggerPolicy {
    rng: Mutex<StdRng>,
}

impl TriggerPolicy {
    /// Policy with an OS-entropy RNG (production).
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Policy with a fixed seed (deterministic tests).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Decide with a fresh draw from this policy's RNG.
    pub fn should_reply(&self, mentioned: bool, reply_chance: f64) -> bool {
        if mentioned {
            return true;
        }
        let draw = self
            .rng
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .random::<f64>();
        Self::decide(mentioned, reply_chance, draw)
    }

    /// The pure decision rule, with the draw made explicit.
    pub fn decide(mentioned: bool, reply_chance: f64, draw: f64) -> bool {
        mentioned || draw < reply_chance
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self::new()
    }
}
