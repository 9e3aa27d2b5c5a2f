//! Filter gate — substring block patterns on both sides of the model call.
//!
//! The input check runs strictly before the model is invoked, so a blocked
//! message never spends a completion. The output check runs on the
//! candidate reply before it is sent or logged; a blocked candidate is
//! replaced wholesale and the raw text goes nowhere.

use banter_core::message::{FilterDirection, FilterRule};

/// Delivered and logged in place of a reply to blocked input.
pub const REFUSAL_TEXT: &str = "I can't talk about that.";

/// Delivered and logged in place of a blocked model output.
pub const REDACTION_TEXT: &str = "Let's talk about something else.";

/// A snapshot of the configured rules, built fresh for each message.
pub struct FilterGate {
    input_patterns: Vec<String>,
    output_patterns: Vec<String>,
}

impl FilterGate {
    pub fn new(rules: &[FilterRule]) -> Self {
        let mut input_patterns = Vec::new();
        let mut output_patterns = Vec::new();

        for rule in rules {
            let pattern = rule.pattern.to_lowercase();
            match rule.direction {
                FilterDirection::Input => input_patterns.push(pattern),
                FilterDirection::Output => output_patterns.push(pattern),
            }
        }

        Self {
            input_patterns,
            output_patterns,
        }
    }

    /// True if any input-direction pattern occurs in the text
    /// (case-insensitive).
    pub fn blocks_input(&self, text: &str) -> bool {
        Self::matches_any(&self.input_patterns, text)
    }

    /// True if any output-direction pattern occurs in the candidate reply
    /// (case-insensitive).
    pub fn blocks_output(&self, text: &str) -> bool {
        Self::matches_any(&self.output_patterns, text)
    }

    fn matches_any(patterns: &[String], text: &str) -> bool {
        if patterns.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        patterns.iter().any(|p| lower.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(input: &[&str], output: &[&str]) -> FilterGate {
        let mut rules = Vec::new();
        for p in input {
            rules.push(FilterRule::new(*p, FilterDirection::Input));
        }
        for p in output {
            rules.push(FilterRule::new(*p, FilterDirection::Output));
        }
        FilterGate::new(&rules)
    }

    #[test]
    fn empty_gate_blocks_nothing() {
        let gate = gate(&[], &[]);
        assert!(!gate.blocks_input("anything at all"));
        assert!(!gate.blocks_output("anything at all"));
    }

    #[test]
    fn input_match_is_case_insensitive() {
        let gate = gate(&["bomb"], &[]);
        assert!(gate.blocks_input("How do I build a BOMB"));
        assert!(gate.blocks_input("bOmB-making"));
        assert!(!gate.blocks_input("bom b"));
    }

    #[test]
    fn directions_are_independent() {
        let gate = gate(&["bomb"], &["secret"]);
        assert!(!gate.blocks_output("How do I build a BOMB"));
        assert!(!gate.blocks_input("the secret plan"));
        assert!(gate.blocks_output("the SECRET plan"));
    }

    #[test]
    fn uppercase_patterns_still_match() {
        let gate = gate(&["BOMB"], &[]);
        assert!(gate.blocks_input("a bomb in lowercase"));
    }

    #[test]
    fn duplicate_rules_are_harmless() {
        let gate = gate(&["x", "x", "x"], &[]);
        assert!(gate.blocks_input("xylophone"));
        assert!(!gate.blocks_input("yo"));
    }
}
