//! Language model provider implementations for banter.
//!
//! The only production implementation is the OpenAI-compatible client,
//! which covers Groq, OpenAI, OpenRouter, Ollama, vLLM, and anything else
//! exposing a `/chat/completions` endpoint.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
