//! Language model clients for ragdoc.
//!
//! [`OllamaClient`] sends a filled prompt to an Ollama server's chat endpoint
//! as a single user message and returns the reply text.

pub mod ollama;

pub use ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaClient, OllamaConfig};
