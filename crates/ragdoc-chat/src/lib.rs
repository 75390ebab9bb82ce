//! # ragdoc-chat
//!
//! The question answering session: ingest one document, ask questions about
//! it, clear it.
//!
//! ```text
//! ingest(source) → load → split → filter metadata → embed → MemoryStore
//! ask(question)  → retrieve → prompt → LanguageModel → answer
//! ```
//!
//! Asking before anything has been ingested returns [`NO_DOCUMENT_MESSAGE`]
//! instead of an error.

pub mod session;

pub use session::{ChatSession, IngestSummary, NO_DOCUMENT_MESSAGE, SessionConfig};
