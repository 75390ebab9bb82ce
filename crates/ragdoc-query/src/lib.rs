//! Retrieval and prompt assembly for ragdoc.

pub mod prompt;
pub mod retriever;

pub use prompt::PromptTemplate;
pub use retriever::{Retriever, RetrieverConfig, format_context};
