//! # ragdoc-embed
//!
//! Local embedding generation for ragdoc.
//!
//! ## Cargo Features
//!
//! - `candle` (default): Enables the Candle ML stack for transformer embeddings
//! - Without `candle`: Only [`HashingEmbedder`] is available
//!
//! ## Model Details
//!
//! | Property | Value |
//! |----------|-------|
//! | Model | `BAAI/bge-small-en-v1.5` |
//! | Dimension | 384 |
//! | Max tokens | 512 |
//! | Pooling | CLS token, L2 normalized |
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CandleEmbedder`] | Transformer embeddings (requires `candle` feature) |
//! | [`HashingEmbedder`] | Deterministic bag-of-words hashing, no model download |

#[cfg(feature = "candle")]
pub mod candle;
#[cfg(feature = "candle")]
pub use candle::CandleEmbedder;

pub mod hashing;

pub use hashing::HashingEmbedder;
