//! Text splitting for ragdoc.
//!
//! [`RecursiveCharacterSplitter`] cuts text at the coarsest separator that
//! keeps pieces under the chunk size, and [`split_documents`] turns loaded
//! documents into chunks that keep their document's metadata.

pub mod documents;
pub mod recursive;

pub use documents::split_documents;
pub use recursive::RecursiveCharacterSplitter;
