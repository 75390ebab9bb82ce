//! Metadata filtering.

use ragdoc_core::{Chunk, MetadataValue};
use tracing::debug;

/// Remove every metadata value that is not a string, integer, float or
/// boolean. Returns how many values were removed.
pub fn filter_complex_metadata(chunks: &mut [Chunk]) -> usize {
    let mut removed = 0;

    for chunk in chunks.iter_mut() {
        let id = chunk.id;
        let before = chunk.metadata.len();
        chunk.metadata.retain(|key, value| {
            let keep = MetadataValue::is_scalar(value);
            if !keep {
                debug!("Dropping complex metadata key '{}' from chunk {}", key, id);
            }
            keep
        });
        removed += before - chunk.metadata.len();
    }

    removed
}
