//! Ids for new items.

use uuid::Uuid;

/// Returns a fresh item id.
///
/// Ids are UUIDv7 strings: unique for the lifetime of the process and sorting in creation
/// order. Sibling order never depends on them.
pub fn new_id() -> String {
    Uuid::now_v7().hyphenated().to_string()
}
