//! Merge engine
//!
//! Type-specific procedures that fold one entity ("source") into another
//! ("target"): every downstream reference is reassigned, duplicate-key
//! conflicts on the target side are resolved proactively, and the source
//! is deleted — all inside a single transaction, so a partial merge is
//! never observable. Merging an entity into itself is rejected before
//! any mutation.
//!
//! Merges are always operator-initiated; nothing here infers them.

mod affiliation;
mod author;
mod country;
mod institution;
mod vocabulary;

pub use affiliation::merge_affiliations;
pub use author::merge_authors;
pub use country::merge_countries;
pub use institution::merge_institutions;
pub use vocabulary::{merge_terms, VocabularyTerm};

use serde::{Deserialize, Serialize};

/// Result of a successful merge. `updated` counts the records actually
/// re-pointed at the target; the exact meaning per entity kind is
/// documented on each merge function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub updated: u64,
}
