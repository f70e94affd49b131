//! Domain collections: deduplicated page-key sets and sorted revision timelines.

pub mod page_key_set;
pub mod revision_keys;

pub use page_key_set::PageKeySet;
pub use revision_keys::RevisionKeys;
