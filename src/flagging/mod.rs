//! Batched suspicious-expense flagging.
//!
//! - [`orchestrator`]: splits an expense set into batches, calls the
//!   classifier per batch, merges results, and caches them by fingerprint.
//! - [`normalize`]: maps raw classifier output onto exactly the ids of a
//!   batch, defaulting anything unreadable to `Normal`.
//! - [`cache`]: order-independent fingerprints and the expiring result cache.

pub mod cache;
pub mod normalize;
pub mod orchestrator;

pub use cache::{FlagCache, Fingerprint};
pub use orchestrator::FlagOrchestrator;
