//! Crawl frontier
//!
//! The frontier is the crawl's source of truth: which URLs are waiting,
//! in what order, which have been visited or failed, and which have ever
//! been seen. Its full state can be exported as a [`FrontierSnapshot`] and
//! imported again, which is what checkpoints are built on.

mod entry;
mod fingerprint;
mod queue;
mod scope;
mod snapshot;

pub use entry::FrontierEntry;
pub use fingerprint::Fingerprint;
pub use queue::{EnqueueOutcome, Frontier, SkipReason};
pub use scope::CrawlScope;
pub use snapshot::{FrontierSnapshot, FrontierStats};
