//! Core abstractions: quotes, the quote cache, and the collaborators it needs

pub mod cache;
pub mod clock;
pub mod config;
pub mod log;
pub mod quote;
pub mod source;
pub mod storage;

// Re-export main types for cleaner imports
pub use cache::QuoteCache;
pub use clock::{Clock, SystemClock};
pub use quote::{Quote, RawQuoteRecord, RawQuotes, map_quotes};
pub use source::QuoteSource;
pub use storage::KeyValueStorage;
