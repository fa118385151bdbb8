//! Fee-quote: shapes of fetched fee data and a TTL cache for them
//!
//! Fetching is left to the caller; this crate only describes what a quote
//! looks like and keeps fetched quotes fresh.

pub mod cache;
pub mod key;
pub mod quote;

pub use cache::{Clock, ManualClock, QuoteCache, SystemClock, Timestamped};
pub use key::QuoteKey;
pub use quote::{BridgeFeeQuote, EibcQuote, FeeQuote, IgpQuote};
