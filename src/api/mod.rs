//! Inoreader reader API access
//!
//! # Module Layout
//!
//! - [`cache`]  -- expiring memoization of idempotent reads
//! - [`client`] -- authenticated request layer and endpoint methods
//! - [`types`]  -- wire models and stream identifiers

pub mod cache;
pub mod client;
pub mod types;

pub use cache::ResponseCache;
pub use client::{Acknowledgement, ApiResponse, InoreaderClient, MarkReadOutcome, SubscriptionEdit};
