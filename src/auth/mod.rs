//! Inoreader OAuth2 authorization
//!
//! # Module Layout
//!
//! - [`flow`]        -- authorization URL, code exchange, refresh, and the
//!   per-attempt state machine
//! - [`token_store`] -- token persistence in an owner-only JSON file

pub mod flow;
pub mod token_store;

pub use flow::{AttemptPhase, AuthorizationAttempt, OAuthFlow};
pub use token_store::{PendingStateStore, TokenRecord, TokenStore};
