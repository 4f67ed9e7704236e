//! Connection management for pgchat.
//!
//! Turns connection configs into pooled database handles and caches them
//! for a bounded time.

mod cache;
mod factory;

pub use cache::HandleCache;
pub use factory::ConnectionFactory;
