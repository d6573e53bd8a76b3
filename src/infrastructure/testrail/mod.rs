//! TestRail catalog adapter
//!
//! Implements the `CatalogClient` port over the TestRail v2 HTTP API with
//! basic auth, a token bucket rate limiter and exponential backoff retries.

pub mod client;
pub mod rate_limiter;
pub mod retry;
pub mod types;

pub use client::{TestRailClient, TestRailConfig};
pub use rate_limiter::TokenBucketRateLimiter;
pub use retry::RetryPolicy;
