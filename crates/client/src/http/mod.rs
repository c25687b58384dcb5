//! HTTP implementation of the [`Transport`](crate::Transport) seam.

mod client;
pub mod concurrency_limiter;
mod response;

pub use client::HttpTransport;
pub use concurrency_limiter::{ConcurrencyLimitConfig, ConcurrencyLimiter};
