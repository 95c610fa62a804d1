//! Clio API client.
//!
//! - `RateLimiter` enforcing self-imposed per-minute and per-hour quotas
//! - `RetryState` deciding throttle / backoff / give-up per attempt
//! - `ApiClient` issuing authenticated requests through both
//! - cursor and page-number pagination as a lazy item stream
//! - `ClioApi` resource wrapper (contacts, matters, activities, ...)

pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod resources;
pub mod retry;

pub use client::{ApiClient, ApiResponse, method_for, within};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use pagination::{MAX_PAGE_SIZE, Page, PageCursor};
pub use rate_limit::{RateLimiter, RateWindow};
pub use resources::{ClioApi, Resource};
pub use retry::{Decision, Outcome, RetryState};
