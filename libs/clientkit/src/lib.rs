//! # ClientKit - API client building blocks
//!
//! Host-agnostic plumbing shared by every API surface of the client:
//!
//! - **Transport**: [`ApiClient`], a JSON HTTP client pinned to one host
//!   that attaches the stored bearer token at call time
//! - **Credentials**: [`TokenStore`], the file-backed token pair every
//!   client reads from
//! - **Caching**: [`QueryCache`] keyed by [`QueryKey`], invalidated through
//!   the [`InvalidationBus`]
//! - **Validation**: field validators for form input
//!
//! Nothing in this crate knows about concrete resources; typed endpoints
//! live in the crates that consume it.

pub mod cache;
pub mod error;
pub mod http;
pub mod token;
pub mod validate;

pub use cache::{Invalidation, InvalidationBus, QueryCache, QueryKey};
pub use error::ApiError;
pub use http::ApiClient;
pub use token::{TokenPair, TokenStore};

// Consumers match on rejection statuses without naming reqwest themselves.
pub use reqwest::StatusCode;
