//! Read-only client for a code-hosting REST API.
//!
//! The assistant reads repository metadata, pull requests, and changed
//! files from the hosting platform. Credentials come from an injected
//! [`TokenProvider`], and responses flow through an explicit
//! [`ResponseCache`] with ETag revalidation.

mod cache;
mod client;

pub use cache::{CacheEntry, ResponseCache};
pub use client::{
    Anonymous, HostingClient, PullRequest, PullRequestFile, Repository, StaticToken, TokenProvider,
};
