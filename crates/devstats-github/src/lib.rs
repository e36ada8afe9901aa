//! GitHub implementation of the DevStats hosting platform.

pub mod client;
pub mod pagination;
mod wire;

pub use client::{GitHubClient, GitHubConfig};
pub use pagination::parse_link_header;
