//! Catalog service client: reads user entities and upserts merged ones.

pub mod client;

pub use client::{CatalogClient, CatalogConfig};
