//! HTTP client for the read-only SpaceQuest reference catalog.
//!
//! This crate provides:
//! - HTTP client construction with timeouts and default headers
//! - Normalisation of the two list shapes the catalog is known to serve
//!   (a `{count, next, previous, results}` envelope or a bare JSON array)
//! - Typed failures, with cancellation kept distinct from real errors
//! - A mock client with canned responses for controller tests
//!
//! ## Usage
//!
//! ```ignore
//! use spacequest_catalog::{CatalogClient, CatalogClientConfig, ClientTrait, Resource};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let people = client
//!     .fetch_collection::<serde_json::Value>(Resource::People, &Default::default(), &token)
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
mod types;

pub use client::{CatalogClient, Client, ClientTrait};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::CatalogClientError;
pub use mock::{MockClient, MockDataError, MockRequest, MockResponse};
pub use tokio_util::sync::CancellationToken;
pub use types::{CatalogResponse, FetchHints, Resource, UnknownResource};
