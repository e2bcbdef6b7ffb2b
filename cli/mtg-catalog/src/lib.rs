//! Blocking HTTP client for the Magic: The Gathering card catalog.
//!
//! This crate provides:
//! - HTTP client construction with configurable timeouts and headers
//! - A filter/query builder with link-header driven depaging
//! - Typed card and set models
//! - Standard format helpers backed by a format-window service
//!
//! ## Usage
//!
//! ```ignore
//! use mtg_catalog::{CardColumn, CatalogClient, CatalogClientConfig};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let cards = client
//!     .cards()
//!     .filter(CardColumn::Set, "KTK")
//!     .filter(CardColumn::Rarity, "Mythic Rare")
//!     .all()?;
//! ```

mod client;
mod config;
mod error;
pub mod link;
mod query;
mod standard;
mod types;

pub use client::CatalogClient;
pub use config::{
    CatalogClientConfig,
    DEFAULT_CATALOG_URL,
    DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_STANDARD_URL,
    DEFAULT_TIMEOUT,
};
pub use error::CatalogClientError;
pub use query::{DEFAULT_PAGE_SIZE, Filters, Query, Resource, ResultsPage};
pub use standard::StandardSet;
pub use types::*;
