//! Product catalog access for a cursor-paginated commerce admin API.
//!
//! This crate provides:
//! - Page-number search over a backend that only exposes forward cursors
//! - Safe translation of structured filters into the backend query language
//! - Product lookup with complete variant lists
//! - Product creation across synchronous and asynchronous backend execution
//! - A scripted mock transport for tests and offline demos
//!
//! ## Usage
//!
//! ```ignore
//! use shop_catalog::types::SearchRequest;
//! use shop_catalog::{Catalog, CatalogClientConfig};
//!
//! let config = CatalogClientConfig::new("https://example.myshopify.com", Some(token));
//! let catalog = Catalog::new(config)?;
//!
//! let page = catalog.search(&SearchRequest::default()).await?;
//! let product = catalog.get_by_identifier("8412345").await?;
//! ```

pub mod api_types;
mod catalog;
mod config;
pub mod create;
mod documents;
mod error;
pub mod ids;
mod mock;
mod normalize;
mod pager;
pub mod query;
mod transport;
pub mod types;
pub mod validate;

#[cfg(any(test, feature = "tests"))]
pub mod fixtures;

// Public exports
pub use catalog::Catalog;
pub use config::{CatalogClientConfig, CatalogMockMode, CreationPolicy, DEFAULT_API_VERSION};
pub use create::CreationOutcome;
pub use error::{CatalogError, ConfigError, TransportError, UserError, ValidationErrors, Violation};
pub use mock::{MockDataError, MockResponse, MockTransport, RecordedRequest};
pub use normalize::{normalize, normalize_location};
pub use transport::{GraphqlError, HttpTransport, Transport, TransportTrait};
