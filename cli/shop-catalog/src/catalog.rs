//! The catalog facade, the single entry point for callers.

use std::error::Error;
use std::fmt::Debug;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::api_types::{
    LocationsData,
    ProductData,
    ProductVariantsData,
    ProductsCountData,
    ProductsData,
    ProductsPageInfoData,
    ShopData,
};
use crate::config::{CatalogClientConfig, CreationPolicy};
use crate::create::create_product;
use crate::documents::{self, OVERFLOW_PAGE_SIZE, SEARCH_VARIANTS};
use crate::error::{CatalogError, ConfigError};
use crate::ids::{ResourceKind, ensure_resource_id};
use crate::normalize::{normalize, normalize_location};
use crate::pager::{collect_remaining, into_page, seek_page};
use crate::query::{build_query, map_sort};
use crate::transport::{Transport, TransportTrait};
use crate::types::{
    CreateRequest,
    HealthReport,
    HealthStatus,
    Location,
    Page,
    SearchRequest,
    UnifiedRecord,
};
use crate::validate::{validate_create, validate_search};

/// Product search, lookup and creation against one store.
///
/// A catalog owns its transport for its whole lifetime and reuses it for
/// every call. Calls are independent of each other; nothing is cached.
pub struct Catalog {
    transport: Transport,
    creation: CreationPolicy,
}

impl Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("transport", &self.transport)
            .field("creation", &self.creation)
            .finish()
    }
}

impl Catalog {
    /// Create a catalog from configuration.
    ///
    /// Fails with [ConfigError::MissingAccessToken] when talking to a real
    /// store without credentials, and with
    /// [ConfigError::InvalidCreationPolicy] for a zero poll interval.
    pub fn new(config: CatalogClientConfig) -> Result<Self, ConfigError> {
        config.creation.check()?;
        let transport = Transport::from_config(&config)?;
        Ok(Self::with_transport(transport, config.creation))
    }

    pub fn with_transport(transport: Transport, creation: CreationPolicy) -> Self {
        Self {
            transport,
            creation,
        }
    }

    /// Search products, returning page `request.page` of the results.
    ///
    /// A page past the end of the results is empty rather than an error.
    #[instrument(skip_all, fields(page = request.page, limit = request.limit))]
    pub async fn search(&self, request: &SearchRequest) -> Result<Page<UnifiedRecord>, CatalogError> {
        validate_search(request).map_err(CatalogError::InvalidRequest)?;

        let query = Some(build_query(request)).filter(|query| !query.is_empty());
        let sort = map_sort(request);
        debug!(?query, sort_key = sort.sort_key, reverse = sort.reverse, "searching products");

        let count: ProductsCountData = self
            .transport
            .query(documents::PRODUCTS_COUNT, json!({ "query": query }))
            .await?;
        let total = count.products_count.map_or(0, |count| count.count);

        let listing = |cursor: Option<String>| {
            json!({
                "first": request.limit,
                "after": cursor,
                "query": query,
                "sortKey": sort.sort_key,
                "reverse": sort.reverse,
            })
        };

        let connection = seek_page(
            request.page,
            |cursor| {
                let variables = listing(cursor);
                async move {
                    let data: ProductsPageInfoData = self
                        .transport
                        .query(documents::PRODUCTS_PAGE_INFO, variables)
                        .await?;
                    Ok::<_, CatalogError>(data.products.page_info)
                }
            },
            |cursor| {
                let mut variables = listing(cursor);
                variables["variantsFirst"] = json!(SEARCH_VARIANTS);
                async move {
                    let data: ProductsData = self
                        .transport
                        .query(&documents::SEARCH_PRODUCTS, variables)
                        .await?;
                    Ok::<_, CatalogError>(data.products)
                }
            },
        )
        .await?;

        let page = into_page(connection, total, request.page, request.limit);
        let items = page
            .items
            .into_iter()
            .map(normalize)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(total, items = items.len(), has_next = page.meta.has_next, "search finished");
        Ok(Page {
            items,
            meta: page.meta,
        })
    }

    /// Look up one product by numeric or global id, with all its variants.
    ///
    /// Handles and other slugs are not resolved.
    #[instrument(skip(self))]
    pub async fn get_by_identifier(&self, identifier: &str) -> Result<UnifiedRecord, CatalogError> {
        let id = ensure_resource_id(identifier, ResourceKind::Product)?;

        let data: ProductData = self
            .transport
            .query(
                &documents::PRODUCT_DETAIL,
                json!({ "id": id, "variantsFirst": OVERFLOW_PAGE_SIZE }),
            )
            .await?;
        let mut product = data
            .product
            .ok_or_else(|| CatalogError::ProductNotFound(id.local().to_string()))?;

        let first_page = &product.variants.page_info;
        if first_page.has_next_page {
            let after = first_page.end_cursor.clone().ok_or_else(|| {
                CatalogError::ProtocolViolation(
                    "variants hasNextPage is set but endCursor is missing".to_string(),
                )
            })?;
            debug!(loaded = product.variants.nodes.len(), "fetching remaining variants");

            let remaining = collect_remaining(Some(after), |cursor| {
                let variables = json!({ "id": id, "first": OVERFLOW_PAGE_SIZE, "after": cursor });
                async move {
                    let data: ProductVariantsData = self
                        .transport
                        .query(&documents::PRODUCT_VARIANTS, variables)
                        .await?;
                    let product = data.product.ok_or_else(|| {
                        CatalogError::ProtocolViolation(
                            "product disappeared while fetching its variants".to_string(),
                        )
                    })?;
                    Ok::<_, CatalogError>(product.variants)
                }
            })
            .await?;
            product.variants.nodes.extend(remaining);
        }

        if product.variants.nodes.is_empty() {
            return Err(CatalogError::ProtocolViolation(format!(
                "product {id} has no variants"
            )));
        }
        if let Some(expected) = product.variants_count {
            if expected.count != product.variants.nodes.len() as u64 {
                warn!(
                    expected = expected.count,
                    loaded = product.variants.nodes.len(),
                    "variant count changed while loading product"
                );
            }
        }

        normalize(product)
    }

    /// All inventory locations of the store.
    #[instrument(skip_all)]
    pub async fn list_locations(&self) -> Result<Vec<Location>, CatalogError> {
        let locations = collect_remaining(None, |cursor| {
            let variables = json!({ "first": OVERFLOW_PAGE_SIZE, "after": cursor });
            async move {
                let data: LocationsData = self
                    .transport
                    .query(documents::LOCATIONS, variables)
                    .await?;
                Ok::<_, CatalogError>(data.locations)
            }
        })
        .await?;

        debug!(count = locations.len(), "listed locations");
        Ok(locations.into_iter().map(normalize_location).collect())
    }

    /// Create a product and return its local id.
    ///
    /// Equivalent to [Catalog::create_with_cancellation] with a token that
    /// is never cancelled.
    pub async fn create(&self, request: &CreateRequest) -> Result<String, CatalogError> {
        self.create_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Create a product, giving up early once `cancel` is cancelled.
    ///
    /// The request is validated before anything is sent. Waiting for an
    /// asynchronous creation is bounded by the configured [CreationPolicy].
    #[instrument(skip_all, fields(title = %request.title, variants = request.variants.len()))]
    pub async fn create_with_cancellation(
        &self,
        request: &CreateRequest,
        cancel: &CancellationToken,
    ) -> Result<String, CatalogError> {
        validate_create(request).map_err(CatalogError::InvalidRequest)?;
        let product_id = create_product(&self.transport, request, self.creation, cancel).await?;
        debug!(%product_id, "product created");
        Ok(product_id)
    }

    /// Probe the backend with a minimal read.
    ///
    /// Failures are reported in the returned [HealthReport], never as an
    /// error.
    #[instrument(skip_all)]
    pub async fn check_health(&self) -> HealthReport {
        let data = match self.transport.execute(documents::SHOP_HEALTH, json!({})).await {
            Ok(data) => data,
            Err(err) => {
                debug!(error = %err, "health check failed");
                return HealthReport {
                    status: HealthStatus::Error,
                    message: Some(error_chain(&err)),
                };
            },
        };

        match serde_json::from_value::<ShopData>(data) {
            Ok(ShopData { shop: Some(shop) }) => {
                debug!(shop = %shop.name, "backend is healthy");
                HealthReport {
                    status: HealthStatus::Healthy,
                    message: None,
                }
            },
            _ => HealthReport {
                status: HealthStatus::Warning,
                message: Some("backend answered without shop data".to_string()),
            },
        }
    }
}

/// Render an error together with all of its sources.
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
