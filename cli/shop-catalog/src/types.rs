//! Catalog interaction types.
//!
//! These types represent the domain model for catalog operations: the
//! requests callers hand to [crate::Catalog] and the normalized records it
//! hands back. Backend wire shapes live in [crate::api_types].

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Search requests
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A structured product search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub filters: SearchFilters,
    /// Only the first entry is applied, see [crate::query::map_sort].
    #[serde(default)]
    pub sort: Vec<SortEntry>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            page: default_page(),
            limit: default_limit(),
            filters: SearchFilters::default(),
            sort: Vec::new(),
        }
    }
}

impl SearchRequest {
    /// The free text part of the query, if it has any content.
    pub fn free_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortEntry {
    pub field: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

/// The allow-listed fields a search can be sorted by.
///
/// Unknown names fail to deserialize, so they never reach query
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Title,
    Vendor,
    ProductType,
    InventoryTotal,
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    Relevance,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sort field '{0}'")]
pub struct UnknownSortField(pub String);

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "id" => SortField::Id,
            "title" => SortField::Title,
            "vendor" => SortField::Vendor,
            "productType" | "product_type" | "category" => SortField::ProductType,
            "inventoryTotal" | "inventory_total" => SortField::InventoryTotal,
            "createdAt" | "created_at" => SortField::CreatedAt,
            "updatedAt" | "updated_at" => SortField::UpdatedAt,
            "publishedAt" | "published_at" => SortField::PublishedAt,
            "relevance" => SortField::Relevance,
            other => return Err(UnknownSortField(other.to_string())),
        };
        Ok(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

// ---------------------------------------------------------------------------
// Result / pagination types
// ---------------------------------------------------------------------------

/// One page of results with classic page-number metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// A page past the end of the data.
    pub fn empty(total: u64, page: u32, limit: u32) -> Self {
        Self {
            items: Vec::new(),
            meta: PageMeta {
                total,
                page,
                limit,
                has_next: false,
                has_prev: page > 1,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Unified records
// ---------------------------------------------------------------------------

/// The normalized, source independent product representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price_range: PriceRange,
    /// The primary image only; never more than one entry.
    pub images: Vec<Image>,
    pub variants: Vec<Variant>,
    pub handle: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub tags: BTreeSet<String>,
    pub sync_metadata: SyncMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub available: bool,
    pub inventory_quantity: Option<u64>,
    pub options: Vec<VariantOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// The backend's global id for the record.
    pub source_id: String,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
}

/// An inventory location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// Product creation
// ---------------------------------------------------------------------------

/// Input for creating one product with its options, variants and media.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub title: String,
    #[serde(default)]
    pub description_html: Option<String>,
    /// Stored as the product type.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    pub values: Vec<OptionValueInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValueInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(default)]
    pub option_values: Vec<VariantOptionValue>,
    pub price: f64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub file: Option<FileInput>,
    #[serde(default)]
    pub inventory_item: Option<InventoryItemInput>,
    #[serde(default)]
    pub inventory_quantities: Vec<InventoryQuantityInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOptionValue {
    pub option_name: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryItemInput {
    #[serde(default)]
    pub tracked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuantityInput {
    /// Local or global location id.
    pub location_id: String,
    pub quantity: i64,
}

/// A media reference, identified by its source url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    pub original_source: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub content_type: FileContentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileContentType {
    #[default]
    Image,
    Video,
    ExternalVideo,
    #[serde(rename = "MODEL_3D")]
    Model3d,
    File,
}

/// Status of an asynchronous product set operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Created,
    Active,
    Complete,
    #[serde(other)]
    Unknown,
}

impl OperationStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, OperationStatus::Complete)
    }
}

impl Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            OperationStatus::Created => "CREATED",
            OperationStatus::Active => "ACTIVE",
            OperationStatus::Complete => "COMPLETE",
            OperationStatus::Unknown => "UNKNOWN",
        };
        f.write_str(status)
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
