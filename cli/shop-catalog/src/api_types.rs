//! Wire shapes of the admin GraphQL API.
//!
//! Only the fields requested by [crate::documents] are modeled. Response
//! types are lenient about missing optional fields; input types skip `None`
//! fields so the backend applies its own defaults.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::error::UserError;
use crate::types::{FileContentType, OperationStatus};

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// A cursor connection using the `nodes` shorthand.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    pub page_info: PageInfo,
}

/// A connection where only `pageInfo` was requested.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoOnly {
    pub page_info: PageInfo,
}

/// A connection where only `nodes` were requested.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeList<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Count {
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdOnly {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price_range_v2: RawPriceRange,
    #[serde(default)]
    pub featured_media: Option<RawMedia>,
    #[serde(default)]
    pub media: Option<NodeList<RawMedia>>,
    pub variants: Connection<RawVariant>,
    #[serde(default)]
    pub variants_count: Option<Count>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceRange {
    pub min_variant_price: RawMoney,
    pub max_variant_price: RawMoney,
}

/// Money as returned by the backend, a decimal string amount.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMoney {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedia {
    pub media_content_type: MediaContentType,
    #[serde(default)]
    pub alt: Option<String>,
    /// Only present for image media.
    #[serde(default)]
    pub image: Option<RawImage>,
    #[serde(default)]
    pub preview: Option<RawPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaContentType {
    Image,
    Video,
    ExternalVideo,
    #[serde(rename = "MODEL_3D")]
    Model3d,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImage {
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPreview {
    #[serde(default)]
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    pub id: String,
    pub title: String,
    pub price: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub available_for_sale: bool,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub selected_options: Vec<RawSelectedOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSelectedOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub address: Option<RawAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAddress {
    #[serde(default)]
    pub formatted: Vec<String>,
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: Connection<RawProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsPageInfoData {
    pub products: PageInfoOnly,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsCountData {
    pub products_count: Option<Count>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product: Option<RawProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ProductVariantsData {
    pub product: Option<VariantsOnly>,
}

#[derive(Debug, Deserialize)]
pub struct VariantsOnly {
    pub variants: Connection<RawVariant>,
}

#[derive(Debug, Deserialize)]
pub struct LocationsData {
    pub locations: Connection<RawLocation>,
}

#[derive(Debug, Deserialize)]
pub struct ShopData {
    pub shop: Option<RawShop>,
}

#[derive(Debug, Deserialize)]
pub struct RawShop {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Product creation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSetData {
    pub product_set: Option<ProductSetPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSetPayload {
    #[serde(default)]
    pub product: Option<IdOnly>,
    #[serde(default)]
    pub product_set_operation: Option<RawOperation>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    pub id: String,
    pub status: OperationStatus,
    #[serde(default)]
    pub product: Option<IdOnly>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOperationData {
    pub product_operation: Option<RawOperation>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSetInput {
    pub title: String,
    pub description_html: Option<String>,
    pub product_type: Option<String>,
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub product_options: Vec<OptionSetInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantSetInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileSetInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSetInput {
    pub name: String,
    pub position: u32,
    pub values: Vec<NameInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameInput {
    pub name: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSetInput {
    pub option_values: Vec<VariantOptionValueSetInput>,
    /// Decimal string with two fraction digits.
    pub price: String,
    pub inventory_item: Option<InventoryItemSetInput>,
    pub file: Option<FileSetInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inventory_quantities: Vec<InventoryQuantitySetInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOptionValueSetInput {
    pub option_name: String,
    pub name: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryItemSetInput {
    pub sku: Option<String>,
    pub tracked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuantitySetInput {
    pub location_id: String,
    pub name: &'static str,
    pub quantity: i64,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSetInput {
    pub original_source: String,
    pub alt: Option<String>,
    pub content_type: FileContentType,
}
