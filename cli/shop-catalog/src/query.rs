//! Translation of structured searches into the backend's query syntax.
//!
//! The backend accepts a whitespace separated list of terms, where a term is
//! either free text or a `field:value` filter. Caller supplied values are
//! always quoted and escaped so they cannot introduce extra terms.

use tracing::debug;

use crate::types::{SearchRequest, SortDirection, SortField};

/// Sort arguments for the products listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub sort_key: &'static str,
    pub reverse: bool,
}

/// Build the search query string for `request`.
///
/// Terms are emitted in a fixed order (free text, category, vendor, minimum
/// price, maximum price, availability) so equal requests always produce
/// equal strings.
pub fn build_query(request: &SearchRequest) -> String {
    let mut tokens = Vec::new();
    let filters = &request.filters;

    if let Some(text) = request.free_text() {
        tokens.push(escape_free_text(text));
    }
    if let Some(category) = non_blank(filters.category.as_deref()) {
        tokens.push(format!("product_type:{}", quote(category)));
    }
    if let Some(vendor) = non_blank(filters.vendor.as_deref()) {
        tokens.push(format!("vendor:{}", quote(vendor)));
    }
    if let Some(min) = filters.price_min.filter(|min| min.is_finite()) {
        tokens.push(format!("variants.price:>={min}"));
    }
    if let Some(max) = filters.price_max.filter(|max| max.is_finite()) {
        tokens.push(format!("variants.price:<={max}"));
    }
    if filters.available_only {
        tokens.push("inventory_total:>0".to_string());
    }

    tokens.join(" ")
}

/// Map the requested ordering onto the backend's sort key.
///
/// Only the first sort entry is applied. Without any entry, results are
/// ordered by relevance when free text is present and by id otherwise.
pub fn map_sort(request: &SearchRequest) -> SortSpec {
    if request.sort.len() > 1 {
        debug!(
            entries = request.sort.len(),
            "multi-key sort requested, only the first entry is applied"
        );
    }

    let Some(entry) = request.sort.first() else {
        let sort_key = if request.free_text().is_some() {
            "RELEVANCE"
        } else {
            "ID"
        };
        return SortSpec {
            sort_key,
            reverse: false,
        };
    };

    SortSpec {
        sort_key: sort_key(entry.field),
        reverse: entry.direction == SortDirection::Desc,
    }
}

fn sort_key(field: SortField) -> &'static str {
    match field {
        SortField::Id => "ID",
        SortField::Title => "TITLE",
        SortField::Vendor => "VENDOR",
        SortField::ProductType => "PRODUCT_TYPE",
        SortField::InventoryTotal => "INVENTORY_TOTAL",
        SortField::CreatedAt => "CREATED_AT",
        SortField::UpdatedAt => "UPDATED_AT",
        SortField::PublishedAt => "PUBLISHED_AT",
        SortField::Relevance => "RELEVANCE",
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Free text keeps its search semantics, only double quotes are escaped.
fn escape_free_text(text: &str) -> String {
    text.replace('"', "\\\"")
}

/// Wrap a filter value in single quotes.
///
/// Backslashes are escaped first so a trailing backslash cannot escape the
/// closing quote.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
