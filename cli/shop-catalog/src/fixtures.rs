//! Canned backend payloads for tests of this crate and its consumers.

use std::ops::Range;

use serde_json::{Value, json};

/// A variant node with local id `id`, priced at `id` cents plus one unit.
pub fn variant_json(id: u64) -> Value {
    json!({
        "id": format!("gid://shopify/ProductVariant/{id}"),
        "title": format!("Variant {id}"),
        "price": format!("{}.{:02}", 1 + id / 100, id % 100),
        "sku": format!("SKU-{id}"),
        "availableForSale": true,
        "inventoryQuantity": 3,
        "selectedOptions": [{ "name": "Number", "value": id.to_string() }]
    })
}

/// A connection over `nodes`. A cursor marks that more pages follow.
pub fn connection_json(nodes: Vec<Value>, end_cursor: Option<&str>) -> Value {
    json!({
        "nodes": nodes,
        "pageInfo": {
            "hasNextPage": end_cursor.is_some(),
            "hasPreviousPage": false,
            "endCursor": end_cursor
        }
    })
}

/// A product node carrying the variants in `variants`, all on one page.
pub fn product_json(id: u64, variants: Range<u64>) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{id}"),
        "title": format!("Product {id}"),
        "description": "A product",
        "handle": format!("product-{id}"),
        "productType": "Posters",
        "vendor": "Acme",
        "tags": ["paper"],
        "priceRangeV2": {
            "minVariantPrice": { "amount": "1.00", "currencyCode": "USD" },
            "maxVariantPrice": { "amount": "9.99", "currencyCode": "USD" }
        },
        "featuredMedia": {
            "mediaContentType": "IMAGE",
            "alt": "front",
            "image": { "url": format!("https://cdn.example.com/{id}.png"), "altText": null },
            "preview": null
        },
        "media": { "nodes": [] },
        "variantsCount": { "count": variants.end - variants.start },
        "variants": connection_json(variants.map(variant_json).collect(), None)
    })
}
