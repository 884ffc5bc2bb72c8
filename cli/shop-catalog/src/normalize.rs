//! Mapping of backend records onto [UnifiedRecord].

use std::collections::BTreeSet;

use tracing::warn;

use crate::api_types::{
    MediaContentType,
    RawImage,
    RawLocation,
    RawMedia,
    RawMoney,
    RawProduct,
    RawVariant,
};
use crate::error::CatalogError;
use crate::ids::to_local;
use crate::types::{
    Image,
    Location,
    PriceRange,
    SyncMetadata,
    SyncStatus,
    UnifiedRecord,
    Variant,
    VariantOption,
};

/// Option name under which a variant's SKU is exposed.
const SKU_OPTION: &str = "SKU";

/// Normalize a product and all variants attached to it.
///
/// Variants keep the order they were returned in. Callers that need the
/// complete variant list append overflow pages to `raw.variants.nodes`
/// before calling this.
pub fn normalize(raw: RawProduct) -> Result<UnifiedRecord, CatalogError> {
    let price_range = price_range(
        &raw.id,
        &raw.price_range_v2.min_variant_price,
        &raw.price_range_v2.max_variant_price,
    )?;
    let media = raw.media.as_ref().map(|media| media.nodes.as_slice());
    let images = primary_image(raw.featured_media.as_ref(), media)
        .into_iter()
        .collect();
    let variants = raw
        .variants
        .nodes
        .into_iter()
        .map(normalize_variant)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UnifiedRecord {
        id: to_local(&raw.id),
        title: raw.title,
        description: raw.description.filter(|description| !description.is_empty()),
        price_range,
        images,
        variants,
        handle: raw.handle,
        category: raw.product_type.filter(|product_type| !product_type.is_empty()),
        vendor: raw.vendor.filter(|vendor| !vendor.is_empty()),
        tags: raw.tags.into_iter().collect::<BTreeSet<_>>(),
        sync_metadata: SyncMetadata {
            source_id: raw.id,
            sync_status: SyncStatus::Synced,
        },
    })
}

pub fn normalize_location(raw: RawLocation) -> Location {
    let address = raw
        .address
        .map(|address| address.formatted.join(", "))
        .filter(|address| !address.is_empty());

    Location {
        id: to_local(&raw.id),
        name: raw.name,
        is_active: raw.is_active,
        address,
    }
}

fn normalize_variant(raw: RawVariant) -> Result<Variant, CatalogError> {
    let price = parse_amount(&raw.price, &raw.id)?;

    let mut options = raw
        .selected_options
        .into_iter()
        .map(|option| VariantOption {
            name: option.name,
            value: option.value,
        })
        .collect::<Vec<_>>();
    if let Some(sku) = raw.sku.filter(|sku| !sku.trim().is_empty()) {
        options.push(VariantOption {
            name: SKU_OPTION.to_string(),
            value: sku,
        });
    }

    Ok(Variant {
        id: to_local(&raw.id),
        title: raw.title,
        price,
        available: raw.available_for_sale,
        // untracked or oversold variants can report negative quantities
        inventory_quantity: raw.inventory_quantity.map(|quantity| quantity.max(0) as u64),
        options,
    })
}

fn price_range(
    product_id: &str,
    min: &RawMoney,
    max: &RawMoney,
) -> Result<PriceRange, CatalogError> {
    let min_amount = parse_amount(&min.amount, product_id)?;
    let max_amount = parse_amount(&max.amount, product_id)?;

    if min_amount > max_amount {
        return Err(CatalogError::ProtocolViolation(format!(
            "price range of {product_id} has min {min_amount} above max {max_amount}"
        )));
    }

    if min.currency_code != max.currency_code {
        warn!(
            product_id,
            min_currency = %min.currency_code,
            max_currency = %max.currency_code,
            "price range currencies differ, using the minimum price currency"
        );
    }

    Ok(PriceRange {
        min: min_amount,
        max: max_amount,
        currency: min.currency_code.clone(),
    })
}

fn parse_amount(amount: &str, owner: &str) -> Result<f64, CatalogError> {
    amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| {
            CatalogError::ProtocolViolation(format!("invalid amount '{amount}' on {owner}"))
        })
}

/// Pick the one image representing a product.
///
/// In order of preference: the featured media when it is an image, the
/// first image media, the preview of the first media of any kind.
fn primary_image(featured: Option<&RawMedia>, media: Option<&[RawMedia]>) -> Option<Image> {
    let media = media.unwrap_or_default();

    featured
        .filter(|featured| featured.media_content_type == MediaContentType::Image)
        .and_then(image_of)
        .or_else(|| {
            media
                .iter()
                .find(|entry| entry.media_content_type == MediaContentType::Image)
                .and_then(image_of)
        })
        .or_else(|| {
            media
                .first()
                .and_then(|entry| entry.preview.as_ref()?.image.as_ref())
                .map(|image| to_image(image, None))
        })
}

/// The full image of an image media, falling back to its preview.
fn image_of(media: &RawMedia) -> Option<Image> {
    media
        .image
        .as_ref()
        .or_else(|| media.preview.as_ref()?.image.as_ref())
        .map(|image| to_image(image, media.alt.as_deref()))
}

fn to_image(image: &RawImage, media_alt: Option<&str>) -> Image {
    let alt_text = image
        .alt_text
        .as_deref()
        .or(media_alt)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string);

    Image {
        url: image.url.clone(),
        alt_text,
    }
}
