//! GraphQL documents sent to the admin API.

use std::sync::LazyLock;

use indoc::indoc;

/// Page size for cursor walks over secondary lists (variants, locations).
pub(crate) const OVERFLOW_PAGE_SIZE: u32 = 250;

/// Variants embedded in each search result.
pub(crate) const SEARCH_VARIANTS: u32 = 20;

const FRAGMENTS: &str = indoc! {"
    fragment MediaFields on Media {
      mediaContentType
      alt
      preview {
        image {
          url
          altText
        }
      }
      ... on MediaImage {
        image {
          url
          altText
        }
      }
    }

    fragment VariantFields on ProductVariant {
      id
      title
      price
      sku
      availableForSale
      inventoryQuantity
      selectedOptions {
        name
        value
      }
    }

    fragment ProductFields on Product {
      id
      title
      description
      handle
      productType
      vendor
      tags
      priceRangeV2 {
        minVariantPrice {
          amount
          currencyCode
        }
        maxVariantPrice {
          amount
          currencyCode
        }
      }
      featuredMedia {
        ...MediaFields
      }
      media(first: 10) {
        nodes {
          ...MediaFields
        }
      }
    }
"};

pub(crate) static SEARCH_PRODUCTS: LazyLock<String> = LazyLock::new(|| {
    let query = indoc! {"
        query SearchProducts($first: Int!, $after: String, $query: String, $sortKey: ProductSortKeys, $reverse: Boolean, $variantsFirst: Int!) {
          products(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) {
            nodes {
              ...ProductFields
              variants(first: $variantsFirst) {
                nodes {
                  ...VariantFields
                }
                pageInfo {
                  hasNextPage
                  endCursor
                }
              }
            }
            pageInfo {
              hasNextPage
              hasPreviousPage
              endCursor
            }
          }
        }
    "};
    format!("{query}\n{FRAGMENTS}")
});

pub(crate) const PRODUCTS_PAGE_INFO: &str = indoc! {"
    query ProductsPageInfo($first: Int!, $after: String, $query: String, $sortKey: ProductSortKeys, $reverse: Boolean) {
      products(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) {
        pageInfo {
          hasNextPage
          hasPreviousPage
          endCursor
        }
      }
    }
"};

pub(crate) const PRODUCTS_COUNT: &str = indoc! {"
    query ProductsCount($query: String) {
      productsCount(query: $query, limit: null) {
        count
      }
    }
"};

pub(crate) static PRODUCT_DETAIL: LazyLock<String> = LazyLock::new(|| {
    let query = indoc! {"
        query ProductDetail($id: ID!, $variantsFirst: Int!) {
          product(id: $id) {
            ...ProductFields
            variantsCount {
              count
            }
            variants(first: $variantsFirst) {
              nodes {
                ...VariantFields
              }
              pageInfo {
                hasNextPage
                endCursor
              }
            }
          }
        }
    "};
    format!("{query}\n{FRAGMENTS}")
});

pub(crate) static PRODUCT_VARIANTS: LazyLock<String> = LazyLock::new(|| {
    let query = indoc! {"
        query ProductVariants($id: ID!, $first: Int!, $after: String) {
          product(id: $id) {
            variants(first: $first, after: $after) {
              nodes {
                ...VariantFields
              }
              pageInfo {
                hasNextPage
                endCursor
              }
            }
          }
        }
    "};
    format!("{query}\n{FRAGMENTS}")
});

pub(crate) const LOCATIONS: &str = indoc! {"
    query Locations($first: Int!, $after: String) {
      locations(first: $first, after: $after) {
        nodes {
          id
          name
          isActive
          address {
            formatted
          }
        }
        pageInfo {
          hasNextPage
          endCursor
        }
      }
    }
"};

pub(crate) const SHOP_HEALTH: &str = indoc! {"
    query ShopHealth {
      shop {
        name
      }
    }
"};

pub(crate) const PRODUCT_SET: &str = indoc! {"
    mutation ProductSet($input: ProductSetInput!, $synchronous: Boolean!) {
      productSet(input: $input, synchronous: $synchronous) {
        product {
          id
        }
        productSetOperation {
          id
          status
          product {
            id
          }
          userErrors {
            field
            message
            code
          }
        }
        userErrors {
          field
          message
          code
        }
      }
    }
"};

pub(crate) const PRODUCT_SET_OPERATION: &str = indoc! {"
    query ProductSetOperation($id: ID!) {
      productOperation(id: $id) {
        ... on ProductSetOperation {
          id
          status
          product {
            id
          }
          userErrors {
            field
            message
            code
          }
        }
      }
    }
"};
