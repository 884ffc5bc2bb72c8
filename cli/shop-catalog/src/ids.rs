//! Conversion between global resource ids and local ids.
//!
//! The backend addresses every resource with a global id of the form
//! `gid://shopify/<Kind>/<digits>`. Callers only ever see the trailing
//! suffix (the local id). Ids supplied by callers are validated here before
//! they are embedded in any backend request.

use std::sync::LazyLock;

use derive_more::Display;
use regex::Regex;
use serde::Serialize;

use crate::error::CatalogError;

const NAMESPACE: &str = "shopify";

static GLOBAL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gid://shopify/([A-Za-z][A-Za-z0-9]*)/([0-9]+)$").expect("valid regex")
});

/// Loose shape used by [to_local], which also accepts non-numeric suffixes.
static ANY_GLOBAL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gid://[A-Za-z0-9_-]+/[A-Za-z][A-Za-z0-9]*/([^/?#]+)$").expect("valid regex")
});

/// Kinds of backend resources this crate addresses by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResourceKind {
    Product,
    ProductVariant,
    Location,
    MediaImage,
    ProductSetOperation,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Product => "Product",
            ResourceKind::ProductVariant => "ProductVariant",
            ResourceKind::Location => "Location",
            ResourceKind::MediaImage => "MediaImage",
            ResourceKind::ProductSetOperation => "ProductSetOperation",
        }
    }
}

/// A validated global id of a known [ResourceKind].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize)]
#[display("{raw}")]
#[serde(transparent)]
pub struct GlobalId {
    raw: String,
    #[serde(skip)]
    kind: ResourceKind,
}

impl GlobalId {
    fn wrap(local: &str, kind: ResourceKind) -> Self {
        Self {
            raw: format!("gid://{NAMESPACE}/{}/{local}", kind.as_str()),
            kind,
        }
    }

    /// Parse `raw` as a global id of `kind`.
    pub fn parse(raw: &str, kind: ResourceKind) -> Option<Self> {
        let captures = GLOBAL_ID.captures(raw)?;
        if &captures[1] != kind.as_str() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            kind,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The local part of this id.
    pub fn local(&self) -> &str {
        self.raw
            .rsplit_once('/')
            .map(|(_, local)| local)
            .unwrap_or(&self.raw)
    }
}

impl AsRef<str> for GlobalId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// Caller supplied id value, either textual or numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdInput {
    Text(String),
    Number(u64),
}

impl From<&str> for IdInput {
    fn from(value: &str) -> Self {
        IdInput::Text(value.to_string())
    }
}

impl From<String> for IdInput {
    fn from(value: String) -> Self {
        IdInput::Text(value)
    }
}

impl From<u64> for IdInput {
    fn from(value: u64) -> Self {
        IdInput::Number(value)
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Convert `value` into a global id of `kind`.
///
/// Global ids of the right kind pass through, numeric values are wrapped.
/// Anything else is an [CatalogError::InvalidIdentifier].
pub fn to_global(value: impl Into<IdInput>, kind: ResourceKind) -> Result<GlobalId, CatalogError> {
    let text = match value.into() {
        IdInput::Number(number) => return Ok(GlobalId::wrap(&number.to_string(), kind)),
        IdInput::Text(text) => text,
    };
    let trimmed = text.trim();

    if let Some(id) = GlobalId::parse(trimmed, kind) {
        return Ok(id);
    }
    if is_numeric(trimmed) {
        return Ok(GlobalId::wrap(trimmed, kind));
    }

    Err(CatalogError::InvalidIdentifier { value: text, kind })
}

/// Strip the namespace and kind from a global id.
///
/// Values that are not in global form are returned unchanged, so already
/// local ids can be passed through safely.
pub fn to_local(id: &str) -> String {
    match ANY_GLOBAL_ID.captures(id) {
        Some(captures) => captures[1].to_string(),
        None => id.to_string(),
    }
}

/// Accept a bare numeric id or a global id of `kind`.
///
/// Handles and other human readable slugs are rejected with
/// [CatalogError::UnsupportedIdentifier]; there is no lookup fallback.
pub fn ensure_resource_id(raw: &str, kind: ResourceKind) -> Result<GlobalId, CatalogError> {
    let trimmed = raw.trim();
    if is_numeric(trimmed) {
        return Ok(GlobalId::wrap(trimmed, kind));
    }
    GlobalId::parse(trimmed, kind).ok_or_else(|| CatalogError::UnsupportedIdentifier {
        value: raw.to_string(),
        kind,
    })
}
