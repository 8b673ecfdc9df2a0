//! Cache types for catalog responses.

use std::sync::Arc;

use crate::catalog::{Catalog, CatalogItem};

/// Catalog endpoint a cached value came from.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Catalog,
    Products,
    Services,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Catalog(Arc<Catalog>),
    Items(Arc<Vec<CatalogItem>>),
}
