//! Catalog items and the filtering behind the catalog pages.
//!
//! Products and services share one list. They have independent id
//! sequences on the backend, so an item is identified by `(kind, id)`.

use serde::Deserialize;

use applegym_core::{ItemId, ItemKind, Price};

use crate::api::types::WireItem;
use crate::cart::Cart;

/// Category used when the backend sends none.
pub const DEFAULT_CATEGORY: &str = "General";

/// Icon used when the backend sends none.
pub const DEFAULT_ICON: &str = "fas fa-box";

/// Category filter value meaning "every category".
pub const ALL_CATEGORIES: &str = "Todos";

/// A product or service offered by the gym.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Units on hand. Always `None` for services.
    pub stock: Option<u32>,
    /// Session length. Always `None` for products.
    pub duration_minutes: Option<u32>,
    pub category: String,
    pub icon: String,
}

impl CatalogItem {
    /// Whether the backend has any of this item left.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }
}

impl From<WireItem> for CatalogItem {
    fn from(item: WireItem) -> Self {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());

        let (stock, duration_minutes) = match item.tipo {
            ItemKind::Product => (
                Some(item.stock.map_or(0, |s| u32::try_from(s.max(0)).unwrap_or(u32::MAX))),
                None,
            ),
            ItemKind::Service => (
                None,
                item.duracion.and_then(|d| u32::try_from(d).ok()),
            ),
        };

        Self {
            id: item.id,
            kind: item.tipo,
            name: item.nombre,
            description: item.descripcion.unwrap_or_default(),
            price: item.precio,
            stock,
            duration_minutes,
            category: non_empty(item.categoria).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            icon: non_empty(item.icon).unwrap_or_else(|| DEFAULT_ICON.to_string()),
        }
    }
}

/// The full catalog as returned by the backend.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub items: Vec<CatalogItem>,
    pub total_products: usize,
    pub total_services: usize,
    pub source: Option<String>,
}

/// Which kinds of item a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Products,
    Services,
}

impl KindFilter {
    /// Parse the `tipo` query value. Unknown values show everything.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value.and_then(ItemKind::from_tag) {
            Some(ItemKind::Product) => Self::Products,
            Some(ItemKind::Service) => Self::Services,
            None => Self::All,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Products => "productos",
            Self::Services => "servicios",
        }
    }

    #[must_use]
    pub const fn matches(self, kind: ItemKind) -> bool {
        match self {
            Self::All => true,
            Self::Products => matches!(kind, ItemKind::Product),
            Self::Services => matches!(kind, ItemKind::Service),
        }
    }
}

/// Catalog page query string (`?tipo=&categoria=&q=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogParams {
    pub tipo: Option<String>,
    pub categoria: Option<String>,
    pub q: Option<String>,
}

/// Normalized filter for a catalog page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub kind: KindFilter,
    /// `None` means every category.
    pub category: Option<String>,
    /// Trimmed, non-empty search term.
    pub search: Option<String>,
}

impl CatalogQuery {
    /// Build a query for a page that is pinned to one kind.
    #[must_use]
    pub fn pinned(kind: KindFilter, params: CatalogParams) -> Self {
        Self {
            kind,
            ..Self::from(params)
        }
    }
}

impl From<CatalogParams> for CatalogQuery {
    fn from(params: CatalogParams) -> Self {
        let category = params
            .categoria
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && c != ALL_CATEGORIES);
        let search = params
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        Self {
            kind: KindFilter::from_query(params.tipo.as_deref()),
            category,
            search,
        }
    }
}

/// Apply a catalog query, preserving the backend's order.
///
/// Kind first, then exact category, then a case-insensitive substring match
/// of the search term against name, description or category.
#[must_use]
pub fn filter<'a>(items: &'a [CatalogItem], query: &CatalogQuery) -> Vec<&'a CatalogItem> {
    let needle = query.search.as_deref().map(str::to_lowercase);

    items
        .iter()
        .filter(|item| query.kind.matches(item.kind))
        .filter(|item| {
            query
                .category
                .as_deref()
                .is_none_or(|category| item.category == category)
        })
        .filter(|item| {
            needle.as_deref().is_none_or(|needle| {
                item.name.to_lowercase().contains(needle)
                    || item.description.to_lowercase().contains(needle)
                    || item.category.to_lowercase().contains(needle)
            })
        })
        .collect()
}

/// Distinct categories of the given kind, in first-appearance order.
#[must_use]
pub fn categories(items: &[CatalogItem], kind: KindFilter) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items.iter().filter(|i| kind.matches(i.kind)) {
        if !seen.iter().any(|c| c == &item.category) {
            seen.push(item.category.clone());
        }
    }
    seen
}

/// Look up an item by its `(kind, id)` identity.
#[must_use]
pub fn find(items: &[CatalogItem], kind: ItemKind, id: ItemId) -> Option<&CatalogItem> {
    items.iter().find(|i| i.kind == kind && i.id == id)
}

/// Stock the visitor can still add: stock minus what is already in the cart.
///
/// Returns `None` for services, which are never limited.
#[must_use]
pub fn available_stock(item: &CatalogItem, cart: &Cart) -> Option<u32> {
    let stock = item.stock?;
    Some(stock.saturating_sub(cart.quantity_of(item.kind, item.id)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, category: &str, stock: u32) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            kind: ItemKind::Product,
            name: name.to_string(),
            description: format!("{name} de alta calidad"),
            price: Price::from_cents(4990),
            stock: Some(stock),
            duration_minutes: None,
            category: category.to_string(),
            icon: DEFAULT_ICON.to_string(),
        }
    }

    fn service(id: i64, name: &str, category: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            kind: ItemKind::Service,
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(2500),
            stock: None,
            duration_minutes: Some(60),
            category: category.to_string(),
            icon: "fas fa-running".to_string(),
        }
    }

    fn sample() -> Vec<CatalogItem> {
        vec![
            product(1, "Mancuernas", "Pesas", 5),
            service(1, "Yoga", "Clases"),
            product(2, "Proteína Whey", "Suplementos", 0),
            service(2, "Entrenador personal", "Asesoría"),
            product(3, "Barra olímpica", "Pesas", 2),
        ]
    }

    fn query(tipo: Option<&str>, categoria: Option<&str>, q: Option<&str>) -> CatalogQuery {
        CatalogQuery::from(CatalogParams {
            tipo: tipo.map(String::from),
            categoria: categoria.map(String::from),
            q: q.map(String::from),
        })
    }

    fn names(items: &[&CatalogItem]) -> Vec<String> {
        items.iter().map(|i| i.name.clone()).collect()
    }

    #[test]
    fn test_from_wire_defaults() {
        let wire: WireItem = serde_json::from_str(
            r#"{"id": 9, "nombre": "Toalla", "precio": "15.00", "tipo": "productos",
                "categoria": "", "icon": null}"#,
        )
        .unwrap();
        let item = CatalogItem::from(wire);
        assert_eq!(item.category, DEFAULT_CATEGORY);
        assert_eq!(item.icon, DEFAULT_ICON);
        assert_eq!(item.stock, Some(0));
        assert!(!item.in_stock());
    }

    #[test]
    fn test_filter_all_preserves_order() {
        let items = sample();
        let result = filter(&items, &query(None, None, None));
        assert_eq!(result.len(), 5);
        assert_eq!(result[1].name, "Yoga");
    }

    #[test]
    fn test_filter_by_kind_and_category() {
        let items = sample();
        let result = filter(&items, &query(Some("productos"), Some("Pesas"), None));
        assert_eq!(names(&result), vec!["Mancuernas", "Barra olímpica"]);

        let result = filter(&items, &query(Some("servicios"), Some("Todos"), None));
        assert_eq!(names(&result), vec!["Yoga", "Entrenador personal"]);
    }

    #[test]
    fn test_filter_search_is_case_insensitive_and_trimmed() {
        let items = sample();
        let result = filter(&items, &query(None, None, Some("  WHEY ")));
        assert_eq!(names(&result), vec!["Proteína Whey"]);

        // Matches against category too
        let result = filter(&items, &query(None, None, Some("asesor")));
        assert_eq!(names(&result), vec!["Entrenador personal"]);
    }

    #[test]
    fn test_empty_search_and_category_mean_no_filter() {
        let q = query(Some("bogus"), Some("  "), Some("   "));
        assert_eq!(q, CatalogQuery::default());
    }

    #[test]
    fn test_categories_first_appearance_order() {
        let items = sample();
        assert_eq!(
            categories(&items, KindFilter::All),
            vec!["Pesas", "Clases", "Suplementos", "Asesoría"]
        );
        assert_eq!(categories(&items, KindFilter::Services), vec!["Clases", "Asesoría"]);
    }

    #[test]
    fn test_find_distinguishes_kind() {
        let items = sample();
        let yoga = find(&items, ItemKind::Service, ItemId::new(1)).unwrap();
        let weights = find(&items, ItemKind::Product, ItemId::new(1)).unwrap();
        assert_eq!(yoga.name, "Yoga");
        assert_eq!(weights.name, "Mancuernas");
        assert!(find(&items, ItemKind::Service, ItemId::new(3)).is_none());
    }

    #[test]
    fn test_available_stock_subtracts_cart() {
        let items = sample();
        let mut cart = Cart::default();
        cart.add(&items[4]).unwrap();

        assert_eq!(available_stock(&items[4], &cart), Some(1));
        assert_eq!(available_stock(&items[0], &cart), Some(5));
        assert_eq!(available_stock(&items[1], &cart), None);
    }

    #[test]
    fn test_pinned_query_overrides_kind() {
        let q = CatalogQuery::pinned(
            KindFilter::Services,
            CatalogParams {
                tipo: Some("productos".to_string()),
                ..CatalogParams::default()
            },
        );
        assert_eq!(q.kind, KindFilter::Services);
    }
}
