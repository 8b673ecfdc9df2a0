//! Catalog route handlers: the combined catalog, the products and services
//! pages, and item detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use applegym_core::{ItemId, ItemKind};

use crate::catalog::{
    self, ALL_CATEGORIES, CatalogItem, CatalogParams, CatalogQuery, KindFilter,
};
use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalUser;
use crate::routes::{Layout, load_cart};
use crate::state::AppState;

/// Catalog item display data for templates.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub id: i64,
    pub kind: &'static str,
    pub kind_label: &'static str,
    pub is_service: bool,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub icon: String,
    /// Units still addable; `None` for services.
    pub available: Option<u32>,
    pub can_add: bool,
    pub duration: Option<String>,
    pub detail_url: String,
}

impl ItemView {
    #[must_use]
    pub fn new(item: &CatalogItem, cart: &Cart) -> Self {
        let available = catalog::available_stock(item, cart);
        Self {
            id: item.id.as_i64(),
            kind: item.kind.catalog_tag(),
            kind_label: item.kind.label(),
            is_service: item.kind == ItemKind::Service,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.display(),
            category: item.category.clone(),
            icon: item.icon.clone(),
            available,
            can_add: available.is_none_or(|n| n > 0),
            duration: item.duration_minutes.map(|m| format!("{m} min")),
            detail_url: format!("/catalog/{}/{}", item.kind.catalog_tag(), item.id),
        }
    }
}

/// Catalog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: &'static str,
    pub items: Vec<ItemView>,
    pub categories: Vec<String>,
    /// Kind selector is hidden on the products and services pages.
    pub show_kind_filter: bool,
    pub kind: &'static str,
    pub category: String,
    pub search: String,
    pub total_products: usize,
    pub total_services: usize,
    pub error: Option<String>,
    pub return_to: String,
}

/// Item detail template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/show.html")]
pub struct ItemTemplate {
    pub layout: Layout,
    pub item: ItemView,
    pub in_cart: u32,
    pub return_to: String,
}

/// Which page is being rendered.
#[derive(Clone, Copy)]
enum Page {
    Catalog,
    Products,
    Services,
}

impl Page {
    const fn title(self) -> &'static str {
        match self {
            Self::Catalog => "Catalog",
            Self::Products => "Products",
            Self::Services => "Services",
        }
    }

    const fn path(self) -> &'static str {
        match self {
            Self::Catalog => "/catalog",
            Self::Products => "/products",
            Self::Services => "/services",
        }
    }

    fn query(self, params: CatalogParams) -> CatalogQuery {
        match self {
            Self::Catalog => CatalogQuery::from(params),
            Self::Products => CatalogQuery::pinned(KindFilter::Products, params),
            Self::Services => CatalogQuery::pinned(KindFilter::Services, params),
        }
    }
}

/// Combined catalog page.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    uri: Uri,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    render_listing(&state, &session, user.as_ref(), &uri, Page::Catalog, params).await
}

/// Products page.
#[instrument(skip(state, session, user))]
pub async fn products(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    uri: Uri,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    render_listing(&state, &session, user.as_ref(), &uri, Page::Products, params).await
}

/// Services page.
#[instrument(skip(state, session, user))]
pub async fn services(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    uri: Uri,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    render_listing(&state, &session, user.as_ref(), &uri, Page::Services, params).await
}

async fn render_listing(
    state: &AppState,
    session: &Session,
    user: Option<&crate::models::CurrentUser>,
    uri: &Uri,
    page: Page,
    params: CatalogParams,
) -> CatalogTemplate {
    let query = page.query(params);
    let api = state.api();

    let loaded = match page {
        Page::Catalog => api
            .catalog()
            .await
            .map(|c| (c.items.clone(), c.total_products, c.total_services)),
        Page::Products => api.products().await.map(|items| {
            let n = items.len();
            (items.as_ref().clone(), n, 0)
        }),
        Page::Services => api.services().await.map(|items| {
            let n = items.len();
            (items.as_ref().clone(), 0, n)
        }),
    };

    let (items, total_products, total_services, error) = match loaded {
        Ok((items, products, services)) => (items, products, services, None),
        Err(e) => {
            tracing::error!(page = page.title(), "Failed to load catalog: {e}");
            (Vec::new(), 0, 0, Some(e.user_message()))
        }
    };

    let cart = load_cart(session).await;
    let views = catalog::filter(&items, &query)
        .into_iter()
        .map(|item| ItemView::new(item, &cart))
        .collect();

    CatalogTemplate {
        layout: Layout::load(session, user, page.path()).await,
        title: page.title(),
        action: page.path(),
        items: views,
        categories: catalog::categories(&items, query.kind),
        show_kind_filter: matches!(page, Page::Catalog),
        kind: query.kind.as_str(),
        category: query
            .category
            .unwrap_or_else(|| ALL_CATEGORIES.to_string()),
        search: query.search.unwrap_or_default(),
        total_products,
        total_services,
        error,
        return_to: uri.to_string(),
    }
}

/// Item detail page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    uri: Uri,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<ItemTemplate> {
    let kind = ItemKind::from_tag(&kind)
        .ok_or_else(|| AppError::NotFound(format!("item kind {kind}")))?;
    let id = ItemId::new(id);

    let catalog = state.api().catalog().await?;
    let item = catalog::find(&catalog.items, kind, id)
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", kind.catalog_tag())))?;

    let cart = load_cart(&session).await;
    Ok(ItemTemplate {
        item: ItemView::new(item, &cart),
        in_cart: cart.quantity_of(kind, id),
        layout: Layout::load(&session, user.as_ref(), "/catalog").await,
        return_to: uri.to_string(),
    })
}
