//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use applegym_core::ItemKind;

use crate::catalog::CatalogItem;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::routes::catalog::ItemView;
use crate::routes::{Layout, load_cart};
use crate::state::AppState;

/// How many items of each kind the home page features.
const FEATURED_PER_KIND: usize = 3;

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub featured_products: Vec<ItemView>,
    pub featured_services: Vec<ItemView>,
}

fn featured<'a>(items: &'a [CatalogItem], kind: ItemKind) -> impl Iterator<Item = &'a CatalogItem> {
    items
        .iter()
        .filter(move |item| item.kind == kind && item.in_stock())
        .take(FEATURED_PER_KIND)
}

#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> impl IntoResponse {
    let cart = load_cart(&session).await;

    let (featured_products, featured_services) = state.api().catalog().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch catalog for home page: {e}");
            (Vec::new(), Vec::new())
        },
        |catalog| {
            let views = |kind| {
                featured(&catalog.items, kind)
                    .map(|item| ItemView::new(item, &cart))
                    .collect::<Vec<_>>()
            };
            (views(ItemKind::Product), views(ItemKind::Service))
        },
    );

    HomeTemplate {
        layout: Layout::load(&session, user.as_ref(), "/").await,
        featured_products,
        featured_services,
    }
}
