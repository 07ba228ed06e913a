//! Home and about page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequestContext};
use crate::models::Product;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    /// Every product, in catalog order.
    pub products: Vec<Product>,
}

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub page: PageContext,
}

/// Display the home page with the full catalog.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: RequestContext) -> Result<impl IntoResponse> {
    let products = CatalogRepository::new(state.pool()).list_products().await?;

    Ok(HomeTemplate {
        page: ctx.page().await?,
        products,
    })
}

/// Display the about page.
#[instrument(skip(ctx))]
pub async fn about(ctx: RequestContext) -> Result<impl IntoResponse> {
    Ok(AboutTemplate {
        page: ctx.page().await?,
    })
}
