//! Wishlist route handlers (requires login).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::db::WishlistRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequestContext, RequireAuth};
use crate::models::WishlistEntry;
use crate::routes::catalog::product_or_404;
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub page: PageContext,
    pub entries: Vec<WishlistEntry>,
}

/// Display the user's wishlist, creating it on first visit.
#[instrument(skip(state, ctx, user), fields(user_id = %user.id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let wishlists = WishlistRepository::new(state.pool());
    let wishlist = wishlists.get_or_create(user.id).await?;
    let entries = wishlists.list_items(wishlist).await?;

    Ok(WishlistTemplate {
        page: ctx.page().await?,
        entries,
    }
    .into_response())
}

/// Add a product to the wishlist. Adding it twice keeps one entry.
#[instrument(skip(state, ctx, user), fields(user_id = %user.id))]
pub async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<i32>,
) -> Result<Response> {
    let product = product_or_404(&state, product_id).await?;

    let wishlists = WishlistRepository::new(state.pool());
    let wishlist = wishlists.get_or_create(user.id).await?;
    let inserted = wishlists.add_item(wishlist, product.id).await?;
    tracing::debug!(product_id = %product.id, inserted, "Wishlist add");

    ctx.success("Added to Wishlist").await?;
    Ok(Redirect::to(&format!("/product/{}", product.id)).into_response())
}

/// Remove a product from the wishlist. Removing an absent product is a no-op.
#[instrument(skip(state, ctx, user), fields(user_id = %user.id))]
pub async fn remove(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<i32>,
) -> Result<Response> {
    let product = product_or_404(&state, product_id).await?;

    let removed = WishlistRepository::new(state.pool())
        .remove_item(user.id, product.id)
        .await?;
    tracing::debug!(product_id = %product.id, removed, "Wishlist remove");

    ctx.success("Removed from Wishlist").await?;
    Ok(Redirect::to("/wishlist").into_response())
}
