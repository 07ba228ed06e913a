//! Cart route handlers.
//!
//! The cart lives in the session. For signed-in shoppers every change is
//! also written to the profile snapshot so it survives logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{CartError, ProductId, Quantity, SessionCart};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequestContext};
use crate::routes::catalog::product_or_404;
use crate::services::cart::save_snapshot;
use crate::services::checkout::{self, CheckoutSummary, ShippingForm};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

const fn default_quantity() -> u32 {
    1
}

/// Add or update form data.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub product_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Delete form data.
#[derive(Debug, Deserialize)]
pub struct CartDeleteForm {
    pub product_id: i32,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub summary: CheckoutSummary,
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the cart in the session and, for signed-in shoppers, the snapshot.
async fn persist_cart(state: &AppState, ctx: &RequestContext, cart: &SessionCart) -> Result<()> {
    ctx.store_cart(cart).await?;
    if let Some(user_id) = ctx.user_id() {
        save_snapshot(state.pool(), user_id, cart).await?;
    }
    Ok(())
}

// =============================================================================
// Routes
// =============================================================================

/// Display the cart with line totals.
#[instrument(skip(state, ctx))]
pub async fn show(State(state): State<AppState>, ctx: RequestContext) -> Result<Response> {
    let cart = ctx.cart().await?;
    let products = checkout::load_cart_products(state.pool(), &cart).await?;
    let summary = checkout::assemble(&cart, &products, ShippingForm::Unbound);

    Ok(CartTemplate {
        page: ctx.page().await?,
        summary,
    }
    .into_response())
}

/// Put a product in the cart. An existing line takes the new quantity.
#[instrument(skip(state, ctx))]
pub async fn add(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<CartLineForm>,
) -> Result<Response> {
    let product = product_or_404(&state, form.product_id).await?;
    let quantity = Quantity::new(form.quantity)
        .ok_or_else(|| AppError::BadRequest(CartError::ZeroQuantity.to_string()))?;

    let mut cart = ctx.cart().await?;
    cart.set(product.id, quantity);
    persist_cart(&state, &ctx, &cart).await?;

    ctx.success("Product Added To Cart...").await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Change a line's quantity. Zero removes the line; products not already in
/// the cart are ignored, since only `add` checks that a product exists.
#[instrument(skip(state, ctx))]
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<CartLineForm>,
) -> Result<Response> {
    let mut cart = ctx.cart().await?;
    if cart.set_quantity(ProductId::new(form.product_id), form.quantity) {
        persist_cart(&state, &ctx, &cart).await?;
    }

    ctx.success("Your Cart Has Been Updated...").await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Remove a line from the cart.
#[instrument(skip(state, ctx))]
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<CartDeleteForm>,
) -> Result<Response> {
    let mut cart = ctx.cart().await?;
    cart.remove(ProductId::new(form.product_id));
    persist_cart(&state, &ctx, &cart).await?;

    ctx.success("Item Deleted From Shopping Cart...").await?;
    Ok(Redirect::to("/cart").into_response())
}
