//! Checkout and payment-success handlers.
//!
//! Checkout only captures where the order ships. No payment is taken and
//! no stock is reserved.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use emporium_core::SessionCart;

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequestContext};
use crate::models::{FlashLevel, ShippingDetails, session_keys};
use crate::routes::forms::{FormErrors, ShippingFields, validate_shipping};
use crate::services::cart::clear_snapshot;
use crate::services::checkout::{self, CheckoutSummary};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub summary: CheckoutSummary,
    /// Values shown in the shipping form.
    pub shipping: ShippingDetails,
    pub errors: FormErrors,
}

/// Payment success page template.
#[derive(Template, WebTemplate)]
#[template(path = "payment_success.html")]
pub struct PaymentSuccessTemplate {
    pub page: PageContext,
    /// Where the completed order ships, if checkout captured it.
    pub shipping: Option<ShippingDetails>,
}

/// Display the checkout page.
///
/// Guests and users without a stored address get a blank shipping form;
/// users with one see it pre-filled.
#[instrument(skip(state, ctx))]
pub async fn checkout_page(State(state): State<AppState>, ctx: RequestContext) -> Result<Response> {
    let cart = ctx.cart().await?;
    let summary = checkout::summarize(state.pool(), &cart, ctx.user_id()).await?;
    let shipping = summary.shipping.details();

    Ok(CheckoutTemplate {
        page: ctx.page().await?,
        summary,
        shipping,
        errors: FormErrors::new(),
    }
    .into_response())
}

/// Accept the shipping form and move on to the success page.
#[instrument(skip(state, ctx, fields))]
pub async fn submit_checkout(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(fields): Form<ShippingFields>,
) -> Result<Response> {
    let cart = ctx.cart().await?;
    if cart.is_empty() {
        ctx.flash(FlashLevel::Info, "Your Cart Is Empty...").await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let shipping = fields.to_details();
    let errors = validate_shipping(&shipping);

    if errors.is_empty() {
        ctx.session()
            .insert(session_keys::CHECKOUT_SHIPPING, &shipping)
            .await?;
        tracing::info!(lines = cart.len(), "Checkout shipping captured");
        return Ok(Redirect::to("/payment/success").into_response());
    }

    let summary = checkout::summarize(state.pool(), &cart, ctx.user_id()).await?;
    Ok(CheckoutTemplate {
        page: ctx.page().await?,
        summary,
        shipping,
        errors,
    }
    .into_response())
}

/// Thank the shopper.
///
/// The cart is emptied only when a checkout just captured shipping details,
/// so revisiting or prefetching the page leaves the cart alone.
#[instrument(skip(state, ctx))]
pub async fn payment_success(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let shipping = ctx
        .session()
        .remove::<ShippingDetails>(session_keys::CHECKOUT_SHIPPING)
        .await?;

    if shipping.is_some() {
        ctx.session()
            .remove::<SessionCart>(session_keys::CART)
            .await?;
        if let Some(user_id) = ctx.user_id() {
            clear_snapshot(state.pool(), user_id).await?;
        }
        tracing::info!("Checkout completed, cart emptied");
    }

    Ok(PaymentSuccessTemplate {
        page: ctx.page().await?,
        shipping,
    }
    .into_response())
}
