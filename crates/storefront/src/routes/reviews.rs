//! Product review handlers.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ReviewRepository;
use crate::error::Result;
use crate::middleware::{OptionalAuth, RequestContext};
use crate::routes::catalog::product_or_404;
use crate::state::AppState;

/// Longest review text accepted.
pub const MAX_REVIEW_LENGTH: usize = 2000;

/// Review form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub rating: String,
    pub text: String,
}

/// A review that passed validation.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidReview {
    pub rating: i16,
    pub text: String,
}

/// Check a submitted review.
///
/// # Errors
///
/// Returns a message for the shopper if the rating is not 1-5 or the text is
/// blank or too long.
pub fn validate_review(form: &ReviewForm) -> std::result::Result<ValidReview, String> {
    let rating = form
        .rating
        .trim()
        .parse::<i16>()
        .ok()
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| "Please choose a rating from 1 to 5.".to_string())?;

    let text = form.text.trim();
    if text.is_empty() {
        return Err("Please write something in your review.".to_string());
    }
    if text.chars().count() > MAX_REVIEW_LENGTH {
        return Err(format!(
            "Reviews can be at most {MAX_REVIEW_LENGTH} characters."
        ));
    }

    Ok(ValidReview {
        rating,
        text: text.to_string(),
    })
}

/// Reviews are posted from the product page; a GET just goes back there.
pub async fn review_redirect(Path(product_id): Path<i32>) -> Redirect {
    Redirect::to(&format!("/product/{product_id}"))
}

/// Add a review to a product.
///
/// Anonymous shoppers are sent to log in and brought back to the product.
#[instrument(skip(state, ctx, user, form))]
pub async fn add_review(
    OptionalAuth(user): OptionalAuth,
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let product_url = format!("/product/{product_id}");
    let Some(user) = user else {
        return Ok(Redirect::to(&format!("/login?next={product_url}")).into_response());
    };

    let product = product_or_404(&state, product_id).await?;

    match validate_review(&form) {
        Ok(review) => {
            ReviewRepository::new(state.pool())
                .create(product.id, user.id, review.rating, &review.text)
                .await?;
            tracing::info!(product_id = %product.id, user_id = %user.id, "Review added");
            ctx.success("Your Review Has Been Added!").await?;
        }
        Err(message) => {
            ctx.error(message).await?;
        }
    }

    Ok(Redirect::to(&product_url).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(rating: &str, text: &str) -> ReviewForm {
        ReviewForm {
            rating: rating.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_valid_review() {
        let review = validate_review(&form("4", "  Sturdy and bright. ")).unwrap();
        assert_eq!(review.rating, 4);
        assert_eq!(review.text, "Sturdy and bright.");
    }

    #[test]
    fn test_rating_out_of_range() {
        assert!(validate_review(&form("0", "ok")).is_err());
        assert!(validate_review(&form("6", "ok")).is_err());
        assert!(validate_review(&form("five", "ok")).is_err());
        assert!(validate_review(&form("", "ok")).is_err());
    }

    #[test]
    fn test_blank_or_long_text() {
        assert!(validate_review(&form("3", "   ")).is_err());
        let long = "a".repeat(MAX_REVIEW_LENGTH + 1);
        assert!(validate_review(&form("3", &long)).is_err());
        let max = "a".repeat(MAX_REVIEW_LENGTH);
        assert!(validate_review(&form("3", &max)).is_ok());
    }
}
