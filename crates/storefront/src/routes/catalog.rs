//! Catalog route handlers: product detail, categories, and search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::ProductId;

use crate::db::{CatalogRepository, RepositoryError, ReviewRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequestContext};
use crate::models::{Category, FlashLevel, Pagination, Product, Review};
use crate::state::AppState;

/// Reviews shown per page on a product.
pub const REVIEWS_PER_PAGE: u32 = 5;

/// Notice for a category that doesn't exist.
pub const CATEGORY_NOT_FOUND: &str = "Category Not Found";

/// Notice for a search with no results.
pub const NO_SEARCH_RESULTS: &str = "That Product Does Not Exist...";

// =============================================================================
// Query / Form Types
// =============================================================================

/// Query parameters for the product page.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewPageQuery {
    /// Raw `?page=` value; anything unparseable means the first page.
    pub page: Option<String>,
}

impl ReviewPageQuery {
    /// The requested page number, before clamping to the pages that exist.
    ///
    /// Non-numeric input falls back to the first page. Numbers below 1 or
    /// beyond `u32` saturate so that clamping picks the nearest page.
    #[must_use]
    pub fn requested_page(&self) -> Option<u32> {
        let n = self.page.as_deref()?.trim().parse::<i64>().ok()?;
        Some(u32::try_from(n.max(0)).unwrap_or(u32::MAX))
    }
}

/// Search form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub searched: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub page: PageContext,
    pub product: Product,
    pub reviews: Vec<Review>,
    pub pagination: Pagination,
    /// Whether the product is in the signed-in user's wishlist.
    pub in_wishlist: bool,
}

/// Products in one category.
#[derive(Template, WebTemplate)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub page: PageContext,
    pub category: Category,
    pub products: Vec<Product>,
}

/// List of all categories.
#[derive(Template, WebTemplate)]
#[template(path = "categories.html")]
pub struct CategoriesTemplate {
    pub page: PageContext,
    pub categories: Vec<Category>,
}

/// Search form and results.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub page: PageContext,
    /// The submitted term; `None` before a search is made.
    pub searched: Option<String>,
    pub results: Vec<Product>,
}

// =============================================================================
// Products
// =============================================================================

/// Load a product or fail with 404.
pub(crate) async fn product_or_404(state: &AppState, id: i32) -> Result<Product> {
    CatalogRepository::new(state.pool())
        .get_product(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Display a product with one page of its reviews.
#[instrument(skip(state, ctx))]
pub async fn product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Query(query): Query<ReviewPageQuery>,
) -> Result<Response> {
    let product = product_or_404(&state, id).await?;

    let reviews_repo = ReviewRepository::new(state.pool());
    let total = reviews_repo.count_for_product(product.id).await?;
    let pagination = Pagination::new(query.requested_page(), REVIEWS_PER_PAGE, total);
    let reviews = reviews_repo
        .list_for_product(product.id, &pagination)
        .await?;

    let in_wishlist = match ctx.user_id() {
        Some(user_id) => {
            WishlistRepository::new(state.pool())
                .contains(user_id, product.id)
                .await?
        }
        None => false,
    };

    Ok(ProductTemplate {
        page: ctx.page().await?,
        product,
        reviews,
        pagination,
        in_wishlist,
    }
    .into_response())
}

// =============================================================================
// Categories
// =============================================================================

/// Category URL segment to stored name: hyphens become spaces.
#[must_use]
pub fn category_name_from_slug(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Look up a category and its products by name.
///
/// `Ok(None)` means no category has that name.
async fn load_category(
    catalog: &CatalogRepository<'_>,
    name: &str,
) -> std::result::Result<Option<(Category, Vec<Product>)>, RepositoryError> {
    let Some(category) = catalog.get_category_by_name(name).await? else {
        return Ok(None);
    };
    let products = catalog.products_in_category(category.id).await?;
    Ok(Some((category, products)))
}

/// Display the products in a category.
///
/// Unknown categories, and any failure loading one, send the shopper home
/// with a notice rather than an error page.
#[instrument(skip(state, ctx))]
pub async fn category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Response> {
    let name = category_name_from_slug(&slug);
    let catalog = CatalogRepository::new(state.pool());

    let loaded = match load_category(&catalog, &name).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(category = %name, error = %e, "Category lookup failed");
            None
        }
    };
    let Some((category, products)) = loaded else {
        tracing::info!(category = %name, "Category not found");
        ctx.flash(FlashLevel::Info, CATEGORY_NOT_FOUND).await?;
        return Ok(Redirect::to("/").into_response());
    };

    Ok(CategoryTemplate {
        page: ctx.page().await?,
        category,
        products,
    }
    .into_response())
}

/// Display every category.
#[instrument(skip(state, ctx))]
pub async fn categories(State(state): State<AppState>, ctx: RequestContext) -> Result<Response> {
    let categories = CatalogRepository::new(state.pool())
        .list_categories()
        .await?;

    Ok(CategoriesTemplate {
        page: ctx.page().await?,
        categories,
    }
    .into_response())
}

// =============================================================================
// Search
// =============================================================================

/// Display the empty search form.
#[instrument(skip(ctx))]
pub async fn search_page(ctx: RequestContext) -> Result<Response> {
    Ok(SearchTemplate {
        page: ctx.page().await?,
        searched: None,
        results: Vec::new(),
    }
    .into_response())
}

/// Run a search. No matches is a notice, not an error.
#[instrument(skip(state, ctx))]
pub async fn search(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<SearchForm>,
) -> Result<Response> {
    let results = CatalogRepository::new(state.pool())
        .search_products(&form.searched)
        .await?;

    if results.is_empty() {
        ctx.flash(FlashLevel::Info, NO_SEARCH_RESULTS).await?;
    }

    Ok(SearchTemplate {
        page: ctx.page().await?,
        searched: Some(form.searched.trim().to_string()),
        results,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page_query(raw: Option<&str>) -> ReviewPageQuery {
        ReviewPageQuery {
            page: raw.map(String::from),
        }
    }

    #[test]
    fn test_requested_page_is_lenient() {
        assert_eq!(page_query(None).requested_page(), None);
        assert_eq!(page_query(Some("")).requested_page(), None);
        assert_eq!(page_query(Some("abc")).requested_page(), None);
        assert_eq!(page_query(Some("2.5")).requested_page(), None);
        assert_eq!(page_query(Some(" 3 ")).requested_page(), Some(3));
        assert_eq!(page_query(Some("-1")).requested_page(), Some(0));
        assert_eq!(
            page_query(Some("99999999999")).requested_page(),
            Some(u32::MAX)
        );
    }

    #[test]
    fn test_requested_page_clamps_into_range() {
        let clamp = |raw| Pagination::new(page_query(Some(raw)).requested_page(), 5, 12).page;
        assert_eq!(clamp("abc"), 1);
        assert_eq!(clamp("-1"), 1);
        assert_eq!(clamp("2"), 2);
        assert_eq!(clamp("99999999999"), 3);
    }

    #[test]
    fn test_category_name_from_slug() {
        assert_eq!(category_name_from_slug("Home-Office"), "Home Office");
        assert_eq!(category_name_from_slug("Books"), "Books");
        assert_eq!(category_name_from_slug("a-b-c"), "a b c");
    }
}
