//! Catalog inspection commands.

use tracing::info;

use emporium_storefront::db::CatalogRepository;

use super::connect;

/// Show row counts for the catalog.
///
/// # Errors
///
/// Returns an error if the database connection or query fails.
pub async fn stats() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let stats = CatalogRepository::new(&pool).stats().await?;

    info!("Catalog Statistics");
    info!("==================");
    info!("Categories: {}", stats.categories);
    info!("Products: {} ({} on sale)", stats.products, stats.products_on_sale);
    info!("Reviews: {}", stats.reviews);

    Ok(())
}
