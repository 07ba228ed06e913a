//! Seed the catalog from a YAML file.
//!
//! # File Format
//!
//! ```yaml
//! categories:
//!   - name: Lighting
//!     products:
//!       - name: Brass Desk Lamp
//!         description: Adjustable arm, warm bulb included.
//!         price: "89.00"
//!         image_url: https://cdn.example.com/lamp.jpg
//!       - name: Paper Lantern
//!         price: "24.00"
//!         sale_price: "18.00"
//! ```
//!
//! A product with a `sale_price` is marked on sale. Categories and products
//! are upserted by name, so seeding the same file twice changes nothing.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use emporium_core::Price;
use emporium_storefront::db::CatalogRepository;
use emporium_storefront::db::catalog::ProductInput;

use super::connect;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<CategorySeed>,
}

/// A category and the products filed under it.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
}

impl CatalogFile {
    fn product_count(&self) -> usize {
        self.categories.iter().map(|c| c.products.len()).sum()
    }
}

/// Check a seed file before touching the database.
///
/// Returns one message per problem; an empty list means the file is usable.
#[must_use]
pub fn validate_catalog(file: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut categories = HashSet::new();
    let mut products = HashSet::new();

    for category in &file.categories {
        let name = category.name.trim();
        if name.is_empty() {
            errors.push("category with an empty name".to_string());
        } else if !categories.insert(name) {
            errors.push(format!("category '{name}' is listed twice"));
        }

        for product in &category.products {
            let product_name = product.name.trim();
            if product_name.is_empty() {
                errors.push(format!("product with an empty name in '{name}'"));
                continue;
            }
            if !products.insert(product_name) {
                errors.push(format!("product '{product_name}' is listed twice"));
            }
            if Price::new(product.price).is_negative() {
                errors.push(format!("product '{product_name}' has a negative price"));
            }
            if let Some(sale) = product.sale_price {
                if Price::new(sale).is_negative() {
                    errors.push(format!("product '{product_name}' has a negative sale price"));
                } else if sale >= product.price {
                    errors.push(format!(
                        "product '{product_name}' sale price must be below its price"
                    ));
                }
            }
        }
    }

    errors
}

/// Load the catalog from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML file
/// * `clear_existing` - If true, delete every product and category first
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn catalog(file_path: &str, clear_existing: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    info!(
        categories = file.categories.len(),
        products = file.product_count(),
        "Parsed catalog"
    );

    let errors = validate_catalog(&file);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = connect().await?;
    let repo = CatalogRepository::new(&pool);

    if clear_existing {
        let removed = repo.clear().await?;
        info!(removed, "Cleared existing catalog");
    }

    let mut upserted = 0_usize;
    for category_seed in &file.categories {
        let category = repo.upsert_category(category_seed.name.trim()).await?;

        for product in &category_seed.products {
            let input = ProductInput {
                name: product.name.trim().to_string(),
                description: product.description.trim().to_string(),
                price: Price::new(product.price),
                category_id: category.id,
                image_url: product.image_url.clone().filter(|url| !url.trim().is_empty()),
                is_sale: product.sale_price.is_some(),
                sale_price: product.sale_price.map_or(Price::ZERO, Price::new),
            };
            repo.upsert_product(&input).await?;
            upserted += 1;
        }

        info!(category = %category.name, products = category_seed.products.len(), "Seeded category");
    }

    info!("Seeding complete!");
    info!("  Categories: {}", file.categories.len());
    info!("  Products upserted: {upserted}");

    Ok(())
}
