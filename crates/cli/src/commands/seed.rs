//! Seed the catalog store from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Widget
//!     price: 9.99
//!     sku: W-1
//!     image: https://cdn.example.com/w-1.png
//! ```
//!
//! Every entry is validated before anything is written. Products go to the
//! store only; a running storefront picks them up on its next reindex.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use cartwheel_core::{NewProduct, UnixTimestamp};
use cartwheel_storefront::db::{self, CatalogStore, PgCatalogStore};

use super::database_url;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
struct ProductEntry {
    name: String,
    price: PriceField,
    sku: String,
    image: String,
}

/// Prices may be written as YAML numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Parse and validate a catalog file's contents.
///
/// Returns every product, or one message per invalid entry.
fn parse_catalog(content: &str) -> Result<Vec<NewProduct>, Vec<String>> {
    let file: CatalogFile = serde_yaml::from_str(content).map_err(|e| vec![e.to_string()])?;

    let mut products = Vec::with_capacity(file.products.len());
    let mut errors = Vec::new();
    for (i, entry) in file.products.iter().enumerate() {
        match NewProduct::parse(&entry.name, &entry.price.as_text(), &entry.sku, &entry.image) {
            Ok(product) => products.push(product),
            Err(e) => errors.push(format!("product #{} ({}): {e}", i + 1, entry.name)),
        }
    }

    if errors.is_empty() {
        Ok(products)
    } else {
        Err(errors)
    }
}

/// Create every product in `file_path`.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or a database write fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;

    // Validate before connecting to the database
    let products = match parse_catalog(&content) {
        Ok(products) => products,
        Err(errors) => {
            error!("Catalog validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };
    info!(products = products.len(), "Catalog validated");

    let pool = db::create_pool(&database_url()?).await?;
    let store = PgCatalogStore::new(pool);

    for product in &products {
        let id = store.create(product, UnixTimestamp::now()).await?;
        info!(id = %id, name = product.name(), "Product created");
    }

    info!("Seeding complete! {} products created", products.len());
    info!("Run `cartwheel reindex` to make them searchable");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_and_strings() {
        let products = parse_catalog(
            r#"
products:
  - name: Widget
    price: 9.99
    sku: W-1
    image: http://x/1.png
  - name: Gadget
    price: "12"
    sku: G-1
    image: http://x/2.png
"#,
        )
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price().to_string(), "9.99");
        assert_eq!(products[1].name(), "Gadget");
    }

    #[test]
    fn test_reports_every_invalid_entry() {
        let errors = parse_catalog(
            r"
products:
  - name: Widget
    price: 0
    sku: W-1
    image: http://x/1.png
  - name: ''
    price: 3
    sku: G-1
    image: http://x/2.png
",
        )
        .unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("product #1"));
        assert!(errors[1].starts_with("product #2"));
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        assert!(parse_catalog("products: 7").is_err());
    }
}
