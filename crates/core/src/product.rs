//! Catalog products.
//!
//! A [`Product`] is the record stored in the catalog and mirrored into the
//! search index under the same id. Products are created once from an admin
//! submission ([`NewProduct`]) and never updated afterwards.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Price, PriceError, ProductId, UnixTimestamp};

/// A catalog product as stored in the primary datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store-generated key, shared verbatim with the search index.
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub sku: String,
    /// Image URL.
    pub image: String,
    pub created_at: UnixTimestamp,
}

/// Validation failures for a product submission.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid price: {0}")]
    InvalidPrice(#[from] PriceError),
    #[error("price must be greater than zero")]
    ZeroPrice,
    #[error("unknown sort field: {0}")]
    UnknownSortField(String),
}

/// A validated admin product submission, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    name: String,
    price: Price,
    sku: String,
    image: String,
}

impl NewProduct {
    /// Validate raw form fields.
    ///
    /// Every field must be non-blank and the price must be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn parse(name: &str, price: &str, sku: &str, image: &str) -> Result<Self, ProductError> {
        let name = required("name", name)?;
        let price_raw = required("price", price)?;
        let sku = required("sku", sku)?;
        let image = required("image", image)?;

        let price = Price::parse(&price_raw)?;
        if !price.is_positive() {
            return Err(ProductError::ZeroPrice);
        }

        Ok(Self {
            name,
            price,
            sku,
            image,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub fn sku(&self) -> &str {
        &self.sku
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Attach the store-generated id and creation time.
    #[must_use]
    pub fn into_product(self, id: ProductId, created_at: UnixTimestamp) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            sku: self.sku,
            image: self.image,
            created_at,
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ProductError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProductError::MissingField(field));
    }
    Ok(value.to_owned())
}

/// Field a product listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortKey {
    Name,
    Price,
    Sku,
    CreatedAt,
}

impl ProductSortKey {
    /// Column name in the catalog table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Sku => "sku",
            Self::CreatedAt => "created_at",
        }
    }

    /// Sort products ascending by this key. Ties fall back to the id so the
    /// order is stable.
    pub fn sort(self, products: &mut [Product]) {
        products.sort_by(|a, b| {
            let primary = match self {
                Self::Name => a.name.cmp(&b.name),
                Self::Price => a.price.cmp(&b.price),
                Self::Sku => a.sku.cmp(&b.sku),
                Self::CreatedAt => a
                    .created_at
                    .as_secs_f64()
                    .total_cmp(&b.created_at.as_secs_f64()),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });
    }
}

impl FromStr for ProductSortKey {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "sku" => Ok(Self::Sku),
            "created_at" => Ok(Self::CreatedAt),
            other => Err(ProductError::UnknownSortField(other.to_owned())),
        }
    }
}

impl fmt::Display for ProductSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price: &str, created_at: f64) -> Product {
        NewProduct::parse(name, price, "SKU", "http://x/1.png")
            .unwrap()
            .into_product(ProductId::new(id), UnixTimestamp::from_secs_f64(created_at))
    }

    #[test]
    fn test_parse_valid_submission() {
        let p = NewProduct::parse(" Widget ", "9.99", "W-1", "http://x/1.png").unwrap();
        assert_eq!(p.name(), "Widget");
        assert_eq!(p.price(), Price::parse("9.99").unwrap());
    }

    #[test]
    fn test_parse_rejects_blank_fields() {
        assert_eq!(
            NewProduct::parse("", "1", "s", "i"),
            Err(ProductError::MissingField("name"))
        );
        assert_eq!(
            NewProduct::parse("n", "1", "s", "  "),
            Err(ProductError::MissingField("image"))
        );
    }

    #[test]
    fn test_parse_rejects_zero_and_bad_price() {
        assert_eq!(
            NewProduct::parse("n", "0", "s", "i"),
            Err(ProductError::ZeroPrice)
        );
        assert!(matches!(
            NewProduct::parse("n", "cheap", "s", "i"),
            Err(ProductError::InvalidPrice(_))
        ));
        assert_eq!(
            NewProduct::parse("n", "10000000000", "s", "i"),
            Err(ProductError::InvalidPrice(PriceError::TooLarge))
        );
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("price".parse::<ProductSortKey>(), Ok(ProductSortKey::Price));
        assert_eq!(
            "colour".parse::<ProductSortKey>(),
            Err(ProductError::UnknownSortField("colour".to_owned()))
        );
    }

    #[test]
    fn test_sort_by_price_then_id() {
        let mut products = vec![
            product("b", "Bolt", "2", 1.0),
            product("a", "Anchor", "2", 2.0),
            product("c", "Chain", "1", 3.0),
        ];
        ProductSortKey::Price.sort(&mut products);
        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_product_json_shape() {
        let p = product("p1", "Widget", "9.99", 10.5);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["price"], 9.99);
        assert_eq!(json["created_at"], 10.5);
    }
}
