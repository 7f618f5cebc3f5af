//! Session cart and its state transitions.
//!
//! A cart is a set of line items keyed by product id, plus two denormalized
//! aggregates (total quantity and total price). Every transition rebuilds the
//! aggregates by folding over all lines; they are never adjusted in place.
//!
//! An empty cart does not exist as a value. Transitions that would leave no
//! lines return `None`, and callers store `Option<Cart>` so "no cart" has
//! exactly one representation.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::product::Product;
use crate::types::{Email, Price, ProductId};

// =============================================================================
// Quantity
// =============================================================================

/// Rejected line-item quantity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("quantity must be a whole number between 1 and {max}", max = Quantity::MAX)]
pub struct InvalidQuantity;

/// A positive number of units requested in one add.
///
/// The bound applies per request. A line that receives several adds may hold
/// more than [`Quantity::MAX`] units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    /// Upper bound for a single add.
    pub const MAX: u32 = 10_000;

    /// # Errors
    ///
    /// Returns `InvalidQuantity` for zero or anything above [`Self::MAX`].
    pub const fn new(value: u32) -> Result<Self, InvalidQuantity> {
        if value == 0 || value > Self::MAX {
            return Err(InvalidQuantity);
        }
        Ok(Self(value))
    }

    /// Parse a quantity from a form field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` if the field is not a positive integer in range.
    pub fn parse(s: &str) -> Result<Self, InvalidQuantity> {
        let value: u32 = s.trim().parse().map_err(|_| InvalidQuantity)?;
        Self::new(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

// =============================================================================
// Lines
// =============================================================================

/// One product's entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub image: String,
    /// Unit price at the time of the last add.
    pub price: Price,
    pub quantity: u32,
    /// Always `price × quantity`.
    pub total_price: Price,
}

impl CartLine {
    fn new(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            image: product.image.clone(),
            price: product.price,
            quantity,
            total_price: product.price.times(quantity),
        }
    }
}

/// Line items in insertion order.
///
/// Serialized as a JSON array of `[product_id, line]` pairs. Sessions and
/// order rows hold this encoding, and arrays keep their order through
/// `serde_json::Value` and `jsonb` where object keys would be re-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartItems(Vec<CartLine>);

impl CartItems {
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.0.iter().find(|line| &line.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn total_quantity(&self) -> u32 {
        self.0
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    fn total_price(&self) -> Price {
        self.0.iter().map(|line| line.total_price).sum()
    }
}

impl Serialize for CartItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for line in &self.0 {
            seq.serialize_element(&(&line.id, line))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for CartItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(ProductId, CartLine)>::deserialize(deserializer)?;

        let mut lines: Vec<CartLine> = Vec::with_capacity(pairs.len());
        for (id, mut line) in pairs {
            // The pair key is authoritative.
            line.id = id;
            lines.retain(|existing| existing.id != line.id);
            lines.push(line);
        }
        Ok(Self(lines))
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A non-empty cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    items: CartItems,
    total_quantity: u32,
    total_price: Price,
}

/// Wire form of a cart. Aggregates read from storage are discarded and
/// recomputed from the lines.
#[derive(Deserialize)]
struct StoredCart {
    items: CartItems,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        Self::from_items(stored.items)
    }
}

impl Cart {
    fn from_items(items: CartItems) -> Self {
        let total_quantity = items.total_quantity();
        let total_price = items.total_price();
        Self {
            items,
            total_quantity,
            total_price,
        }
    }

    /// Add `quantity` units of `product` to `cart`, creating the cart if needed.
    ///
    /// If the product already has a line, its quantity is increased and its
    /// total is recomputed from the product's current price. Otherwise a new
    /// line is appended.
    #[must_use]
    pub fn add_item(cart: Option<Self>, product: &Product, quantity: Quantity) -> Self {
        let mut lines = cart.map(|c| c.items.0).unwrap_or_default();

        if let Some(line) = lines.iter_mut().find(|line| line.id == product.id) {
            let merged = line.quantity.saturating_add(quantity.get());
            *line = CartLine::new(product, merged);
        } else {
            lines.push(CartLine::new(product, quantity.get()));
        }

        Self::from_items(CartItems(lines))
    }

    /// Remove the line for `id`.
    ///
    /// Removing an id that is not in the cart returns the cart unchanged.
    /// Returns `None` when the last line is removed.
    #[must_use]
    pub fn remove_item(self, id: &ProductId) -> Option<Self> {
        if self.items.get(id).is_none() {
            return Some(self);
        }

        let mut lines = self.items.0;
        lines.retain(|line| &line.id != id);

        let cart = Self::from_items(CartItems(lines));
        if cart.total_quantity == 0 {
            None
        } else {
            Some(cart)
        }
    }

    #[must_use]
    pub const fn items(&self) -> &CartItems {
        &self.items
    }

    #[must_use]
    pub const fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    #[must_use]
    pub const fn total_price(&self) -> Price {
        self.total_price
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_items(self) -> CartItems {
        self.items
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// The cart view returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub email: Email,
    /// `[id, line]` pairs in insertion order.
    pub items: CartItems,
    pub all_total_quantity: u32,
    pub all_total_price: Price,
}

impl CartSnapshot {
    /// Build the view for `email`. An absent cart renders as no items and
    /// zero totals.
    #[must_use]
    pub fn new(email: Email, cart: Option<&Cart>) -> Self {
        match cart {
            Some(cart) => Self {
                email,
                items: cart.items.clone(),
                all_total_quantity: cart.total_quantity,
                all_total_price: cart.total_price,
            },
            None => Self {
                email,
                items: CartItems::default(),
                all_total_quantity: 0,
                all_total_price: Price::ZERO,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::product::NewProduct;
    use crate::types::UnixTimestamp;

    fn product(id: &str, price: &str) -> Product {
        NewProduct::parse(&format!("Product {id}"), price, "SKU", "http://x/1.png")
            .unwrap()
            .into_product(ProductId::new(id), UnixTimestamp::from_secs_f64(1.0))
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn price(s: &str) -> Price {
        Price::parse(s).unwrap()
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0), Err(InvalidQuantity));
        assert_eq!(Quantity::parse("-1"), Err(InvalidQuantity));
        assert_eq!(Quantity::parse("two"), Err(InvalidQuantity));
        assert_eq!(Quantity::parse(" 3 ").unwrap().get(), 3);
        assert!(Quantity::new(Quantity::MAX + 1).is_err());
    }

    #[test]
    fn test_limit_is_per_add_not_per_line() {
        let widget = product("w", "1");
        let cart = Cart::add_item(None, &widget, qty(Quantity::MAX));
        let cart = Cart::add_item(Some(cart), &widget, qty(Quantity::MAX));

        assert_eq!(cart.items().get(&widget.id).unwrap().quantity, 2 * Quantity::MAX);
        assert_eq!(cart.total_quantity(), 2 * Quantity::MAX);
    }

    #[test]
    fn test_first_add_creates_cart() {
        let widget = product("w", "9.99");
        let cart = Cart::add_item(None, &widget, qty(2));

        assert_eq!(cart.items().len(), 1);
        let line = cart.items().get(&widget.id).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.total_price, price("19.98"));
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_price(), price("19.98"));
    }

    #[test]
    fn test_same_id_merges_into_one_line() {
        let widget = product("w", "2.50");
        let cart = Cart::add_item(None, &widget, qty(1));
        let cart = Cart::add_item(Some(cart), &widget, qty(3));

        assert_eq!(cart.items().len(), 1);
        let line = cart.items().get(&widget.id).unwrap();
        assert_eq!(line.quantity, 4);
        assert_eq!(line.total_price, price("10"));
    }

    #[test]
    fn test_merge_uses_current_price() {
        let old = product("w", "1.00");
        let repriced = product("w", "2.00");
        let cart = Cart::add_item(None, &old, qty(2));
        let cart = Cart::add_item(Some(cart), &repriced, qty(1));

        let line = cart.items().get(&old.id).unwrap();
        assert_eq!(line.price, price("2.00"));
        assert_eq!(line.total_price, price("6.00"));
        assert_eq!(cart.total_price(), price("6.00"));
    }

    #[test]
    fn test_aggregates_are_sums_over_lines() {
        let a = product("a", "0.10");
        let b = product("b", "0.20");
        let c = product("c", "3.33");

        let mut cart = None;
        for (p, n) in [(&a, 1), (&b, 2), (&a, 4), (&c, 3), (&b, 1)] {
            cart = Some(Cart::add_item(cart, p, qty(n)));
        }
        let cart = cart.unwrap();

        assert_eq!(cart.total_quantity(), 11);
        // a: 5 × 0.10, b: 3 × 0.20, c: 3 × 3.33
        assert_eq!(cart.total_price(), price("11.09"));
        let ids: Vec<_> = cart.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let cart = Cart::add_item(None, &product("a", "1"), qty(1));
        let after = cart.clone().remove_item(&ProductId::new("zzz"));
        assert_eq!(after, Some(cart));
    }

    #[test]
    fn test_remove_recomputes_aggregates() {
        let a = product("a", "1");
        let b = product("b", "5");
        let cart = Cart::add_item(None, &a, qty(2));
        let cart = Cart::add_item(Some(cart), &b, qty(1));

        let cart = cart.remove_item(&a.id).unwrap();
        assert_eq!(cart.total_quantity(), 1);
        assert_eq!(cart.total_price(), price("5"));
    }

    #[test]
    fn test_remove_last_line_collapses_to_none() {
        let a = product("a", "1");
        let cart = Cart::add_item(None, &a, qty(2));
        assert_eq!(cart.remove_item(&a.id), None);
    }

    #[test]
    fn test_value_round_trip_keeps_insertion_order() {
        let mut cart = None;
        for id in ["zzz", "mmm", "aaa"] {
            cart = Some(Cart::add_item(cart, &product(id, "1"), qty(1)));
        }
        let cart = cart.unwrap();

        // Sessions hold a `serde_json::Value`, not text.
        let value = serde_json::to_value(&cart).unwrap();
        let restored: Cart = serde_json::from_value(value).unwrap();
        let ids: Vec<_> = restored.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["zzz", "mmm", "aaa"]);
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_stored_aggregates_are_recomputed() {
        let cart = Cart::add_item(None, &product("z", "1"), qty(1));
        let cart = Cart::add_item(Some(cart), &product("a", "2"), qty(1));

        let mut json = serde_json::to_value(&cart).unwrap();
        json["total_quantity"] = serde_json::json!(999);
        json["total_price"] = serde_json::json!(0.5);
        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored.total_quantity(), 2);
        assert_eq!(restored.total_price(), price("3"));
    }

    #[test]
    fn test_duplicate_pairs_keep_the_last_line() {
        let json = serde_json::json!([
            ["a", { "id": "a", "name": "A", "sku": "S", "image": "i", "price": 1.0, "quantity": 1, "total_price": 1.0 }],
            ["b", { "id": "b", "name": "B", "sku": "S", "image": "i", "price": 2.0, "quantity": 1, "total_price": 2.0 }],
            ["a", { "id": "x", "name": "A", "sku": "S", "image": "i", "price": 1.0, "quantity": 4, "total_price": 4.0 }]
        ]);
        let items: CartItems = serde_json::from_value(json).unwrap();
        let ids: Vec<_> = items.iter().map(|l| (l.id.as_str(), l.quantity)).collect();
        assert_eq!(ids, [("b", 1), ("a", 4)]);
    }

    #[test]
    fn test_snapshot_shape() {
        let email = Email::parse("bob@example.com").unwrap();
        let cart = Cart::add_item(None, &product("w", "9.99"), qty(2));

        let json = serde_json::to_value(CartSnapshot::new(email.clone(), Some(&cart))).unwrap();
        assert_eq!(json["email"], "bob@example.com");
        assert_eq!(json["items"][0][0], "w");
        assert_eq!(json["items"][0][1]["quantity"], 2);
        assert_eq!(json["all_total_quantity"], 2);
        assert_eq!(json["all_total_price"], 19.98);

        let empty = serde_json::to_value(CartSnapshot::new(email, None)).unwrap();
        assert_eq!(empty["items"], serde_json::json!([]));
        assert_eq!(empty["all_total_quantity"], 0);
    }
}
