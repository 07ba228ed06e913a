//! Session cart and its persisted snapshot.
//!
//! A shopper's cart lives in their session as a product → quantity map. For
//! signed-in shoppers the same map is mirrored into their profile as a JSON
//! object string (`{"3": 2, "7": 1}`) so it can be restored at the next login.
//!
//! # Restoring at login
//!
//! [`CartSnapshot::parse`] validates the stored text before anything touches
//! the session cart:
//!
//! - text that is not a JSON object is rejected outright ([`SnapshotError`]),
//!   and the caller leaves the cart alone
//! - entries whose key is not a positive product ID, or whose value is not a
//!   positive integer that fits in a `u32`, are skipped and reported
//!
//! [`SessionCart::merge_snapshot`] then inserts each valid entry the session
//! does not already hold. Products already in the session keep their session
//! quantity, so logging in twice never inflates a line.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;

/// Errors from cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A quantity of zero was supplied where a line must exist.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// Errors from decoding a persisted cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The text is not valid JSON.
    #[error("saved cart is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The text is valid JSON but not an object.
    #[error("saved cart is not a JSON object")]
    NotAnObject,
}

/// A positive line quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, returning `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for Quantity {
    type Error = CartError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(CartError::ZeroQuantity)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.get()
    }
}

/// Outcome of merging a snapshot into a session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Entries inserted into the session cart.
    pub added: usize,
    /// Entries ignored because the session already held that product.
    pub kept: usize,
    /// Raw keys of snapshot entries that were malformed.
    pub skipped: Vec<String>,
}

/// A decoded cart snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    entries: Vec<(ProductId, Quantity)>,
    skipped: Vec<String>,
}

impl CartSnapshot {
    /// Decode a persisted snapshot.
    ///
    /// Blank text decodes to an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the text is not a JSON object. Malformed
    /// entries inside a valid object are not errors; see [`Self::skipped`].
    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(map) = value else {
            return Err(SnapshotError::NotAnObject);
        };

        let mut snapshot = Self::default();
        for (key, value) in map {
            match decode_entry(&key, &value) {
                Some(entry) => snapshot.entries.push(entry),
                None => snapshot.skipped.push(key),
            }
        }
        Ok(snapshot)
    }

    /// Encode a cart as snapshot text.
    #[must_use]
    pub fn encode(cart: &SessionCart) -> String {
        let map: serde_json::Map<String, serde_json::Value> = cart
            .iter()
            .map(|(id, qty)| (id.to_string(), serde_json::Value::from(qty.get())))
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    /// Valid entries, in the order they appeared.
    #[must_use]
    pub fn entries(&self) -> &[(ProductId, Quantity)] {
        &self.entries
    }

    /// Keys of entries that failed validation.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

fn decode_entry(key: &str, value: &serde_json::Value) -> Option<(ProductId, Quantity)> {
    let id: ProductId = key.parse().ok()?;
    if id.as_i32() <= 0 {
        return None;
    }
    let qty = u32::try_from(value.as_u64()?).ok()?;
    Some((id, Quantity::new(qty)?))
}

/// The per-session cart: one line per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCart {
    lines: BTreeMap<ProductId, Quantity>,
}

impl SessionCart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all quantities, saturating at `u32::MAX`.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .values()
            .fold(0_u32, |acc, q| acc.saturating_add(q.get()))
    }

    /// Quantity held for a product.
    #[must_use]
    pub fn quantity_of(&self, product: ProductId) -> Option<Quantity> {
        self.lines.get(&product).copied()
    }

    /// Product IDs in ascending order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.keys().copied().collect()
    }

    /// Iterate over `(product, quantity)` lines in ascending product order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, Quantity)> + '_ {
        self.lines.iter().map(|(id, qty)| (*id, *qty))
    }

    /// Put a product in the cart with the given quantity, replacing any
    /// existing line for it.
    pub fn set(&mut self, product: ProductId, quantity: Quantity) {
        self.lines.insert(product, quantity);
    }

    /// Set an existing line's quantity from raw input; zero removes the line.
    /// Products not already in the cart are left out.
    ///
    /// Returns `true` if the cart changed.
    pub fn set_quantity(&mut self, product: ProductId, quantity: u32) -> bool {
        let Some(line) = self.lines.get_mut(&product) else {
            return false;
        };
        match Quantity::new(quantity) {
            Some(q) => std::mem::replace(line, q) != q,
            None => self.lines.remove(&product).is_some(),
        }
    }

    /// Remove a product. Returns `true` if it was present.
    pub fn remove(&mut self, product: ProductId) -> bool {
        self.lines.remove(&product).is_some()
    }

    /// Fold a persisted snapshot into this cart.
    ///
    /// Products missing from the session are inserted with the snapshot
    /// quantity; products already present keep their session quantity.
    pub fn merge_snapshot(&mut self, snapshot: &CartSnapshot) -> MergeReport {
        let mut report = MergeReport {
            skipped: snapshot.skipped().to_vec(),
            ..MergeReport::default()
        };

        for &(product, quantity) in snapshot.entries() {
            if self.lines.contains_key(&product) {
                report.kept += 1;
            } else {
                self.lines.insert(product, quantity);
                report.added += 1;
            }
        }

        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_merge_into_empty_cart() {
        let snapshot = CartSnapshot::parse(r#"{"3": 2, "7": 1}"#).unwrap();
        let mut cart = SessionCart::new();

        let report = cart.merge_snapshot(&snapshot);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(ProductId::new(3)), Some(qty(2)));
        assert_eq!(cart.quantity_of(ProductId::new(7)), Some(qty(1)));
        assert_eq!(report.added, 2);
        assert_eq!(report.kept, 0);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_merge_keeps_session_quantity() {
        let snapshot = CartSnapshot::parse(r#"{"3": 5, "4": 1}"#).unwrap();
        let mut cart = SessionCart::new();
        cart.set(ProductId::new(3), qty(1));

        let report = cart.merge_snapshot(&snapshot);

        assert_eq!(cart.quantity_of(ProductId::new(3)), Some(qty(1)));
        assert_eq!(cart.quantity_of(ProductId::new(4)), Some(qty(1)));
        assert_eq!(report.added, 1);
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn test_merge_twice_is_stable() {
        let snapshot = CartSnapshot::parse(r#"{"3": 2}"#).unwrap();
        let mut cart = SessionCart::new();
        cart.merge_snapshot(&snapshot);
        cart.merge_snapshot(&snapshot);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let snapshot =
            CartSnapshot::parse(r#"{"3": 2, "abc": 1, "-4": 1, "5": 0, "6": "2", "8": 1.5, "9": 1}"#)
                .unwrap();

        let ids: Vec<i32> = snapshot.entries().iter().map(|(id, _)| id.as_i32()).collect();
        assert_eq!(ids, vec![3, 9]);

        let mut skipped = snapshot.skipped().to_vec();
        skipped.sort();
        assert_eq!(skipped, vec!["-4", "5", "6", "8", "abc"]);

        let mut cart = SessionCart::new();
        let report = cart.merge_snapshot(&snapshot);
        assert_eq!(report.added, 2);
        assert_eq!(report.skipped.len(), 5);
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(
            CartSnapshot::parse("[1, 2]"),
            Err(SnapshotError::NotAnObject)
        ));
        assert!(matches!(
            CartSnapshot::parse("{not json"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn test_parse_blank_is_empty() {
        let snapshot = CartSnapshot::parse("  ").unwrap();
        assert!(snapshot.entries().is_empty());
        assert!(snapshot.skipped().is_empty());
    }

    #[test]
    fn test_encode_matches_snapshot_format() {
        let mut cart = SessionCart::new();
        cart.set(ProductId::new(7), qty(1));
        cart.set(ProductId::new(3), qty(2));

        let text = CartSnapshot::encode(&cart);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"3": 2, "7": 1}));

        let decoded = CartSnapshot::parse(&text).unwrap();
        let mut restored = SessionCart::new();
        restored.merge_snapshot(&decoded);
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = SessionCart::new();
        cart.set(ProductId::new(1), qty(4));
        assert!(!cart.set_quantity(ProductId::new(1), 4));
        assert!(cart.set_quantity(ProductId::new(1), 2));
        assert_eq!(cart.total_quantity(), 2);
        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity(ProductId::new(1), 0));
    }

    #[test]
    fn test_set_quantity_ignores_products_not_in_cart() {
        let mut cart = SessionCart::new();
        cart.set(ProductId::new(1), qty(1));
        assert!(!cart.set_quantity(ProductId::new(424_242), 5));
        assert!(!cart.set_quantity(ProductId::new(-3), 2));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_session_serde() {
        let mut cart = SessionCart::new();
        cart.set(ProductId::new(3), qty(2));

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value, serde_json::json!({"3": 2}));

        let back: SessionCart = serde_json::from_value(value).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_quantity_rejects_zero_on_deserialize() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("3").unwrap().get(), 3);
    }
}
