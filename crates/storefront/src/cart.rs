//! The visitor's cart, kept in the session until checkout.
//!
//! Stock checks here are advisory. The backend re-validates everything when
//! the cart is synced at checkout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use applegym_core::{ItemId, ItemKind, Price};

use crate::catalog::{self, CatalogItem};

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub price: Price,
    /// Always at least 1.
    pub quantity: u32,
    pub icon: String,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    fn is(&self, kind: ItemKind, id: ItemId) -> bool {
        self.kind == kind && self.id == id
    }
}

/// Cart errors shown to the visitor as notifications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item not found")]
    ItemNotFound,
    #[error("{name} is out of stock")]
    OutOfStock { name: String },
    #[error("No more stock available for {name}")]
    StockExhausted { name: String },
    #[error("Not enough stock for {name} (only {available} available)")]
    InsufficientStock { name: String, available: u32 },
}

/// Cart lines keyed by `(kind, id)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `item`.
    ///
    /// # Errors
    ///
    /// `OutOfStock` for a product with no stock, `StockExhausted` when the
    /// cart already holds every unit.
    pub fn add(&mut self, item: &CatalogItem) -> Result<&CartItem, CartError> {
        if let Some(0) = item.stock {
            return Err(CartError::OutOfStock {
                name: item.name.clone(),
            });
        }

        match self.position(item.kind, item.id) {
            Some(index) => {
                let line = self.items.get_mut(index).ok_or(CartError::ItemNotFound)?;
                if item.stock.is_some_and(|stock| line.quantity >= stock) {
                    return Err(CartError::StockExhausted {
                        name: item.name.clone(),
                    });
                }
                line.quantity += 1;
                Ok(&*line)
            }
            None => {
                self.items.push(CartItem {
                    id: item.id,
                    kind: item.kind,
                    name: item.name.clone(),
                    price: item.price,
                    quantity: 1,
                    icon: item.icon.clone(),
                });
                self.items.last().ok_or(CartError::ItemNotFound)
            }
        }
    }

    /// Look the item up in `items` and add one unit of it.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if the catalog has no such item, otherwise as [`Cart::add`].
    pub fn add_from(
        &mut self,
        items: &[CatalogItem],
        kind: ItemKind,
        id: ItemId,
    ) -> Result<&CartItem, CartError> {
        let item = catalog::find(items, kind, id).ok_or(CartError::ItemNotFound)?;
        self.add(item)
    }

    /// Change a line's quantity by `delta`.
    ///
    /// A missing line is a no-op. A result of zero or less removes the line.
    /// `stock` of `None` means unlimited.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` if the new quantity would exceed `stock`; the line
    /// is left unchanged.
    pub fn change_quantity(
        &mut self,
        kind: ItemKind,
        id: ItemId,
        delta: i64,
        stock: Option<u32>,
    ) -> Result<Option<&CartItem>, CartError> {
        let Some(index) = self.position(kind, id) else {
            return Ok(None);
        };
        let Some(current) = self.items.get(index).map(|line| line.quantity) else {
            return Ok(None);
        };

        let new_quantity = i64::from(current) + delta;
        if new_quantity <= 0 {
            self.items.remove(index);
            return Ok(None);
        }

        let Some(line) = self.items.get_mut(index) else {
            return Ok(None);
        };
        if let Some(stock) = stock
            && new_quantity > i64::from(stock)
        {
            return Err(CartError::InsufficientStock {
                name: line.name.clone(),
                available: stock,
            });
        }

        line.quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        Ok(Some(&*line))
    }

    /// Remove a line, returning it.
    pub fn remove(&mut self, kind: ItemKind, id: ItemId) -> Option<CartItem> {
        let index = self.position(kind, id)?;
        Some(self.items.remove(index))
    }

    /// Quantity of an item currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, kind: ItemKind, id: ItemId) -> u32 {
        self.items
            .iter()
            .find(|line| line.is(kind, id))
            .map_or(0, |line| line.quantity)
    }

    /// Sum of every line total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of every line quantity.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, kind: ItemKind, id: ItemId) -> Option<usize> {
        self.items.iter().position(|line| line.is(kind, id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn dumbbells(stock: u32) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(1),
            kind: ItemKind::Product,
            name: "Mancuernas".to_string(),
            description: String::new(),
            price: Price::from_cents(4500),
            stock: Some(stock),
            duration_minutes: None,
            category: "Pesas".to_string(),
            icon: "fas fa-dumbbell".to_string(),
        }
    }

    fn yoga() -> CatalogItem {
        CatalogItem {
            id: ItemId::new(1),
            kind: ItemKind::Service,
            name: "Yoga".to_string(),
            description: String::new(),
            price: Price::from_cents(2000),
            stock: None,
            duration_minutes: Some(60),
            category: "Clases".to_string(),
            icon: "fas fa-spa".to_string(),
        }
    }

    #[test]
    fn test_add_new_then_increment() {
        let mut cart = Cart::default();
        cart.add(&dumbbells(3)).unwrap();
        let line = cart.add(&dumbbells(3)).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_add_out_of_stock() {
        let mut cart = Cart::default();
        let err = cart.add(&dumbbells(0)).unwrap_err();
        assert_eq!(
            err,
            CartError::OutOfStock {
                name: "Mancuernas".to_string()
            }
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_stock_exhausted() {
        let mut cart = Cart::default();
        cart.add(&dumbbells(1)).unwrap();
        let err = cart.add(&dumbbells(1)).unwrap_err();
        assert!(matches!(err, CartError::StockExhausted { .. }));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_product_and_service_with_same_id_are_separate_lines() {
        let mut cart = Cart::default();
        cart.add(&dumbbells(5)).unwrap();
        cart.add(&yoga()).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.quantity_of(ItemKind::Service, ItemId::new(1)), 1);
    }

    #[test]
    fn test_add_from_unknown_item() {
        let mut cart = Cart::default();
        let err = cart
            .add_from(&[dumbbells(5)], ItemKind::Service, ItemId::new(1))
            .unwrap_err();
        assert_eq!(err, CartError::ItemNotFound);
    }

    #[test]
    fn test_change_quantity_respects_stock() {
        let mut cart = Cart::default();
        cart.add(&dumbbells(2)).unwrap();

        let line = cart
            .change_quantity(ItemKind::Product, ItemId::new(1), 1, Some(2))
            .unwrap()
            .unwrap();
        assert_eq!(line.quantity, 2);

        let err = cart
            .change_quantity(ItemKind::Product, ItemId::new(1), 1, Some(2))
            .unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { available: 2, .. }));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_change_quantity_to_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add(&yoga()).unwrap();
        let result = cart
            .change_quantity(ItemKind::Service, ItemId::new(1), -1, None)
            .unwrap();
        assert!(result.is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_below_zero_removes_only_that_line() {
        let mut cart = Cart::default();
        cart.add(&dumbbells(5)).unwrap();
        cart.add(&dumbbells(5)).unwrap();
        cart.add(&yoga()).unwrap();

        let line = cart
            .change_quantity(ItemKind::Product, ItemId::new(1), -1, Some(5))
            .unwrap()
            .unwrap();
        assert_eq!(line.quantity, 1);

        let result = cart
            .change_quantity(ItemKind::Product, ItemId::new(1), -3, Some(5))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].kind, ItemKind::Service);
    }

    #[test]
    fn test_change_quantity_missing_line_is_noop() {
        let mut cart = Cart::default();
        let result = cart
            .change_quantity(ItemKind::Product, ItemId::new(42), 1, Some(10))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_totals_and_clear() {
        let mut cart = Cart::default();
        cart.add(&dumbbells(5)).unwrap();
        cart.add(&dumbbells(5)).unwrap();
        cart.add(&yoga()).unwrap();

        assert_eq!(cart.total(), Price::from_cents(11_000));
        assert_eq!(cart.item_count(), 3);

        let removed = cart.remove(ItemKind::Product, ItemId::new(1)).unwrap();
        assert_eq!(removed.quantity, 2);
        assert_eq!(cart.total(), Price::from_cents(2000));

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_session_round_trip_shape() {
        let mut cart = Cart::default();
        cart.add(&yoga()).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["items"][0]["kind"], "servicios");
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
