use crate::{
    dto::cart::{CheckoutItem, CheckoutRequest},
    error::{AppError, AppResult},
    models::Product,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: u32,
}

/// Selected product ids and their quantities, in selection order.
///
/// Every operation returns a new cart and leaves the receiver untouched.
/// A product is selected exactly when it has a line; quantities never drop
/// below one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn contains(&self, product_id: i64) -> bool {
        self.position(product_id).is_some()
    }

    pub fn quantity(&self, product_id: i64) -> Option<u32> {
        self.position(product_id).map(|i| self.lines[i].quantity)
    }

    fn position(&self, product_id: i64) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == product_id)
    }

    /// Deselects `product_id` if selected, otherwise selects it with quantity one.
    #[must_use]
    pub fn toggle_select(&self, product_id: i64) -> Self {
        let mut next = self.clone();
        match next.position(product_id) {
            Some(i) => {
                next.lines.remove(i);
            }
            None => next.lines.push(CartLine {
                product_id,
                quantity: 1,
            }),
        }
        next
    }

    /// Sets the quantity of an already selected product from raw user input.
    ///
    /// Unparseable, non-finite and sub-one values become one; fractions are
    /// truncated. Unselected ids are left alone.
    #[must_use]
    pub fn set_quantity(&self, product_id: i64, raw: &str) -> Self {
        let mut next = self.clone();
        match next.position(product_id) {
            Some(i) => next.lines[i].quantity = parse_quantity(raw),
            None => {
                tracing::debug!(product_id, "ignoring quantity for unselected product");
            }
        }
        next
    }

    #[must_use]
    pub fn remove(&self, product_id: i64) -> Self {
        let mut next = self.clone();
        next.lines.retain(|l| l.product_id != product_id);
        next
    }

    #[must_use]
    pub fn clear(&self) -> Self {
        Self::default()
    }

    /// Drops lines whose product is no longer in `products`.
    #[must_use]
    pub fn retain_products(&self, products: &[Product]) -> Self {
        let mut next = self.clone();
        next.lines
            .retain(|l| products.iter().any(|p| p.id == l.product_id));
        next
    }

    pub fn to_checkout_request(&self) -> AppResult<CheckoutRequest> {
        if self.is_empty() {
            return Err(AppError::EmptyCart);
        }
        let items = self
            .lines
            .iter()
            .map(|l| CheckoutItem {
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect();
        Ok(CheckoutRequest { items })
    }
}

pub fn parse_quantity(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 1.0 => {
            // saturating float-to-int cast
            value.trunc() as u32
        }
        _ => 1,
    }
}
