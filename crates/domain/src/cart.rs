//! Shopping cart and its lines.

use common::{CartId, ProductRef};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Highest unit price accepted into a cart, in cents ($1,000,000).
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000;

fn check_quantity(quantity: u64) -> Result<u32, DomainError> {
    if quantity == 0 {
        return Err(DomainError::InvalidQuantity { quantity: 0 });
    }
    if quantity > u64::from(MAX_LINE_QUANTITY) {
        return Err(DomainError::QuantityTooLarge {
            quantity,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(quantity as u32)
}

/// A product in the cart at the price it was offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_ref: ProductRef,
    /// Display name, captured on the order line at purchase time.
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(
        product_ref: impl Into<ProductRef>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_ref: product_ref.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Quantity and unit price are bounded so line and order totals stay
    /// far inside `i64` cents.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_quantity(u64::from(self.quantity))?;
        if self.unit_price.is_negative() {
            return Err(DomainError::InvalidPrice {
                price: self.unit_price.cents(),
            });
        }
        if self.unit_price.cents() > MAX_UNIT_PRICE_CENTS {
            return Err(DomainError::PriceTooLarge {
                price: self.unit_price.cents(),
                max: MAX_UNIT_PRICE_CENTS,
            });
        }
        if self.product_ref.as_str().trim().is_empty() {
            return Err(DomainError::MissingField("product_ref"));
        }
        Ok(())
    }
}

/// The buyer's mutable cart. Checkout works on a [`Cart::snapshot`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(id: CartId) -> Self {
        Self {
            id,
            lines: Vec::new(),
        }
    }

    pub fn id(&self) -> CartId {
        self.id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a line, merging quantities when the product is already present.
    pub fn add_line(&mut self, line: CartLine) -> Result<(), DomainError> {
        line.validate()?;
        match self
            .lines
            .iter_mut()
            .find(|existing| existing.product_ref == line.product_ref)
        {
            Some(existing) => {
                existing.quantity =
                    check_quantity(u64::from(existing.quantity) + u64::from(line.quantity))?;
                existing.unit_price = line.unit_price;
                existing.name = line.name;
            }
            None => self.lines.push(line),
        }
        Ok(())
    }

    /// Sets the quantity of a line; zero removes it.
    pub fn set_quantity(
        &mut self,
        product_ref: &ProductRef,
        quantity: u32,
    ) -> Result<(), DomainError> {
        if quantity == 0 {
            return self.remove_line(product_ref);
        }
        let quantity = check_quantity(u64::from(quantity))?;
        let line = self
            .lines
            .iter_mut()
            .find(|line| &line.product_ref == product_ref)
            .ok_or_else(|| DomainError::ItemNotFound {
                product_ref: product_ref.to_string(),
            })?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_line(&mut self, product_ref: &ProductRef) -> Result<(), DomainError> {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_ref != product_ref);
        if self.lines.len() == before {
            return Err(DomainError::ItemNotFound {
                product_ref: product_ref.to_string(),
            });
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns an immutable copy of the lines for checkout.
    pub fn snapshot(&self) -> Result<Vec<CartLine>, DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        Ok(self.lines.clone())
    }
}
