use crate::domain::validation::FieldError;
use time::OffsetDateTime;

pub const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: f64,
    pub quantity: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: f64,
    pub quantity: i32,
}

/// A partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
}

impl NewProduct {
    /// # Errors
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        check_sku(&self.sku, &mut errors);
        check_price(self.price, &mut errors);
        check_quantity(self.quantity, &mut errors);
        finish(errors)
    }
}

impl ProductChanges {
    /// # Errors
    /// Returns every failing field among those present.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name(name, &mut errors);
        }
        if let Some(sku) = &self.sku {
            check_sku(sku, &mut errors);
        }
        if let Some(price) = self.price {
            check_price(price, &mut errors);
        }
        if let Some(quantity) = self.quantity {
            check_quantity(quantity, &mut errors);
        }
        finish(errors)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.sku.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
    }
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let name = name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Must not be empty"));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new("name", format!("Must be at most {MAX_NAME_LEN} characters")));
    }
}

fn check_sku(sku: &str, errors: &mut Vec<FieldError>) {
    if sku.trim().is_empty() {
        errors.push(FieldError::new("sku", "Must not be empty"));
    }
}

fn check_price(price: f64, errors: &mut Vec<FieldError>) {
    if !price.is_finite() || price < 0.0 {
        errors.push(FieldError::new("price", "Must be a non-negative number"));
    }
}

fn check_quantity(quantity: i32, errors: &mut Vec<FieldError>) {
    if quantity < 0 {
        errors.push(FieldError::new("quantity", "Must not be negative"));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
