use crate::domain::pagination::Page;
use crate::domain::product::{NewProduct, Product as DomainProduct, ProductChanges};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<DomainProduct> for Product {
    fn from(product: DomainProduct) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            sku: product.sku,
            price: product.price,
            quantity: product.quantity,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sku: String,
    pub price: f64,
    pub quantity: i32,
}

impl From<CreateProduct> for NewProduct {
    fn from(body: CreateProduct) -> Self {
        Self {
            name: body.name,
            description: body.description,
            sku: body.sku,
            price: body.price,
            quantity: body.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
}

impl From<UpdateProduct> for ProductChanges {
    fn from(body: UpdateProduct) -> Self {
        Self {
            name: body.name,
            description: body.description,
            sku: body.sku,
            price: body.price,
            quantity: body.quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// Number of pages needed to show `total` rows, at least one.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        let total = u64::try_from(self.total).unwrap_or(0);
        total.div_ceil(u64::from(self.limit.max(1))).max(1)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}

impl From<Page<DomainProduct>> for Paginated<Product> {
    fn from(page: Page<DomainProduct>) -> Self {
        Self {
            data: page.items.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.request.page,
            limit: page.request.limit,
        }
    }
}
