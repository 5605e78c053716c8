use crate::domain::product::Product;
use time::OffsetDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: f64,
    pub quantity: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            sku: record.sku,
            price: record.price,
            quantity: record.quantity,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
