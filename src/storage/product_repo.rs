use crate::domain::pagination::PageRequest;
use crate::domain::product::{NewProduct, Product, ProductChanges};
use crate::error::{AppError, Result};
use crate::storage::records::ProductRecord;
use sqlx::PgConnection;

const DUPLICATE_SKU: &str = "A product with this SKU already exists";

#[derive(Clone, Debug, Default)]
pub struct ProductRepository {}

impl ProductRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Fetches one page of products, oldest first, together with the total count.
    ///
    /// # Errors
    /// Returns `AppError::Database` if either query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn list(&self, conn: &mut PgConnection, page: PageRequest) -> Result<(Vec<Product>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products").fetch_one(&mut *conn).await?;

        let records = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, name, description, sku, price, quantity, created_at, updated_at
            FROM products
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok((records.into_iter().map(Into::into).collect(), total))
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn find_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<Option<Product>> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, name, description, sku, price, quantity, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(record.map(Into::into))
    }

    /// # Errors
    /// Returns `AppError::Conflict` on a duplicate SKU.
    #[tracing::instrument(level = "debug", skip(self, conn, product), err)]
    pub(crate) async fn create(&self, conn: &mut PgConnection, product: &NewProduct) -> Result<Product> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            INSERT INTO products (name, description, sku, price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, sku, price, quantity, created_at, updated_at
            ",
        )
        .bind(product.name.trim())
        .bind(product.description.as_deref())
        .bind(product.sku.trim())
        .bind(product.price)
        .bind(product.quantity)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_SKU))?;

        Ok(record.into())
    }

    /// Applies the present fields of `changes`; returns `None` if the product does not exist.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` on a duplicate SKU.
    #[tracing::instrument(level = "debug", skip(self, conn, changes), err)]
    pub(crate) async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        changes: &ProductChanges,
    ) -> Result<Option<Product>> {
        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                sku = COALESCE($4, sku),
                price = COALESCE($5, price),
                quantity = COALESCE($6, quantity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, sku, price, quantity, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.description.as_deref())
        .bind(changes.sku.as_deref().map(str::trim))
        .bind(changes.price)
        .bind(changes.quantity)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_SKU))?;

        Ok(record.map(Into::into))
    }

    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn delete(&self, conn: &mut PgConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
        Ok(result.rows_affected() > 0)
    }
}
