use crate::domain::pagination::{Page, PageRequest};
use crate::domain::product::{NewProduct, Product, ProductChanges};
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::product_repo::ProductRepository;

#[derive(Clone, Debug)]
pub struct ProductService {
    pool: DbPool,
    repo: ProductRepository,
}

impl ProductService {
    #[must_use]
    pub const fn new(pool: DbPool, repo: ProductRepository) -> Self {
        Self { pool, repo }
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(skip(self), err)]
    pub async fn list(&self, request: PageRequest) -> Result<Page<Product>> {
        let mut conn = self.pool.acquire().await?;
        let (items, total) = self.repo.list(&mut conn, request).await?;
        Ok(Page { items, total, request })
    }

    /// # Errors
    /// Returns `AppError::NotFound` if no product has this id.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn get(&self, id: i64) -> Result<Product> {
        let mut conn = self.pool.acquire().await?;
        self.repo.find_by_id(&mut conn, id).await?.ok_or(AppError::NotFound)
    }

    /// # Errors
    /// Returns `AppError::Validation` for invalid fields and `AppError::Conflict` for a duplicate SKU.
    #[tracing::instrument(skip(self, product), fields(sku = %product.sku), err(level = "debug"))]
    pub async fn create(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;

        let mut conn = self.pool.acquire().await?;
        let created = self.repo.create(&mut conn, &product).await?;

        tracing::info!(product_id = created.id, "Product created");
        Ok(created)
    }

    /// # Errors
    /// Returns `AppError::Validation` for invalid fields and `AppError::NotFound` for an unknown id.
    #[tracing::instrument(skip(self, changes), err(level = "debug"))]
    pub async fn update(&self, id: i64, changes: ProductChanges) -> Result<Product> {
        changes.validate()?;

        let mut conn = self.pool.acquire().await?;
        if changes.is_empty() {
            return self.repo.find_by_id(&mut conn, id).await?.ok_or(AppError::NotFound);
        }

        let updated = self.repo.update(&mut conn, id, &changes).await?.ok_or(AppError::NotFound)?;
        tracing::info!(product_id = id, "Product updated");
        Ok(updated)
    }

    /// # Errors
    /// Returns `AppError::NotFound` if nothing was deleted.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if !self.repo.delete(&mut conn, id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(product_id = id, "Product deleted");
        Ok(())
    }
}
