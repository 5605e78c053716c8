use crate::api::schemas::products::{CreateProduct, Paginated, Product, UpdateProduct};
use crate::client::error::Result;
use crate::client::http::HttpClient;

/// Product catalogue calls. All of them go through the refresh interceptor.
#[derive(Clone, Debug)]
pub struct ProductsClient {
    http: HttpClient,
}

impl ProductsClient {
    pub(crate) const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Lists one page of products. `None` leaves the server default in place.
    ///
    /// # Errors
    /// See [`crate::client::ClientError`].
    pub async fn list(&self, page: Option<u32>, limit: Option<u32>) -> Result<Paginated<Product>> {
        let query = page
            .map(|p| ("page".to_string(), p.to_string()))
            .into_iter()
            .chain(limit.map(|l| ("limit".to_string(), l.to_string())))
            .collect();

        self.http.get_with_query("/products", query).await
    }

    /// # Errors
    /// `ClientError::Api` with 404 if the product does not exist.
    pub async fn get(&self, id: i64) -> Result<Product> {
        self.http.get(&format!("/products/{id}")).await
    }

    /// # Errors
    /// `ClientError::Api` with 400 and field errors for invalid input, 409 for a duplicate SKU.
    pub async fn create(&self, product: &CreateProduct) -> Result<Product> {
        self.http.post("/products", product).await
    }

    /// # Errors
    /// `ClientError::Api` with 404 if the product does not exist.
    pub async fn update(&self, id: i64, changes: &UpdateProduct) -> Result<Product> {
        self.http.put(&format!("/products/{id}"), changes).await
    }

    /// # Errors
    /// `ClientError::Api` with 404 if the product does not exist.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.http.delete(&format!("/products/{id}")).await
    }
}
