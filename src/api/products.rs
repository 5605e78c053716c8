use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::products::{CreateProduct, PageQuery, Paginated, Product, UpdateProduct};
use crate::domain::pagination::PageRequest;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

pub async fn list_products(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let request = PageRequest::new(query.page, query.limit)?;
    let page = state.product_service.list(request).await?;
    Ok(Json(Paginated::<Product>::from(page)))
}

pub async fn get_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let product = state.product_service.get(id).await?;
    Ok(Json(Product::from(product)))
}

pub async fn create_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProduct>,
) -> Result<impl IntoResponse> {
    let product = state.product_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(Product::from(product))))
}

pub async fn update_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProduct>,
) -> Result<impl IntoResponse> {
    let product = state.product_service.update(id, payload.into()).await?;
    Ok(Json(Product::from(product)))
}

pub async fn delete_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.product_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
