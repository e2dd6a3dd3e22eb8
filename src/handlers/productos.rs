use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::productos::{ActualizarProductoRequest, CrearProductoRequest, ProductoConRelaciones},
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

/// Producto con el nombre del proveedor y la existencia actual incorporados.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductoResponse {
    pub id_producto: i64,
    pub nombre_producto: String,
    pub descripcion: Option<String>,
    pub codigo_producto: String,
    pub categoria: String,
    pub marca: Option<String>,
    pub precio: Decimal,
    pub precio_compra: Option<Decimal>,
    pub unidad_medida: String,
    pub stock_minimo: i32,
    pub activo: bool,
    pub id_proveedor: Option<i64>,
    pub nombre_proveedor: Option<String>,
    pub stock_actual: Option<i32>,
    pub fecha_registro: NaiveDateTime,
    pub fecha_modificacion: NaiveDateTime,
}

impl From<ProductoConRelaciones> for ProductoResponse {
    fn from(fila: ProductoConRelaciones) -> Self {
        let ProductoConRelaciones {
            producto,
            proveedor,
            stock,
        } = fila;
        Self {
            id_producto: producto.id_producto,
            nombre_producto: producto.nombre_producto,
            descripcion: producto.descripcion,
            codigo_producto: producto.codigo_producto,
            categoria: producto.categoria,
            marca: producto.marca,
            precio: producto.precio,
            precio_compra: producto.precio_compra,
            unidad_medida: producto.unidad_medida,
            stock_minimo: producto.stock_minimo,
            activo: producto.activo,
            id_proveedor: producto.id_proveedor,
            nombre_proveedor: proveedor.map(|p| p.nombre_proveedor),
            stock_actual: stock.map(|s| s.cantidad),
            fecha_registro: producto.fecha_registro,
            fecha_modificacion: producto.fecha_modificacion,
        }
    }
}

/// Lista paginada del catalogo con proveedor y existencia
#[utoipa::path(
    get,
    path = "/api/productos",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de productos", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "productos"
)]
pub async fn list_productos(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (productos, total) = state
        .services
        .productos
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<ProductoResponse> = productos.into_iter().map(ProductoResponse::from).collect();

    Ok(success_response(PaginatedResponse::new(
        filas, page, per_page, total,
    )))
}

/// Devuelve un producto por su ID
#[utoipa::path(
    get,
    path = "/api/productos/{id}",
    params(("id" = i64, Path, description = "ID del producto")),
    responses(
        (status = 200, description = "Producto encontrado", body = crate::ApiResponse<ProductoResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "productos"
)]
pub async fn get_producto(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let producto = state
        .services
        .productos
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductoResponse::from(producto)))
}

/// Registra un producto en el catalogo
#[utoipa::path(
    post,
    path = "/api/productos",
    request_body = CrearProductoRequest,
    responses(
        (status = 201, description = "Producto creado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Datos invalidos o proveedor inexistente", body = crate::errors::ErrorResponse),
        (status = 409, description = "Codigo de producto duplicado", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "productos"
)]
pub async fn create_producto(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CrearProductoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let producto = state
        .services
        .productos
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    info!(producto_id = producto.id_producto, "Producto creado via API");
    Ok(created_response(producto))
}

/// Actualiza un producto
#[utoipa::path(
    put,
    path = "/api/productos/{id}",
    params(("id" = i64, Path, description = "ID del producto")),
    request_body = ActualizarProductoRequest,
    responses(
        (status = 200, description = "Producto actualizado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Codigo de producto duplicado", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "productos"
)]
pub async fn update_producto(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarProductoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let producto = state
        .services
        .productos
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(producto))
}

/// Elimina un producto sin movimientos asociados
#[utoipa::path(
    delete,
    path = "/api/productos/{id}",
    params(("id" = i64, Path, description = "ID del producto")),
    responses(
        (status = 204, description = "Producto eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Referenciado por facturas o pedidos", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "productos"
)]
pub async fn delete_producto(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .productos
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    info!(producto_id = id, "Producto eliminado via API");
    Ok(no_content_response())
}
