use super::common::{
    created_response, map_service_error, no_content_response, success_response, BusquedaParams,
    PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::stock::{
        ActualizarStockRequest, EstadisticasStock, InicializarStockRequest, MovimientoStockRequest,
        StockConProducto,
    },
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Fila de inventario con el producto incorporado.
#[derive(Debug, Serialize, ToSchema)]
pub struct StockResponse {
    pub id_stock: i64,
    pub id_producto: i64,
    pub nombre_producto: Option<String>,
    pub codigo_producto: Option<String>,
    pub stock_minimo: Option<i32>,
    pub cantidad: i32,
    pub ubicacion: String,
    pub fecha_ultimo_movimiento: NaiveDateTime,
}

impl From<StockConProducto> for StockResponse {
    fn from(fila: StockConProducto) -> Self {
        let StockConProducto { stock, producto } = fila;
        Self {
            id_stock: stock.id_stock,
            id_producto: stock.id_producto,
            nombre_producto: producto.as_ref().map(|p| p.nombre_producto.clone()),
            codigo_producto: producto.as_ref().map(|p| p.codigo_producto.clone()),
            stock_minimo: producto.map(|p| p.stock_minimo),
            cantidad: stock.cantidad,
            ubicacion: stock.ubicacion,
            fecha_ultimo_movimiento: stock.fecha_ultimo_movimiento,
        }
    }
}

fn default_cantidad() -> i32 {
    1
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DisponibilidadParams {
    /// Cantidad requerida a verificar contra la existencia.
    #[serde(default = "default_cantidad")]
    pub cantidad: i32,
}

/// Lista paginada del inventario con el producto incorporado
#[utoipa::path(
    get,
    path = "/api/stock",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de stock", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (filas, total) = state
        .services
        .stock
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<StockResponse> = filas.into_iter().map(StockResponse::from).collect();

    Ok(success_response(PaginatedResponse::new(
        filas, page, per_page, total,
    )))
}

/// Devuelve un registro de stock por su ID
#[utoipa::path(
    get,
    path = "/api/stock/{id}",
    params(("id" = i64, Path, description = "ID del registro de stock")),
    responses(
        (status = 200, description = "Registro encontrado", body = crate::ApiResponse<StockResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let fila = state
        .services
        .stock
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(StockResponse::from(fila)))
}

/// Stock de un producto
#[utoipa::path(
    get,
    path = "/api/stock/producto/{id_producto}",
    params(("id_producto" = i64, Path, description = "ID del producto")),
    responses(
        (status = 200, description = "Stock del producto", body = crate::ApiResponse<StockResponse>),
        (status = 404, description = "El producto no tiene stock registrado", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn get_stock_por_producto(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id_producto): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let fila = state
        .services
        .stock
        .por_producto(id_producto)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(StockResponse::from(fila)))
}

/// Busca stock por nombre o codigo de producto
#[utoipa::path(
    get,
    path = "/api/stock/buscar",
    params(BusquedaParams),
    responses(
        (status = 200, description = "Coincidencias", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn buscar_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<BusquedaParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filas = state
        .services
        .stock
        .buscar(&params.q)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<StockResponse> = filas.into_iter().map(StockResponse::from).collect();

    Ok(success_response(filas))
}

/// Verifica si hay existencia suficiente de un producto
#[utoipa::path(
    get,
    path = "/api/stock/disponibilidad/{id_producto}",
    params(
        ("id_producto" = i64, Path, description = "ID del producto"),
        DisponibilidadParams
    ),
    responses(
        (status = 200, description = "Disponibilidad calculada", body = crate::ApiResponse<crate::services::stock::DisponibilidadStock>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn verificar_disponibilidad(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id_producto): Path<i64>,
    Query(params): Query<DisponibilidadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let disponibilidad = state
        .services
        .stock
        .disponibilidad(id_producto, params.cantidad)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(disponibilidad))
}

/// Productos en o bajo su stock minimo
#[utoipa::path(
    get,
    path = "/api/stock/bajo-minimo",
    responses(
        (status = 200, description = "Productos por reponer", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn stock_bajo_minimo(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let filas = state
        .services
        .stock
        .bajo_minimo()
        .await
        .map_err(map_service_error)?;

    let filas: Vec<StockResponse> = filas.into_iter().map(StockResponse::from).collect();

    Ok(success_response(filas))
}

/// Ajuste absoluto de una fila de stock
#[utoipa::path(
    put,
    path = "/api/stock/{id}",
    params(("id" = i64, Path, description = "ID del registro de stock")),
    request_body = ActualizarStockRequest,
    responses(
        (status = 200, description = "Stock actualizado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Cantidad negativa", body = crate::errors::ErrorResponse),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fila = state
        .services
        .stock
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(fila))
}

/// Registra una entrada o salida de mercaderia
#[utoipa::path(
    post,
    path = "/api/stock/movimiento",
    request_body = MovimientoStockRequest,
    responses(
        (status = 200, description = "Movimiento aplicado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Cantidad o tipo invalidos", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sin registro de stock para la salida", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock insuficiente", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn movimiento_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<MovimientoStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fila = state
        .services
        .stock
        .movimiento(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        stock_id = fila.id_stock,
        producto_id = fila.id_producto,
        cantidad = fila.cantidad,
        "Movimiento de stock via API"
    );
    Ok(success_response(fila))
}

/// Crea el registro de stock inicial de un producto
#[utoipa::path(
    post,
    path = "/api/stock/inicializar",
    request_body = InicializarStockRequest,
    responses(
        (status = 201, description = "Stock inicializado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Producto inexistente o cantidad negativa", body = crate::errors::ErrorResponse),
        (status = 409, description = "El producto ya tiene stock", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn inicializar_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<InicializarStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fila = state
        .services
        .stock
        .inicializar(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        stock_id = fila.id_stock,
        producto_id = fila.id_producto,
        "Stock inicializado via API"
    );
    Ok(created_response(fila))
}

/// Resumen del inventario
#[utoipa::path(
    get,
    path = "/api/stock/estadisticas",
    responses(
        (status = 200, description = "Totales del inventario", body = crate::ApiResponse<EstadisticasStock>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn estadisticas_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let estadisticas = state
        .services
        .stock
        .estadisticas()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(estadisticas))
}

/// Elimina un registro de stock
#[utoipa::path(
    delete,
    path = "/api/stock/{id}",
    params(("id" = i64, Path, description = "ID del registro de stock")),
    responses(
        (status = 204, description = "Registro eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn delete_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .stock
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    info!(stock_id = id, "Registro de stock eliminado via API");
    Ok(no_content_response())
}
