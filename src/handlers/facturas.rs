use super::common::{created_response, map_service_error, success_response, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    entities::factura::{EstadoFactura, MetodoPago},
    errors::ApiError,
    handlers::AppState,
    services::facturas::{
        ActualizarFacturaRequest, CrearFacturaRequest, DetalleConProducto, FacturaCompleta,
        FacturaConCliente,
    },
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

/// Cabecera de factura con el nombre del cliente.
#[derive(Debug, Serialize, ToSchema)]
pub struct FacturaResponse {
    pub id_factura: i64,
    pub numero_factura: String,
    pub fecha: NaiveDate,
    pub subtotal: Decimal,
    pub impuesto: Decimal,
    pub descuento: Decimal,
    pub total: Decimal,
    pub estado: EstadoFactura,
    pub metodo_pago: MetodoPago,
    pub observaciones: Option<String>,
    pub id_cliente: i64,
    pub nombre_cliente: Option<String>,
    pub id_usuario: Option<i64>,
    pub fecha_registro: NaiveDateTime,
    pub fecha_modificacion: NaiveDateTime,
}

impl From<FacturaConCliente> for FacturaResponse {
    fn from(fila: FacturaConCliente) -> Self {
        let FacturaConCliente { factura, cliente } = fila;
        Self {
            id_factura: factura.id_factura,
            numero_factura: factura.numero_factura,
            fecha: factura.fecha,
            subtotal: factura.subtotal,
            impuesto: factura.impuesto,
            descuento: factura.descuento,
            total: factura.total,
            estado: factura.estado,
            metodo_pago: factura.metodo_pago,
            observaciones: factura.observaciones,
            id_cliente: factura.id_cliente,
            nombre_cliente: cliente.map(|c| format!("{} {}", c.nombre, c.apellidos)),
            id_usuario: factura.id_usuario,
            fecha_registro: factura.fecha_registro,
            fecha_modificacion: factura.fecha_modificacion,
        }
    }
}

/// Linea de factura con el producto referenciado.
#[derive(Debug, Serialize, ToSchema)]
pub struct DetalleFacturaResponse {
    pub id_detalle_factura: i64,
    pub id_factura: i64,
    pub id_producto: i64,
    pub nombre_producto: Option<String>,
    pub codigo_producto: Option<String>,
    pub cantidad: i32,
    pub precio_uni: Decimal,
    pub descuento_item: Decimal,
    pub subtotal: Decimal,
}

impl From<DetalleConProducto> for DetalleFacturaResponse {
    fn from(fila: DetalleConProducto) -> Self {
        let DetalleConProducto { detalle, producto } = fila;
        let subtotal =
            Decimal::from(detalle.cantidad) * detalle.precio_uni - detalle.descuento_item;
        Self {
            id_detalle_factura: detalle.id_detalle_factura,
            id_factura: detalle.id_factura,
            id_producto: detalle.id_producto,
            nombre_producto: producto.as_ref().map(|p| p.nombre_producto.clone()),
            codigo_producto: producto.map(|p| p.codigo_producto),
            cantidad: detalle.cantidad,
            precio_uni: detalle.precio_uni,
            descuento_item: detalle.descuento_item,
            subtotal,
        }
    }
}

/// Factura completa: cabecera, cliente y detalle.
#[derive(Debug, Serialize, ToSchema)]
pub struct FacturaCompletaResponse {
    #[serde(flatten)]
    pub factura: FacturaResponse,
    pub detalles: Vec<DetalleFacturaResponse>,
}

impl From<FacturaCompleta> for FacturaCompletaResponse {
    fn from(completa: FacturaCompleta) -> Self {
        let FacturaCompleta {
            factura,
            cliente,
            detalles,
        } = completa;
        Self {
            factura: FacturaResponse::from(FacturaConCliente { factura, cliente }),
            detalles: detalles
                .into_iter()
                .map(DetalleFacturaResponse::from)
                .collect(),
        }
    }
}

/// Lista paginada de facturas con el cliente incorporado
#[utoipa::path(
    get,
    path = "/api/facturas",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de facturas", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "facturas"
)]
pub async fn list_facturas(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (facturas, total) = state
        .services
        .facturas
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<FacturaResponse> = facturas.into_iter().map(FacturaResponse::from).collect();

    Ok(success_response(PaginatedResponse::new(
        filas, page, per_page, total,
    )))
}

/// Devuelve una factura con su detalle
#[utoipa::path(
    get,
    path = "/api/facturas/{id}",
    params(("id" = i64, Path, description = "ID de la factura")),
    responses(
        (status = 200, description = "Factura encontrada", body = crate::ApiResponse<FacturaCompletaResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "facturas"
)]
pub async fn get_factura(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let factura = state
        .services
        .facturas
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(FacturaCompletaResponse::from(factura)))
}

/// Detalle de una factura con los productos incorporados
#[utoipa::path(
    get,
    path = "/api/facturas/{id}/detalles",
    params(("id" = i64, Path, description = "ID de la factura")),
    responses(
        (status = 200, description = "Lineas de la factura", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "facturas"
)]
pub async fn get_detalles_factura(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detalles = state
        .services
        .facturas
        .detalles(id)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<DetalleFacturaResponse> = detalles
        .into_iter()
        .map(DetalleFacturaResponse::from)
        .collect();

    Ok(success_response(filas))
}

/// Emite una factura descontando stock
#[utoipa::path(
    post,
    path = "/api/facturas",
    request_body = CrearFacturaRequest,
    responses(
        (status = 201, description = "Factura emitida", body = crate::ApiResponse<FacturaCompletaResponse>),
        (status = 400, description = "Datos invalidos o cliente inexistente", body = crate::errors::ErrorResponse),
        (status = 409, description = "Numero de factura duplicado", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock insuficiente", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "facturas"
)]
pub async fn create_factura(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(mut payload): Json<CrearFacturaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // La factura queda a nombre del usuario autenticado salvo que el
    // payload indique otro vendedor.
    if payload.id_usuario.is_none() {
        payload.id_usuario = Some(user.user_id);
    }

    let factura = state
        .services
        .facturas
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        factura_id = factura.factura.id_factura,
        numero = %factura.factura.numero_factura,
        "Factura emitida via API"
    );
    Ok(created_response(FacturaCompletaResponse::from(factura)))
}

/// Modifica una factura pendiente reemplazando su detalle
#[utoipa::path(
    put,
    path = "/api/facturas/{id}",
    params(("id" = i64, Path, description = "ID de la factura")),
    request_body = ActualizarFacturaRequest,
    responses(
        (status = 200, description = "Factura actualizada", body = crate::ApiResponse<FacturaCompletaResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "La factura no esta pendiente", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock insuficiente", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "facturas"
)]
pub async fn update_factura(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarFacturaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let factura = state
        .services
        .facturas
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(FacturaCompletaResponse::from(factura)))
}

/// Anula una factura pendiente devolviendo el stock
#[utoipa::path(
    post,
    path = "/api/facturas/{id}/anular",
    params(("id" = i64, Path, description = "ID de la factura")),
    responses(
        (status = 200, description = "Factura anulada", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "La factura no esta pendiente", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "facturas"
)]
pub async fn anular_factura(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let factura = state
        .services
        .facturas
        .anular(id)
        .await
        .map_err(map_service_error)?;

    info!(factura_id = id, "Factura anulada via API");
    Ok(success_response(factura))
}
