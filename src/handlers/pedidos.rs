use super::common::{created_response, map_service_error, success_response, PaginationParams};
use crate::{
    auth::AuthenticatedUser,
    entities::pedido::EstadoPedido,
    errors::ApiError,
    handlers::AppState,
    services::pedidos::{
        CrearPedidoRequest, DetallePedidoConProducto, PedidoCompleto, PedidoConProveedor,
    },
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Cabecera de pedido con el nombre del proveedor.
#[derive(Debug, Serialize, ToSchema)]
pub struct PedidoResponse {
    pub id_pedido: i64,
    pub numero_pedido: String,
    pub fecha: NaiveDate,
    pub total: Decimal,
    pub estado: EstadoPedido,
    pub descripcion: Option<String>,
    pub observaciones: Option<String>,
    pub fecha_entrega_esperada: Option<NaiveDate>,
    pub id_proveedor: i64,
    pub nombre_proveedor: Option<String>,
    pub id_usuario: Option<i64>,
    pub fecha_registro: NaiveDateTime,
    pub fecha_modificacion: NaiveDateTime,
}

impl From<PedidoConProveedor> for PedidoResponse {
    fn from(fila: PedidoConProveedor) -> Self {
        let PedidoConProveedor { pedido, proveedor } = fila;
        Self {
            id_pedido: pedido.id_pedido,
            numero_pedido: pedido.numero_pedido,
            fecha: pedido.fecha,
            total: pedido.total,
            estado: pedido.estado,
            descripcion: pedido.descripcion,
            observaciones: pedido.observaciones,
            fecha_entrega_esperada: pedido.fecha_entrega_esperada,
            id_proveedor: pedido.id_proveedor,
            nombre_proveedor: proveedor.map(|p| p.nombre_proveedor),
            id_usuario: pedido.id_usuario,
            fecha_registro: pedido.fecha_registro,
            fecha_modificacion: pedido.fecha_modificacion,
        }
    }
}

/// Linea de pedido con el producto referenciado.
#[derive(Debug, Serialize, ToSchema)]
pub struct DetallePedidoResponse {
    pub id_detalle_pedido: i64,
    pub id_pedido: i64,
    pub id_producto: i64,
    pub nombre_producto: Option<String>,
    pub codigo_producto: Option<String>,
    pub cantidad: i32,
    pub precio_uni: Decimal,
    pub subtotal: Decimal,
}

impl From<DetallePedidoConProducto> for DetallePedidoResponse {
    fn from(fila: DetallePedidoConProducto) -> Self {
        let DetallePedidoConProducto { detalle, producto } = fila;
        let subtotal = Decimal::from(detalle.cantidad) * detalle.precio_uni;
        Self {
            id_detalle_pedido: detalle.id_detalle_pedido,
            id_pedido: detalle.id_pedido,
            id_producto: detalle.id_producto,
            nombre_producto: producto.as_ref().map(|p| p.nombre_producto.clone()),
            codigo_producto: producto.map(|p| p.codigo_producto),
            cantidad: detalle.cantidad,
            precio_uni: detalle.precio_uni,
            subtotal,
        }
    }
}

/// Pedido completo: cabecera, proveedor y detalle.
#[derive(Debug, Serialize, ToSchema)]
pub struct PedidoCompletoResponse {
    #[serde(flatten)]
    pub pedido: PedidoResponse,
    pub detalles: Vec<DetallePedidoResponse>,
}

impl From<PedidoCompleto> for PedidoCompletoResponse {
    fn from(completo: PedidoCompleto) -> Self {
        let PedidoCompleto {
            pedido,
            proveedor,
            detalles,
        } = completo;
        Self {
            pedido: PedidoResponse::from(PedidoConProveedor { pedido, proveedor }),
            detalles: detalles
                .into_iter()
                .map(DetallePedidoResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CambioEstadoParams {
    /// Estado destino: PENDIENTE, APROBADO, ENVIADO, RECIBIDO o CANCELADO.
    pub estado: String,
}

/// Lista paginada de pedidos con el proveedor incorporado
#[utoipa::path(
    get,
    path = "/api/pedidos",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de pedidos", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "pedidos"
)]
pub async fn list_pedidos(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (pedidos, total) = state
        .services
        .pedidos
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<PedidoResponse> = pedidos.into_iter().map(PedidoResponse::from).collect();

    Ok(success_response(PaginatedResponse::new(
        filas, page, per_page, total,
    )))
}

/// Devuelve un pedido con su detalle
#[utoipa::path(
    get,
    path = "/api/pedidos/{id}",
    params(("id" = i64, Path, description = "ID del pedido")),
    responses(
        (status = 200, description = "Pedido encontrado", body = crate::ApiResponse<PedidoCompletoResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "pedidos"
)]
pub async fn get_pedido(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pedido = state
        .services
        .pedidos
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PedidoCompletoResponse::from(pedido)))
}

/// Detalle de un pedido con los productos incorporados
#[utoipa::path(
    get,
    path = "/api/pedidos/{id}/detalles",
    params(("id" = i64, Path, description = "ID del pedido")),
    responses(
        (status = 200, description = "Lineas del pedido", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "pedidos"
)]
pub async fn get_detalles_pedido(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detalles = state
        .services
        .pedidos
        .detalles(id)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<DetallePedidoResponse> = detalles
        .into_iter()
        .map(DetallePedidoResponse::from)
        .collect();

    Ok(success_response(filas))
}

/// Registra un pedido a proveedor
#[utoipa::path(
    post,
    path = "/api/pedidos",
    request_body = CrearPedidoRequest,
    responses(
        (status = 201, description = "Pedido registrado", body = crate::ApiResponse<PedidoCompletoResponse>),
        (status = 400, description = "Datos invalidos o proveedor inexistente", body = crate::errors::ErrorResponse),
        (status = 409, description = "Numero de pedido duplicado", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "pedidos"
)]
pub async fn create_pedido(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(mut payload): Json<CrearPedidoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.id_usuario.is_none() {
        payload.id_usuario = Some(user.user_id);
    }

    let pedido = state
        .services
        .pedidos
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        pedido_id = pedido.pedido.id_pedido,
        numero = %pedido.pedido.numero_pedido,
        "Pedido registrado via API"
    );
    Ok(created_response(PedidoCompletoResponse::from(pedido)))
}

/// Avanza el estado de un pedido
#[utoipa::path(
    post,
    path = "/api/pedidos/{id}/estado",
    params(
        ("id" = i64, Path, description = "ID del pedido"),
        CambioEstadoParams
    ),
    responses(
        (status = 200, description = "Estado actualizado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Estado desconocido", body = crate::errors::ErrorResponse),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transicion no permitida", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "pedidos"
)]
pub async fn cambiar_estado_pedido(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Query(params): Query<CambioEstadoParams>,
) -> Result<impl IntoResponse, ApiError> {
    let estado = EstadoPedido::from_str(&params.estado).map_err(|_| {
        ApiError::BadRequest(format!("Estado de pedido desconocido: {}", params.estado))
    })?;

    let pedido = state
        .services
        .pedidos
        .cambiar_estado(id, estado)
        .await
        .map_err(map_service_error)?;

    info!(pedido_id = id, estado = %pedido.estado, "Estado de pedido cambiado via API");
    Ok(success_response(pedido))
}

/// Rutas del modulo de pedidos
pub fn pedido_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pedidos))
        .route("/", post(create_pedido))
        .route("/:id", get(get_pedido))
        .route("/:id/detalles", get(get_detalles_pedido))
        .route("/:id/estado", post(cambiar_estado_pedido))
}
