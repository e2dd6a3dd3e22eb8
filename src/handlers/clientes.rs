use super::common::{
    created_response, map_service_error, no_content_response, success_response, BusquedaParams,
    CambiarEstadoRequest, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    entities::cliente::TipoCliente,
    errors::ApiError,
    handlers::AppState,
    services::clientes::{ActualizarClienteRequest, CrearClienteRequest, EstadisticasClientes},
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

/// Parametros de verificacion de email unico
#[derive(Debug, Deserialize, IntoParams)]
pub struct VerificarEmailParams {
    pub email: String,
    pub excluir_id: Option<i64>,
}

/// Parametros de verificacion de cedula unica
#[derive(Debug, Deserialize, IntoParams)]
pub struct VerificarCedulaParams {
    pub cedula: String,
    pub excluir_id: Option<i64>,
}

/// Lista paginada de clientes
#[utoipa::path(
    get,
    path = "/api/clientes",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de clientes", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse),
        (status = 403, description = "Rol sin acceso", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn list_clientes(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (clientes, total) = state
        .services
        .clientes
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        clientes, page, per_page, total,
    )))
}

/// Clientes activos en orden alfabetico
#[utoipa::path(
    get,
    path = "/api/clientes/activos",
    responses(
        (status = 200, description = "Clientes activos", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn list_clientes_activos(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let clientes = state
        .services
        .clientes
        .list_activos()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(clientes))
}

/// Busca clientes por nombre o apellidos
#[utoipa::path(
    get,
    path = "/api/clientes/buscar",
    params(BusquedaParams),
    responses(
        (status = 200, description = "Coincidencias", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn buscar_clientes(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<BusquedaParams>,
) -> Result<impl IntoResponse, ApiError> {
    let clientes = state
        .services
        .clientes
        .buscar(&params.q)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(clientes))
}

/// Clientes de un tipo concreto
#[utoipa::path(
    get,
    path = "/api/clientes/tipo/{tipo}",
    params(("tipo" = String, Path, description = "REGULAR, MAYORISTA o VIP")),
    responses(
        (status = 200, description = "Clientes del tipo", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Tipo desconocido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn clientes_por_tipo(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(tipo): Path<TipoCliente>,
) -> Result<impl IntoResponse, ApiError> {
    let clientes = state
        .services
        .clientes
        .por_tipo(tipo)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(clientes))
}

/// Comprueba si un email sigue libre
#[utoipa::path(
    get,
    path = "/api/clientes/verificar-email",
    params(VerificarEmailParams),
    responses(
        (status = 200, description = "Disponibilidad del email", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn verificar_email_cliente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<VerificarEmailParams>,
) -> Result<impl IntoResponse, ApiError> {
    let disponible = state
        .services
        .clientes
        .email_disponible(&params.email, params.excluir_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "disponible": disponible
    })))
}

/// Comprueba si una cedula sigue libre
#[utoipa::path(
    get,
    path = "/api/clientes/verificar-cedula",
    params(VerificarCedulaParams),
    responses(
        (status = 200, description = "Disponibilidad de la cedula", body = crate::ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn verificar_cedula_cliente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<VerificarCedulaParams>,
) -> Result<impl IntoResponse, ApiError> {
    let disponible = state
        .services
        .clientes
        .cedula_disponible(&params.cedula, params.excluir_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "disponible": disponible
    })))
}

/// Conteos agregados del padron
#[utoipa::path(
    get,
    path = "/api/clientes/estadisticas",
    responses(
        (status = 200, description = "Estadisticas de clientes", body = crate::ApiResponse<EstadisticasClientes>)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn estadisticas_clientes(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let estadisticas = state
        .services
        .clientes
        .estadisticas()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(estadisticas))
}

/// Devuelve un cliente por su ID
#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    params(("id" = i64, Path, description = "ID del cliente")),
    responses(
        (status = 200, description = "Cliente encontrado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn get_cliente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let cliente = state
        .services
        .clientes
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cliente))
}

/// Registra un cliente nuevo
#[utoipa::path(
    post,
    path = "/api/clientes",
    request_body = CrearClienteRequest,
    responses(
        (status = 201, description = "Cliente creado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Datos invalidos", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email o cedula duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn create_cliente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CrearClienteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cliente = state
        .services
        .clientes
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    info!(cliente_id = cliente.id_cliente, "Cliente creado via API");

    Ok(created_response(cliente))
}

/// Actualiza un cliente existente
#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    params(("id" = i64, Path, description = "ID del cliente")),
    request_body = ActualizarClienteRequest,
    responses(
        (status = 200, description = "Cliente actualizado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email o cedula duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn update_cliente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarClienteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cliente = state
        .services
        .clientes
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cliente))
}

/// Activa o desactiva un cliente
#[utoipa::path(
    patch,
    path = "/api/clientes/{id}/estado",
    params(("id" = i64, Path, description = "ID del cliente")),
    request_body = CambiarEstadoRequest,
    responses(
        (status = 200, description = "Estado cambiado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn cambiar_estado_cliente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<CambiarEstadoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cliente = state
        .services
        .clientes
        .cambiar_estado(id, payload.activo)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cliente))
}

/// Elimina un cliente sin facturas
#[utoipa::path(
    delete,
    path = "/api/clientes/{id}",
    params(("id" = i64, Path, description = "ID del cliente")),
    responses(
        (status = 204, description = "Cliente eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tiene facturas asociadas", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clientes"
)]
pub async fn delete_cliente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .clientes
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    info!(cliente_id = id, "Cliente eliminado via API");

    Ok(no_content_response())
}
