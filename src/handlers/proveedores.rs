use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::proveedores::{ActualizarProveedorRequest, CrearProveedorRequest},
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use tracing::info;

/// Lista paginada de proveedores
#[utoipa::path(
    get,
    path = "/api/proveedores",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de proveedores", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "proveedores"
)]
pub async fn list_proveedores(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (proveedores, total) = state
        .services
        .proveedores
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        proveedores,
        page,
        per_page,
        total,
    )))
}

/// Devuelve un proveedor por su ID
#[utoipa::path(
    get,
    path = "/api/proveedores/{id}",
    params(("id" = i64, Path, description = "ID del proveedor")),
    responses(
        (status = 200, description = "Proveedor encontrado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "proveedores"
)]
pub async fn get_proveedor(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let proveedor = state
        .services
        .proveedores
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(proveedor))
}

/// Registra un proveedor
#[utoipa::path(
    post,
    path = "/api/proveedores",
    request_body = CrearProveedorRequest,
    responses(
        (status = 201, description = "Proveedor creado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Datos invalidos", body = crate::errors::ErrorResponse),
        (status = 409, description = "RUC o email duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "proveedores"
)]
pub async fn create_proveedor(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CrearProveedorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proveedor = state
        .services
        .proveedores
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        proveedor_id = proveedor.id_proveedor,
        "Proveedor creado via API"
    );
    Ok(created_response(proveedor))
}

/// Actualiza un proveedor
#[utoipa::path(
    put,
    path = "/api/proveedores/{id}",
    params(("id" = i64, Path, description = "ID del proveedor")),
    request_body = ActualizarProveedorRequest,
    responses(
        (status = 200, description = "Proveedor actualizado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "RUC o email duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "proveedores"
)]
pub async fn update_proveedor(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarProveedorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proveedor = state
        .services
        .proveedores
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(proveedor))
}

/// Elimina un proveedor sin productos ni pedidos asociados
#[utoipa::path(
    delete,
    path = "/api/proveedores/{id}",
    params(("id" = i64, Path, description = "ID del proveedor")),
    responses(
        (status = 204, description = "Proveedor eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Referenciado por productos o pedidos", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "proveedores"
)]
pub async fn delete_proveedor(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .proveedores
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    info!(proveedor_id = id, "Proveedor eliminado via API");
    Ok(no_content_response())
}
