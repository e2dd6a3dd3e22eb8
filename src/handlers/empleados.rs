use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::empleados::{ActualizarEmpleadoRequest, CrearEmpleadoRequest},
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};

/// Lista paginada de empleados
#[utoipa::path(
    get,
    path = "/api/empleados",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de empleados", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse),
        (status = 403, description = "Rol sin acceso", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "empleados"
)]
pub async fn list_empleados(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (empleados, total) = state
        .services
        .empleados
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        empleados, page, per_page, total,
    )))
}

/// Devuelve un empleado por su ID
#[utoipa::path(
    get,
    path = "/api/empleados/{id}",
    params(("id" = i64, Path, description = "ID del empleado")),
    responses(
        (status = 200, description = "Empleado encontrado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "empleados"
)]
pub async fn get_empleado(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let empleado = state
        .services
        .empleados
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(empleado))
}

/// Registra un empleado
#[utoipa::path(
    post,
    path = "/api/empleados",
    request_body = CrearEmpleadoRequest,
    responses(
        (status = 201, description = "Empleado creado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Datos invalidos", body = crate::errors::ErrorResponse),
        (status = 409, description = "Cedula o email duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "empleados"
)]
pub async fn create_empleado(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CrearEmpleadoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let empleado = state
        .services
        .empleados
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(empleado))
}

/// Actualiza un empleado
#[utoipa::path(
    put,
    path = "/api/empleados/{id}",
    params(("id" = i64, Path, description = "ID del empleado")),
    request_body = ActualizarEmpleadoRequest,
    responses(
        (status = 200, description = "Empleado actualizado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Cedula o email duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "empleados"
)]
pub async fn update_empleado(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarEmpleadoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let empleado = state
        .services
        .empleados
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(empleado))
}

/// Elimina un empleado sin horarios registrados
#[utoipa::path(
    delete,
    path = "/api/empleados/{id}",
    params(("id" = i64, Path, description = "ID del empleado")),
    responses(
        (status = 204, description = "Empleado eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tiene horarios asociados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "empleados"
)]
pub async fn delete_empleado(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .empleados
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Rutas del modulo de empleados
pub fn empleado_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_empleados))
        .route("/", post(create_empleado))
        .route("/:id", get(get_empleado))
        .route("/:id", put(update_empleado))
        .route("/:id", delete(delete_empleado))
}
