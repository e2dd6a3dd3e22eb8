use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    entities::horario,
    errors::ApiError,
    handlers::AppState,
    services::horarios::{ActualizarHorarioRequest, CrearHorarioRequest, HorarioConEmpleado},
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Jornada con las horas trabajadas ya calculadas.
#[derive(Debug, Serialize, ToSchema)]
pub struct HorarioResponse {
    pub id_horario: i64,
    pub fecha: NaiveDate,
    pub hora_entrada: Decimal,
    pub hora_salida: Decimal,
    pub observaciones: Option<String>,
    pub id_empleado: i64,
    pub nombre_empleado: Option<String>,
    pub horas_trabajadas: Decimal,
    pub tiene_horas_extra: bool,
    pub fecha_registro: NaiveDateTime,
}

impl From<horario::Model> for HorarioResponse {
    fn from(horario: horario::Model) -> Self {
        let horas_trabajadas = horario.horas_trabajadas();
        let tiene_horas_extra = horario.horas_extra() > Decimal::ZERO;
        Self {
            id_horario: horario.id_horario,
            fecha: horario.fecha,
            hora_entrada: horario.hora_entrada,
            hora_salida: horario.hora_salida,
            observaciones: horario.observaciones,
            id_empleado: horario.id_empleado,
            nombre_empleado: None,
            horas_trabajadas,
            tiene_horas_extra,
            fecha_registro: horario.fecha_registro,
        }
    }
}

impl From<HorarioConEmpleado> for HorarioResponse {
    fn from(fila: HorarioConEmpleado) -> Self {
        let HorarioConEmpleado { horario, empleado } = fila;
        let mut respuesta = Self::from(horario);
        respuesta.nombre_empleado = empleado.map(|e| format!("{} {}", e.nombre, e.apellidos));
        respuesta
    }
}

/// Lista paginada de jornadas con el empleado incorporado
#[utoipa::path(
    get,
    path = "/api/horarios",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de horarios", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "horarios"
)]
pub async fn list_horarios(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (horarios, total) = state
        .services
        .horarios
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<HorarioResponse> = horarios.into_iter().map(HorarioResponse::from).collect();

    Ok(success_response(PaginatedResponse::new(
        filas, page, per_page, total,
    )))
}

/// Devuelve una jornada por su ID
#[utoipa::path(
    get,
    path = "/api/horarios/{id}",
    params(("id" = i64, Path, description = "ID del horario")),
    responses(
        (status = 200, description = "Horario encontrado", body = crate::ApiResponse<HorarioResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "horarios"
)]
pub async fn get_horario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let horario = state
        .services
        .horarios
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(HorarioResponse::from(horario)))
}

/// Jornadas registradas de un empleado
#[utoipa::path(
    get,
    path = "/api/horarios/empleado/{id_empleado}",
    params(("id_empleado" = i64, Path, description = "ID del empleado")),
    responses(
        (status = 200, description = "Horarios del empleado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Empleado inexistente", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "horarios"
)]
pub async fn horarios_por_empleado(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id_empleado): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let horarios = state
        .services
        .horarios
        .por_empleado(id_empleado)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<HorarioResponse> = horarios.into_iter().map(HorarioResponse::from).collect();

    Ok(success_response(filas))
}

/// Registra una jornada
#[utoipa::path(
    post,
    path = "/api/horarios",
    request_body = CrearHorarioRequest,
    responses(
        (status = 201, description = "Horario registrado", body = crate::ApiResponse<HorarioResponse>),
        (status = 400, description = "Rango horario o empleado invalidos", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "horarios"
)]
pub async fn create_horario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CrearHorarioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let horario = state
        .services
        .horarios
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(HorarioResponse::from(horario)))
}

/// Actualiza una jornada
#[utoipa::path(
    put,
    path = "/api/horarios/{id}",
    params(("id" = i64, Path, description = "ID del horario")),
    request_body = ActualizarHorarioRequest,
    responses(
        (status = 200, description = "Horario actualizado", body = crate::ApiResponse<HorarioResponse>),
        (status = 400, description = "Rango horario invalido", body = crate::errors::ErrorResponse),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "horarios"
)]
pub async fn update_horario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarHorarioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let horario = state
        .services
        .horarios
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(HorarioResponse::from(horario)))
}

/// Elimina una jornada
#[utoipa::path(
    delete,
    path = "/api/horarios/{id}",
    params(("id" = i64, Path, description = "ID del horario")),
    responses(
        (status = 204, description = "Horario eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "horarios"
)]
pub async fn delete_horario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .horarios
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Rutas del modulo de horarios
pub fn horario_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_horarios))
        .route("/", post(create_horario))
        .route("/empleado/:id_empleado", get(horarios_por_empleado))
        .route("/:id", get(get_horario))
        .route("/:id", put(update_horario))
        .route("/:id", delete(delete_horario))
}
