use super::common::{
    created_response, map_service_error, no_content_response, success_response, BusquedaParams,
    CambiarEstadoRequest, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::usuarios::{
        ActualizarUsuarioRequest, CambiarContrasenaRequest, CrearUsuarioRequest,
        EstadisticasUsuarios, UsuarioConRol,
    },
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Router,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

/// Cuenta con el nombre de su rol. El hash de la contrasena nunca sale.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsuarioResponse {
    pub id_usuario: i64,
    pub nombre_usuario: String,
    pub email: Option<String>,
    pub nombre: Option<String>,
    pub apellidos: Option<String>,
    pub telefono: Option<String>,
    pub activo: bool,
    pub ultimo_acceso: Option<NaiveDateTime>,
    pub intentos_fallidos: i32,
    pub id_rol: i64,
    pub rol: Option<String>,
    pub fecha_creacion: NaiveDateTime,
}

impl From<UsuarioConRol> for UsuarioResponse {
    fn from(fila: UsuarioConRol) -> Self {
        let UsuarioConRol { usuario, rol } = fila;
        Self {
            id_usuario: usuario.id_usuario,
            nombre_usuario: usuario.nombre_usuario,
            email: usuario.email,
            nombre: usuario.nombre,
            apellidos: usuario.apellidos,
            telefono: usuario.telefono,
            activo: usuario.activo,
            ultimo_acceso: usuario.ultimo_acceso,
            intentos_fallidos: usuario.intentos_fallidos,
            id_rol: usuario.id_rol,
            rol: rol.map(|r| r.nombre),
            fecha_creacion: usuario.fecha_creacion,
        }
    }
}

/// Lista paginada de cuentas con su rol
#[utoipa::path(
    get,
    path = "/api/usuarios",
    params(PaginationParams),
    responses(
        (status = 200, description = "Listado de usuarios", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse),
        (status = 403, description = "Solo administradores", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn list_usuarios(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.limites(&state.config);
    let (usuarios, total) = state
        .services
        .usuarios
        .list(page, per_page)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<UsuarioResponse> = usuarios.into_iter().map(UsuarioResponse::from).collect();

    Ok(success_response(PaginatedResponse::new(
        filas, page, per_page, total,
    )))
}

/// Cuentas activas
#[utoipa::path(
    get,
    path = "/api/usuarios/activos",
    responses(
        (status = 200, description = "Usuarios activos", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn list_usuarios_activos(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let usuarios = state
        .services
        .usuarios
        .activos()
        .await
        .map_err(map_service_error)?;

    let filas: Vec<UsuarioResponse> = usuarios.into_iter().map(UsuarioResponse::from).collect();

    Ok(success_response(filas))
}

/// Busca cuentas por nombre, apellidos o nombre de usuario
#[utoipa::path(
    get,
    path = "/api/usuarios/buscar",
    params(BusquedaParams),
    responses(
        (status = 200, description = "Coincidencias", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn buscar_usuarios(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<BusquedaParams>,
) -> Result<impl IntoResponse, ApiError> {
    let usuarios = state
        .services
        .usuarios
        .buscar(&params.q)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<UsuarioResponse> = usuarios.into_iter().map(UsuarioResponse::from).collect();

    Ok(success_response(filas))
}

/// Resumen de cuentas por estado y rol
#[utoipa::path(
    get,
    path = "/api/usuarios/estadisticas",
    responses(
        (status = 200, description = "Totales de usuarios", body = crate::ApiResponse<EstadisticasUsuarios>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn estadisticas_usuarios(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let estadisticas = state
        .services
        .usuarios
        .estadisticas()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(estadisticas))
}

/// Devuelve una cuenta por su ID
#[utoipa::path(
    get,
    path = "/api/usuarios/{id}",
    params(("id" = i64, Path, description = "ID del usuario")),
    responses(
        (status = 200, description = "Usuario encontrado", body = crate::ApiResponse<UsuarioResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn get_usuario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let usuario = state
        .services
        .usuarios
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UsuarioResponse::from(usuario)))
}

/// Crea una cuenta de acceso
#[utoipa::path(
    post,
    path = "/api/usuarios",
    request_body = CrearUsuarioRequest,
    responses(
        (status = 201, description = "Usuario creado", body = crate::ApiResponse<UsuarioResponse>),
        (status = 400, description = "Datos invalidos o rol inexistente", body = crate::errors::ErrorResponse),
        (status = 409, description = "Nombre de usuario o email duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn create_usuario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CrearUsuarioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usuario = state
        .services
        .usuarios
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        usuario_id = usuario.usuario.id_usuario,
        "Usuario creado via API"
    );
    Ok(created_response(UsuarioResponse::from(usuario)))
}

/// Actualiza una cuenta
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    params(("id" = i64, Path, description = "ID del usuario")),
    request_body = ActualizarUsuarioRequest,
    responses(
        (status = 200, description = "Usuario actualizado", body = crate::ApiResponse<UsuarioResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Nombre de usuario o email duplicados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn update_usuario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarUsuarioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usuario = state
        .services
        .usuarios
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UsuarioResponse::from(usuario)))
}

/// Cambia la contrasena verificando la actual
#[utoipa::path(
    post,
    path = "/api/usuarios/{id}/cambiar-contrasena",
    params(("id" = i64, Path, description = "ID del usuario")),
    request_body = CambiarContrasenaRequest,
    responses(
        (status = 200, description = "Contrasena cambiada", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Contrasena actual incorrecta", body = crate::errors::ErrorResponse),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn cambiar_contrasena(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<CambiarContrasenaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .usuarios
        .cambiar_contrasena(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(
        json!({ "message": "Contrasena actualizada" }),
    ))
}

/// Activa o desactiva una cuenta; reactivarla la desbloquea
#[utoipa::path(
    patch,
    path = "/api/usuarios/{id}/estado",
    params(("id" = i64, Path, description = "ID del usuario")),
    request_body = CambiarEstadoRequest,
    responses(
        (status = 200, description = "Estado cambiado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn cambiar_estado_usuario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<CambiarEstadoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usuario = state
        .services
        .usuarios
        .cambiar_estado(id, payload.activo)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(usuario))
}

/// Elimina una cuenta sin documentos a su nombre
#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    params(("id" = i64, Path, description = "ID del usuario")),
    responses(
        (status = 204, description = "Usuario eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tiene facturas o pedidos asociados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "usuarios"
)]
pub async fn delete_usuario(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .usuarios
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    info!(usuario_id = id, "Usuario eliminado via API");
    Ok(no_content_response())
}

/// Rutas del modulo de usuarios
pub fn usuario_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_usuarios))
        .route("/", post(create_usuario))
        .route("/activos", get(list_usuarios_activos))
        .route("/buscar", get(buscar_usuarios))
        .route("/estadisticas", get(estadisticas_usuarios))
        .route("/:id", get(get_usuario))
        .route("/:id", put(update_usuario))
        .route("/:id", delete(delete_usuario))
        .route("/:id/cambiar-contrasena", post(cambiar_contrasena))
        .route("/:id/estado", patch(cambiar_estado_usuario))
}
