use super::common::{
    created_response, map_service_error, no_content_response, success_response,
};
use crate::{
    auth::AuthenticatedUser,
    entities::usuario,
    errors::ApiError,
    handlers::AppState,
    services::roles::{ActualizarRolRequest, CrearRolRequest, RolConConteo},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

/// Rol con el conteo de usuarios activos que lo tienen asignado.
#[derive(Debug, Serialize, ToSchema)]
pub struct RolResponse {
    pub id_rol: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub activo: bool,
    pub usuarios_count: u64,
    pub fecha_creacion: NaiveDateTime,
}

impl From<RolConConteo> for RolResponse {
    fn from(fila: RolConConteo) -> Self {
        let RolConConteo {
            rol,
            usuarios_count,
        } = fila;
        Self {
            id_rol: rol.id_rol,
            nombre: rol.nombre,
            descripcion: rol.descripcion,
            activo: rol.activo,
            usuarios_count,
            fecha_creacion: rol.fecha_creacion,
        }
    }
}

/// Resumen de una cuenta dentro del listado por rol.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsuarioDelRolResponse {
    pub id: i64,
    pub nombre_usuario: String,
    pub nombre_completo: String,
    pub email: Option<String>,
    pub activo: bool,
}

impl From<usuario::Model> for UsuarioDelRolResponse {
    fn from(usuario: usuario::Model) -> Self {
        let nombre_completo = match (&usuario.nombre, &usuario.apellidos) {
            (Some(nombre), Some(apellidos)) => format!("{} {}", nombre, apellidos),
            (Some(nombre), None) => nombre.clone(),
            (None, Some(apellidos)) => apellidos.clone(),
            (None, None) => usuario.nombre_usuario.clone(),
        };
        Self {
            id: usuario.id_usuario,
            nombre_usuario: usuario.nombre_usuario,
            nombre_completo,
            email: usuario.email,
            activo: usuario.activo,
        }
    }
}

/// Roles del sistema con su conteo de usuarios
#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "Listado de roles", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse),
        (status = 403, description = "Solo administradores", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let roles = state
        .services
        .roles
        .list()
        .await
        .map_err(map_service_error)?;

    let filas: Vec<RolResponse> = roles.into_iter().map(RolResponse::from).collect();

    Ok(success_response(filas))
}

/// Devuelve un rol por su ID
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    params(("id" = i64, Path, description = "ID del rol")),
    responses(
        (status = 200, description = "Rol encontrado", body = crate::ApiResponse<RolResponse>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn get_rol(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rol = state
        .services
        .roles
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(RolResponse::from(rol)))
}

/// Usuarios activos que tienen asignado el rol
#[utoipa::path(
    get,
    path = "/api/roles/{id}/usuarios",
    params(("id" = i64, Path, description = "ID del rol")),
    responses(
        (status = 200, description = "Usuarios del rol", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn usuarios_del_rol(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let usuarios = state
        .services
        .roles
        .usuarios_del_rol(id)
        .await
        .map_err(map_service_error)?;

    let filas: Vec<UsuarioDelRolResponse> = usuarios
        .into_iter()
        .map(UsuarioDelRolResponse::from)
        .collect();

    Ok(success_response(filas))
}

/// Crea un rol
#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CrearRolRequest,
    responses(
        (status = 201, description = "Rol creado", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Datos invalidos", body = crate::errors::ErrorResponse),
        (status = 409, description = "Nombre de rol duplicado", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn create_rol(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CrearRolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rol = state
        .services
        .roles
        .crear(payload)
        .await
        .map_err(map_service_error)?;

    info!(rol_id = rol.id_rol, "Rol creado via API");
    Ok(created_response(rol))
}

/// Actualiza un rol
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    params(("id" = i64, Path, description = "ID del rol")),
    request_body = ActualizarRolRequest,
    responses(
        (status = 200, description = "Rol actualizado", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Nombre de rol duplicado", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn update_rol(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarRolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rol = state
        .services
        .roles
        .actualizar(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(rol))
}

/// Elimina un rol sin usuarios asignados
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(("id" = i64, Path, description = "ID del rol")),
    responses(
        (status = 204, description = "Rol eliminado"),
        (status = 404, description = "No existe", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tiene usuarios asignados", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn delete_rol(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .roles
        .eliminar(id)
        .await
        .map_err(map_service_error)?;

    info!(rol_id = id, "Rol eliminado via API");
    Ok(no_content_response())
}

/// Rutas del modulo de roles
pub fn rol_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles))
        .route("/", post(create_rol))
        .route("/:id", get(get_rol))
        .route("/:id", put(update_rol))
        .route("/:id", delete(delete_rol))
        .route("/:id/usuarios", get(usuarios_del_rol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cuenta(nombre: Option<&str>, apellidos: Option<&str>) -> usuario::Model {
        usuario::Model {
            id_usuario: 7,
            nombre_usuario: "mfernandez".to_string(),
            contrasena: "$argon2id$hash".to_string(),
            email: Some("mfernandez@ferreteria.ec".to_string()),
            nombre: nombre.map(str::to_string),
            apellidos: apellidos.map(str::to_string),
            telefono: None,
            activo: true,
            ultimo_acceso: None,
            intentos_fallidos: 0,
            id_rol: 2,
            fecha_creacion: Utc::now().naive_utc(),
            fecha_modificacion: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn nombre_completo_une_nombre_y_apellidos() {
        let fila = UsuarioDelRolResponse::from(cuenta(Some("Maria"), Some("Fernandez")));
        assert_eq!(fila.nombre_completo, "Maria Fernandez");
    }

    #[test]
    fn nombre_completo_cae_al_nombre_de_usuario_sin_datos() {
        let fila = UsuarioDelRolResponse::from(cuenta(None, None));
        assert_eq!(fila.nombre_completo, "mfernandez");
    }
}
