use super::common::{map_service_error, success_response};
use crate::{
    auth::{bearer_token, AuthService, AuthenticatedUser, TokenPair},
    errors::ApiError,
    handlers::usuarios::UsuarioResponse,
    handlers::AppState,
};
use axum::{
    extract::{Extension, Json, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

/// Credenciales de inicio de sesion
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "El nombre de usuario es obligatorio"))]
    pub nombre_usuario: String,
    #[validate(length(min = 1, message = "La contrasena es obligatoria"))]
    pub contrasena: String,
}

/// Token de refresco a canjear por un nuevo par de tokens
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Inicia sesion y devuelve el par de tokens
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Sesion iniciada", body = crate::ApiResponse<TokenPair>),
        (status = 400, description = "Peticion invalida", body = crate::errors::ErrorResponse),
        (status = 401, description = "Credenciales invalidas o cuenta bloqueada", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let (usuario, rol) = state
        .services
        .usuarios
        .login(&payload.nombre_usuario, &payload.contrasena)
        .await
        .map_err(map_service_error)?;

    let tokens = auth_service.generate_token(&usuario, &rol.nombre).await?;

    info!(usuario_id = usuario.id_usuario, "Sesion iniciada");

    Ok(success_response(tokens))
}

/// Canjea un token de refresco por un nuevo par de tokens
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens renovados", body = crate::ApiResponse<TokenPair>),
        (status = 401, description = "Token de refresco invalido o expirado", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    Extension(auth_service): Extension<Arc<AuthService>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = auth_service.refresh_token(&payload.refresh_token).await?;

    Ok(success_response(tokens))
}

/// Revoca el token de acceso presentado
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Sesion cerrada", body = crate::ApiResponse<serde_json::Value>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    Extension(auth_service): Extension<Arc<AuthService>>,
    user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    auth_service.revoke_token(token).await?;

    info!(usuario_id = user.user_id, "Sesion cerrada");

    Ok(success_response(serde_json::json!({
        "message": "Sesion cerrada"
    })))
}

/// Devuelve el usuario autenticado con su rol
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Usuario autenticado", body = crate::ApiResponse<UsuarioResponse>),
        (status = 401, description = "Sin token valido", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let usuario = state
        .services
        .usuarios
        .get(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UsuarioResponse::from(usuario)))
}

/// Rutas de autenticacion; login y refresh quedan fuera del middleware
/// de autenticacion.
pub fn auth_routes() -> Router<AppState> {
    use crate::auth::AuthRouterExt;

    let publicas = Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh));

    let protegidas = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_auth();

    publicas.merge(protegidas)
}
