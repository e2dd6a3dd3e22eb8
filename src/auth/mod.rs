/*!
 * # Autenticacion y autorizacion
 *
 * Seguridad de la API: emision y validacion de JWT con par de tokens
 * (acceso + refresco), rotacion del token de refresco, lista de revocados
 * en memoria y control de acceso por roles.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::{rol, usuario};

pub mod roles;

/// Intentos de inicio de sesion fallidos que bloquean la cuenta.
pub const MAX_INTENTOS_FALLIDOS: i32 = 5;

/// Claims incluidas en los JWT emitidos por la API
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,                    // Id del usuario
    pub nombre_usuario: Option<String>, // Nombre de usuario (solo token de acceso)
    pub roles: Vec<String>,             // Roles del usuario
    pub jti: String,                    // Identificador unico del token
    pub iat: i64,                       // Emitido en
    pub exp: i64,                       // Expira en
    pub nbf: i64,                       // No valido antes de
    pub iss: String,                    // Emisor
    pub aud: String,                    // Audiencia
}

/// Usuario autenticado extraido del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i64,
    pub nombre_usuario: Option<String>,
    pub roles: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    /// Verifica si el usuario tiene un rol concreto
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Verifica si el usuario tiene alguno de los roles indicados
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }

    /// Verifica si el usuario es administrador
    pub fn is_administrador(&self) -> bool {
        self.has_role(roles::ADMINISTRADOR)
    }
}

/// Configuracion de autenticacion
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            access_token_expiration: Duration::from_secs(cfg.jwt_expiration as u64),
            refresh_token_expiration: Duration::from_secs(cfg.refresh_token_expiration as u64),
        }
    }
}

/// Servicio de autenticacion: emite, valida, refresca y revoca tokens.
///
/// Los tokens de refresco emitidos y los tokens revocados se registran en
/// memoria; reiniciar el proceso invalida los refrescos pendientes.
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
    refresh_tokens: Arc<DashMap<String, i64>>,
    blacklisted_tokens: Arc<DashMap<String, DateTime<Utc>>>,
}

impl AuthService {
    /// Crea un nuevo servicio de autenticacion
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self {
            config,
            db,
            refresh_tokens: Arc::new(DashMap::new()),
            blacklisted_tokens: Arc::new(DashMap::new()),
        }
    }

    /// Genera el par de tokens (acceso + refresco) para un usuario
    pub async fn generate_token(
        &self,
        usuario: &usuario::Model,
        rol_nombre: &str,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Duracion de token invalida".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| AuthError::InternalError("Duracion de token invalida".to_string()))?;

        let access_jti = Uuid::new_v4().to_string();
        let refresh_jti = Uuid::new_v4().to_string();

        let access_claims = Claims {
            sub: usuario.id_usuario.to_string(),
            nombre_usuario: Some(usuario.nombre_usuario.clone()),
            roles: vec![rol_nombre.to_string()],
            jti: access_jti,
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // El token de refresco viaja con claims minimas
        let refresh_claims = Claims {
            sub: usuario.id_usuario.to_string(),
            nombre_usuario: None,
            roles: vec![],
            jti: refresh_jti.clone(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let encoding_key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());

        let access_token = encode(&Header::new(Algorithm::HS256), &access_claims, &encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        let refresh_token = encode(
            &Header::new(Algorithm::HS256),
            &refresh_claims,
            &encoding_key,
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        self.refresh_tokens
            .insert(refresh_jti, usuario.id_usuario);

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
            refresh_expires_in: self.config.refresh_token_expiration.as_secs() as i64,
        })
    }

    /// Valida un JWT y devuelve sus claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if self.is_token_blacklisted(&claims.jti) {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Emite un nuevo par de tokens a partir de un token de refresco valido.
    ///
    /// El refresco se rota: el token presentado queda revocado y deja de
    /// poder reutilizarse.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.validate_token(refresh_token).await?;

        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)?;

        if !self.verify_refresh_token(user_id, &claims.jti) {
            return Err(AuthError::InvalidToken);
        }

        let (usuario, rol) = self.get_usuario_con_rol(user_id).await?;

        let new_tokens = self.generate_token(&usuario, &rol.nombre).await?;

        self.revoke_refresh_token(user_id, &claims.jti);

        Ok(new_tokens)
    }

    /// Revoca un token agregandolo a la lista de revocados
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.validate_token(token).await?;

        let expiry = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .unwrap_or_else(|| Utc::now() + ChronoDuration::hours(1));

        self.blacklisted_tokens.insert(claims.jti.clone(), expiry);
        self.refresh_tokens.remove(&claims.jti);

        self.clean_blacklist();

        Ok(())
    }

    fn is_token_blacklisted(&self, token_id: &str) -> bool {
        self.blacklisted_tokens.contains_key(token_id)
    }

    /// Descarta de la lista de revocados los tokens ya expirados
    fn clean_blacklist(&self) {
        let now = Utc::now();
        self.blacklisted_tokens.retain(|_, expiry| *expiry > now);
    }

    fn verify_refresh_token(&self, user_id: i64, token_id: &str) -> bool {
        self.refresh_tokens
            .get(token_id)
            .map(|entry| *entry.value() == user_id)
            .unwrap_or(false)
    }

    fn revoke_refresh_token(&self, user_id: i64, token_id: &str) {
        self.refresh_tokens.remove(token_id);
        debug!(user_id, token_id, "Token de refresco rotado");
    }

    /// Carga el usuario y su rol verificando que la cuenta siga operativa
    async fn get_usuario_con_rol(
        &self,
        user_id: i64,
    ) -> Result<(usuario::Model, rol::Model), AuthError> {
        let db = &*self.db;

        let usuario = usuario::Entity::find_by_id(user_id)
            .one(db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if !usuario.activo {
            return Err(AuthError::UserInactive);
        }

        if usuario.intentos_fallidos >= MAX_INTENTOS_FALLIDOS {
            return Err(AuthError::UserLocked);
        }

        let rol = rol::Entity::find_by_id(usuario.id_rol)
            .one(db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or_else(|| {
                AuthError::InternalError("Rol del usuario no encontrado".to_string())
            })?;

        Ok((usuario, rol))
    }
}

/// Par de tokens emitido al iniciar sesion o refrescar
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Errores de autenticacion
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Se requiere autenticacion")]
    MissingAuth,

    #[error("Credenciales invalidas")]
    InvalidCredentials,

    #[error("No se proporciono token de autenticacion")]
    MissingToken,

    #[error("Token de autenticacion invalido")]
    InvalidToken,

    #[error("El token ha expirado")]
    TokenExpired,

    #[error("El token ha sido revocado")]
    RevokedToken,

    #[error("No se pudo generar el token: {0}")]
    TokenCreation(String),

    #[error("Usuario no encontrado")]
    UserNotFound,

    #[error("La cuenta esta desactivada")]
    UserInactive,

    #[error("La cuenta esta bloqueada por intentos fallidos")]
    UserLocked,

    #[error("Permisos insuficientes")]
    InsufficientPermissions,

    #[error("Error de base de datos: {0}")]
    DatabaseError(String),

    #[error("Error interno: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Codigo HTTP del error. Cualquier problema con el token o con la
    /// cuenta detras del token responde 401; 403 queda reservado para un
    /// usuario autenticado sin el rol requerido.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuth
            | Self::InvalidCredentials
            | Self::MissingToken
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::RevokedToken
            | Self::UserNotFound
            | Self::UserInactive
            | Self::UserLocked => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Mensaje para la respuesta; los errores internos no exponen detalle.
    pub fn response_message(&self) -> String {
        match self {
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                "Error interno del servidor".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = crate::errors::ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

/// Middleware de autenticacion: valida el token y deja el usuario en las
/// extensiones de la peticion
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Servicio de autenticacion no disponible",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Middleware de roles: exige que el usuario autenticado tenga alguno de
/// los roles requeridos
pub async fn roles_middleware(
    State(required_roles): State<Vec<String>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingAuth)?;

    if !required_roles.iter().any(|r| user.has_role(r)) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Extrae el token Bearer del encabezado Authorization
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingAuth)?;
    let claims = auth_service.validate_token(token).await?;

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        nombre_usuario: claims.nombre_usuario,
        roles: claims.roles,
        token_id: claims.jti,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Alias usado por los handlers para el extractor del usuario autenticado
pub type AuthenticatedUser = AuthUser;

/// Metodos de extension para montar los middleware de seguridad en un Router
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_roles(self, roles: &[&str]) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_roles(self, roles: &[&str]) -> Self {
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        self.layer(axum::middleware::from_fn_with_state(
            roles,
            roles_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret:
                "clave_secreta_de_pruebas_para_tokens_que_supera_los_sesenta_y_cuatro_caracteres"
                    .to_string(),
            jwt_audience: "ferreteria-clientes".to_string(),
            jwt_issuer: "ferreteria-api".to_string(),
            access_token_expiration: Duration::from_secs(3600),
            refresh_token_expiration: Duration::from_secs(86400),
        }
    }

    fn test_usuario() -> usuario::Model {
        let ahora = Utc::now().naive_utc();
        usuario::Model {
            id_usuario: 7,
            nombre_usuario: "mvargas".to_string(),
            contrasena: "$argon2id$hash-de-prueba".to_string(),
            email: Some("mvargas@ferreteria.local".to_string()),
            nombre: Some("Maria".to_string()),
            apellidos: Some("Vargas".to_string()),
            telefono: None,
            activo: true,
            ultimo_acceso: None,
            intentos_fallidos: 0,
            id_rol: 1,
            fecha_creacion: ahora,
            fecha_modificacion: ahora,
        }
    }

    fn test_service() -> AuthService {
        AuthService::new(test_config(), Arc::new(DatabaseConnection::Disconnected))
    }

    #[tokio::test]
    async fn access_token_round_trip() {
        let service = test_service();
        let pair = service
            .generate_token(&test_usuario(), roles::VENDEDOR)
            .await
            .expect("par de tokens");

        let claims = service
            .validate_token(&pair.access_token)
            .await
            .expect("claims validas");

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.roles, vec![roles::VENDEDOR.to_string()]);
        assert_eq!(claims.nombre_usuario.as_deref(), Some("mvargas"));
        assert_eq!(pair.token_type, "Bearer");
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let service = test_service();
        let pair = service
            .generate_token(&test_usuario(), roles::VENDEDOR)
            .await
            .expect("par de tokens");

        service
            .revoke_token(&pair.access_token)
            .await
            .expect("revocacion");

        let result = service.validate_token(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::RevokedToken)));
    }

    #[tokio::test]
    async fn token_with_wrong_audience_is_rejected() {
        let service = test_service();

        let mut other_config = test_config();
        other_config.jwt_audience = "otro-publico".to_string();
        let other = AuthService::new(other_config, Arc::new(DatabaseConnection::Disconnected));

        let pair = other
            .generate_token(&test_usuario(), roles::VENDEDOR)
            .await
            .expect("par de tokens");

        let result = service.validate_token(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn refresh_after_revocation_is_rejected() {
        let service = test_service();
        let pair = service
            .generate_token(&test_usuario(), roles::VENDEDOR)
            .await
            .expect("par de tokens");

        service
            .revoke_token(&pair.refresh_token)
            .await
            .expect("revocacion");

        let result = service.refresh_token(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::RevokedToken)));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let service = test_service();
        let pair = service
            .generate_token(&test_usuario(), roles::VENDEDOR)
            .await
            .expect("par de tokens");

        let mut tampered = pair.access_token.clone();
        tampered.push('x');

        let result = service.validate_token(&tampered).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn auth_user_role_checks() {
        let user = AuthUser {
            user_id: 1,
            nombre_usuario: Some("admin".to_string()),
            roles: vec![roles::ADMINISTRADOR.to_string()],
            token_id: "jti".to_string(),
        };

        assert!(user.has_role(roles::ADMINISTRADOR));
        assert!(!user.has_role(roles::VENDEDOR));
        assert!(user.has_any_role(&[roles::GERENTE, roles::ADMINISTRADOR]));
        assert!(user.is_administrador());
    }
}
