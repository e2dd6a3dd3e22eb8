use crate::config::AppConfig;
use crate::errors::{ApiError, ServiceError};
use crate::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Respuesta 200 con el envoltorio estandar de la API
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Respuesta 201 con el envoltorio estandar de la API
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Respuesta 204 sin cuerpo
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Traduce errores de servicio a errores de la capa HTTP
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Parametros de paginacion de los listados
#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Pagina y tamano saneados contra los limites configurados.
    pub fn limites(&self, cfg: &AppConfig) -> (u64, u64) {
        let per_page = if self.per_page == 0 {
            u64::from(cfg.api_default_page_size)
        } else {
            self.per_page.min(u64::from(cfg.api_max_page_size))
        };
        (self.page.max(1), per_page)
    }
}

/// Termino de busqueda libre (`?q=`)
#[derive(Debug, Deserialize, IntoParams)]
pub struct BusquedaParams {
    pub q: String,
}

/// Cuerpo de los toggles de activacion
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CambiarEstadoRequest {
    pub activo: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_de_prueba() -> AppConfig {
        crate::config::config_de_pruebas()
    }

    #[test]
    fn per_page_se_recorta_al_maximo_configurado() {
        let params = PaginationParams {
            page: 2,
            per_page: 5000,
        };
        assert_eq!(params.limites(&config_de_prueba()), (2, 100));
    }

    #[test]
    fn per_page_cero_usa_el_tamano_por_defecto() {
        let params = PaginationParams {
            page: 0,
            per_page: 0,
        };
        assert_eq!(params.limites(&config_de_prueba()), (1, 20));
    }
}
