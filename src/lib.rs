//! API de gestion para ferreteria
//!
//! Expone el backoffice de la ferreteria: clientes, empleados, catalogo de
//! productos y proveedores, facturacion con control de stock, pedidos a
//! proveedores, horarios del personal y administracion de usuarios y roles.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::roles::{ADMINISTRADOR, BODEGUERO, GERENTE, VENDEDOR};
use crate::auth::AuthRouterExt;
use crate::db::DbPool;

/// Estado compartido por todos los handlers HTTP.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Envoltorio estandar de las respuestas exitosas de la API.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Pagina de resultados de los listados.
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Tipo de retorno habitual de los handlers JSON.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Arbol de rutas de la API, con cada grupo protegido por los roles que le
/// corresponden. Se monta bajo `/api` en el binario del servidor.
pub fn api_routes() -> Router<AppState> {
    use axum::routing::{delete, patch, post, put};

    // Clientes: el mostrador los consulta y registra; las bajas y los
    // numeros agregados quedan para la gerencia.
    let clientes_mostrador = Router::new()
        .route("/clientes", get(handlers::clientes::list_clientes))
        .route("/clientes", post(handlers::clientes::create_cliente))
        .route(
            "/clientes/activos",
            get(handlers::clientes::list_clientes_activos),
        )
        .route("/clientes/buscar", get(handlers::clientes::buscar_clientes))
        .route(
            "/clientes/tipo/:tipo",
            get(handlers::clientes::clientes_por_tipo),
        )
        .route(
            "/clientes/verificar-email",
            get(handlers::clientes::verificar_email_cliente),
        )
        .route(
            "/clientes/verificar-cedula",
            get(handlers::clientes::verificar_cedula_cliente),
        )
        .route("/clientes/:id", get(handlers::clientes::get_cliente))
        .route("/clientes/:id", put(handlers::clientes::update_cliente))
        .with_roles(&[ADMINISTRADOR, GERENTE, VENDEDOR]);

    let clientes_gestion = Router::new()
        .route(
            "/clientes/estadisticas",
            get(handlers::clientes::estadisticas_clientes),
        )
        .route(
            "/clientes/:id/estado",
            patch(handlers::clientes::cambiar_estado_cliente),
        )
        .route("/clientes/:id", delete(handlers::clientes::delete_cliente))
        .with_roles(&[ADMINISTRADOR, GERENTE]);

    // Productos y proveedores: consulta abierta a todo el personal operativo,
    // mantenimiento reservado a bodega y gerencia.
    let productos_consulta = Router::new()
        .route("/productos", get(handlers::productos::list_productos))
        .route("/productos/:id", get(handlers::productos::get_producto))
        .with_roles(&[ADMINISTRADOR, GERENTE, BODEGUERO, VENDEDOR]);

    let productos_gestion = Router::new()
        .route("/productos", post(handlers::productos::create_producto))
        .route("/productos/:id", put(handlers::productos::update_producto))
        .route(
            "/productos/:id",
            delete(handlers::productos::delete_producto),
        )
        .with_roles(&[ADMINISTRADOR, GERENTE, BODEGUERO]);

    let proveedores_consulta = Router::new()
        .route("/proveedores", get(handlers::proveedores::list_proveedores))
        .route(
            "/proveedores/:id",
            get(handlers::proveedores::get_proveedor),
        )
        .with_roles(&[ADMINISTRADOR, GERENTE, BODEGUERO, VENDEDOR]);

    let proveedores_gestion = Router::new()
        .route(
            "/proveedores",
            post(handlers::proveedores::create_proveedor),
        )
        .route(
            "/proveedores/:id",
            put(handlers::proveedores::update_proveedor),
        )
        .route(
            "/proveedores/:id",
            delete(handlers::proveedores::delete_proveedor),
        )
        .with_roles(&[ADMINISTRADOR, GERENTE, BODEGUERO]);

    // Facturas: emision y edicion en el mostrador; anular exige gerencia.
    let facturas_venta = Router::new()
        .route("/facturas", get(handlers::facturas::list_facturas))
        .route("/facturas", post(handlers::facturas::create_factura))
        .route("/facturas/:id", get(handlers::facturas::get_factura))
        .route(
            "/facturas/:id/detalles",
            get(handlers::facturas::get_detalles_factura),
        )
        .route("/facturas/:id", put(handlers::facturas::update_factura))
        .with_roles(&[ADMINISTRADOR, GERENTE, VENDEDOR]);

    let facturas_gestion = Router::new()
        .route(
            "/facturas/:id/anular",
            post(handlers::facturas::anular_factura),
        )
        .with_roles(&[ADMINISTRADOR, GERENTE]);

    // Stock: lectura para todo el personal operativo, movimientos para
    // bodega, borrado fisico solo para administracion.
    let stock_consulta = Router::new()
        .route("/stock", get(handlers::stock::list_stock))
        .route("/stock/buscar", get(handlers::stock::buscar_stock))
        .route(
            "/stock/producto/:id_producto",
            get(handlers::stock::get_stock_por_producto),
        )
        .route(
            "/stock/disponibilidad/:id_producto",
            get(handlers::stock::verificar_disponibilidad),
        )
        .route("/stock/:id", get(handlers::stock::get_stock))
        .with_roles(&[ADMINISTRADOR, GERENTE, BODEGUERO, VENDEDOR]);

    let stock_bodega = Router::new()
        .route("/stock/bajo-minimo", get(handlers::stock::stock_bajo_minimo))
        .route(
            "/stock/estadisticas",
            get(handlers::stock::estadisticas_stock),
        )
        .route("/stock/movimiento", post(handlers::stock::movimiento_stock))
        .route(
            "/stock/inicializar",
            post(handlers::stock::inicializar_stock),
        )
        .route("/stock/:id", put(handlers::stock::update_stock))
        .with_roles(&[ADMINISTRADOR, GERENTE, BODEGUERO]);

    let stock_admin = Router::new()
        .route("/stock/:id", delete(handlers::stock::delete_stock))
        .with_roles(&[ADMINISTRADOR]);

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/auth", handlers::auth::auth_routes())
        .merge(clientes_mostrador)
        .merge(clientes_gestion)
        .merge(productos_consulta)
        .merge(productos_gestion)
        .merge(proveedores_consulta)
        .merge(proveedores_gestion)
        .merge(facturas_venta)
        .merge(facturas_gestion)
        .merge(stock_consulta)
        .merge(stock_bodega)
        .merge(stock_admin)
        .nest(
            "/empleados",
            handlers::empleados::empleado_routes().with_roles(&[ADMINISTRADOR, GERENTE]),
        )
        .nest(
            "/pedidos",
            handlers::pedidos::pedido_routes().with_roles(&[ADMINISTRADOR, GERENTE, BODEGUERO]),
        )
        .nest(
            "/horarios",
            handlers::horarios::horario_routes().with_roles(&[ADMINISTRADOR, GERENTE]),
        )
        .nest(
            "/usuarios",
            handlers::usuarios::usuario_routes().with_roles(&[ADMINISTRADOR]),
        )
        .nest(
            "/roles",
            handlers::roles::rol_routes().with_roles(&[ADMINISTRADOR]),
        )
}

/// Identidad y version del servicio, sin tocar dependencias externas.
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Servicio en linea", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "sistema"
)]
pub async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "ferreteria-api",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

/// Verificacion de salud: hace ping a la base de datos.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Resultado de las verificaciones", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "sistema"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn respuesta_exitosa_incluye_metadatos_de_peticion() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("la respuesta debe llevar metadatos");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp en RFC 3339");
    }

    #[tokio::test]
    async fn sin_scope_el_request_id_queda_vacio() {
        let response = ApiResponse::success(json!({"ok": true}));
        let meta = response.meta.expect("la respuesta debe llevar metadatos");
        assert!(meta.request_id.is_none());
    }

    #[test]
    fn paginacion_calcula_el_total_de_paginas() {
        let pagina = PaginatedResponse::new(vec![1, 2, 3], 1, 20, 41);
        assert_eq!(pagina.total_pages, 3);
        assert_eq!(pagina.per_page, 20);

        let exacta = PaginatedResponse::<i32>::new(vec![], 2, 20, 40);
        assert_eq!(exacta.total_pages, 2);

        let vacia = PaginatedResponse::<i32>::new(vec![], 1, 20, 0);
        assert_eq!(vacia.total_pages, 0);
    }
}
