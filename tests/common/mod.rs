// Arnes compartido por los binarios de prueba; cada binario usa solo una
// parte de los helpers.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware, Router,
};
use chrono::Utc;
use ferreteria_api::{
    auth::{AuthConfig, AuthService, Claims},
    config::AppConfig,
    db,
    entities::{cliente, producto, proveedor, rol, usuario},
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        clientes::CrearClienteRequest,
        productos::CrearProductoRequest,
        proveedores::CrearProveedorRequest,
        roles::CrearRolRequest,
        stock::InicializarStockRequest,
        usuarios::CrearUsuarioRequest,
    },
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Configuracion minima de pruebas: sqlite en memoria con una sola conexion,
/// para que cada arnes tenga una base propia y efimera.
fn config_de_pruebas() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret:
            "clave_de_pruebas_de_integracion_que_supera_los_sesenta_y_cuatro_caracteres_exigidos"
                .to_string(),
        jwt_expiration: 3600,
        refresh_token_expiration: 86_400,
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        cors_allow_credentials: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 5,
        default_tax_rate: 0.15,
        event_channel_capacity: 100,
        api_default_page_size: 20,
        api_max_page_size: 100,
        auth_issuer: "ferreteria-api".to_string(),
        auth_audience: "ferreteria-clientes".to_string(),
    }
}

/// Aplicacion completa sobre una base sqlite en memoria: servicios, router
/// con autenticacion y canal de eventos en marcha.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    jwt_secret: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = config_de_pruebas();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("no se pudo abrir la base de pruebas");
        db::run_migrations(&pool)
            .await
            .expect("no se pudieron ejecutar las migraciones de prueba");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            cfg.tasa_impuesto(),
        );

        let state = AppState {
            db: db_arc.clone(),
            config: cfg.clone(),
            event_sender,
            services,
        };

        let auth_service = Arc::new(AuthService::new(AuthConfig::from_app_config(&cfg), db_arc));

        // Mismo cableado que el binario principal: el AuthService viaja en las
        // extensiones para que auth_middleware lo encuentre.
        let api = ferreteria_api::api_routes().layer(middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
             mut req: Request<Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ));

        let router = Router::new().nest("/api", api).with_state(state.clone());

        Self {
            router,
            state,
            jwt_secret: cfg.jwt_secret,
            _event_task: event_task,
        }
    }

    /// Token de acceso firmado para un usuario ficticio con el rol dado.
    /// El middleware valida firma y claims sin consultar la base.
    pub fn token_con_rol(&self, rol: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: "1".to_string(),
            nombre_usuario: Some("prueba".to_string()),
            roles: vec![rol.to_string()],
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(1)).timestamp(),
            nbf: now.timestamp(),
            iss: self.state.config.auth_issuer.clone(),
            aud: self.state.config.auth_audience.clone(),
        };

        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .expect("no se pudo firmar el token de prueba")
    }

    /// Envia una peticion al router, con token Bearer opcional.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("cuerpo JSON de prueba invalido"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("peticion de prueba invalida");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("error del router durante la prueba")
    }

    /// Peticion autenticada con un token recien firmado para el rol dado.
    pub async fn request_con_rol(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        rol: &str,
    ) -> axum::response::Response {
        let token = self.token_con_rol(rol);
        self.request(method, uri, body, Some(&token)).await
    }

    /// Proveedor basico para colgarle productos y pedidos.
    pub async fn seed_proveedor(&self, nombre: &str) -> proveedor::Model {
        self.state
            .services
            .proveedores
            .crear(CrearProveedorRequest {
                nombre_proveedor: nombre.to_string(),
                direccion: "Av. Industrial 123".to_string(),
                telefono: "02-234-5678".to_string(),
                email: None,
                contacto_principal: None,
                ruc: None,
                condiciones_pago: None,
                calificacion: None,
            })
            .await
            .expect("no se pudo sembrar el proveedor")
    }

    /// Producto de catalogo con su fila de stock inicial.
    pub async fn seed_producto_con_stock(
        &self,
        codigo: &str,
        precio: Decimal,
        cantidad: i32,
    ) -> producto::Model {
        let producto = self
            .state
            .services
            .productos
            .crear(CrearProductoRequest {
                nombre_producto: format!("Producto {}", codigo),
                descripcion: None,
                codigo_producto: codigo.to_string(),
                categoria: "HERRAMIENTAS".to_string(),
                marca: None,
                precio,
                precio_compra: None,
                unidad_medida: None,
                stock_minimo: Some(2),
                id_proveedor: None,
            })
            .await
            .expect("no se pudo sembrar el producto");

        self.state
            .services
            .stock
            .inicializar(InicializarStockRequest {
                id_producto: producto.id_producto,
                cantidad_inicial: cantidad,
                ubicacion: None,
            })
            .await
            .expect("no se pudo sembrar el stock");

        producto
    }

    /// Cliente de mostrador con los campos obligatorios.
    pub async fn seed_cliente(&self, nombre: &str) -> cliente::Model {
        self.state
            .services
            .clientes
            .crear(CrearClienteRequest {
                nombre: nombre.to_string(),
                apellidos: "De Prueba".to_string(),
                direccion: "Calle Principal 45".to_string(),
                telefono: "09-876-5432".to_string(),
                email: None,
                cedula: None,
                tipo_cliente: None,
                limite_credito: None,
            })
            .await
            .expect("no se pudo sembrar el cliente")
    }

    pub async fn seed_rol(&self, nombre: &str) -> rol::Model {
        self.state
            .services
            .roles
            .crear(CrearRolRequest {
                nombre: nombre.to_string(),
                descripcion: None,
            })
            .await
            .expect("no se pudo sembrar el rol")
    }

    /// Cuenta activa con la contrasena dada, ligada al rol indicado.
    pub async fn seed_usuario(
        &self,
        nombre_usuario: &str,
        contrasena: &str,
        id_rol: i64,
    ) -> usuario::Model {
        self.state
            .services
            .usuarios
            .crear(CrearUsuarioRequest {
                nombre_usuario: nombre_usuario.to_string(),
                contrasena: contrasena.to_string(),
                email: None,
                nombre: None,
                apellidos: None,
                telefono: None,
                id_rol,
            })
            .await
            .expect("no se pudo sembrar el usuario")
            .usuario
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
