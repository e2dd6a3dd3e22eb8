pub mod auth;
pub mod clientes;
pub mod common;
pub mod empleados;
pub mod facturas;
pub mod horarios;
pub mod pedidos;
pub mod productos;
pub mod proveedores;
pub mod roles;
pub mod stock;
pub mod usuarios;

use crate::db::DbPool;
use crate::events::EventSender;
use rust_decimal::Decimal;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Servicios de negocio compartidos por los handlers HTTP
#[derive(Clone)]
pub struct AppServices {
    pub clientes: Arc<crate::services::clientes::ClienteService>,
    pub empleados: Arc<crate::services::empleados::EmpleadoService>,
    pub productos: Arc<crate::services::productos::ProductoService>,
    pub proveedores: Arc<crate::services::proveedores::ProveedorService>,
    pub facturas: Arc<crate::services::facturas::FacturaService>,
    pub pedidos: Arc<crate::services::pedidos::PedidoService>,
    pub stock: Arc<crate::services::stock::StockService>,
    pub horarios: Arc<crate::services::horarios::HorarioService>,
    pub usuarios: Arc<crate::services::usuarios::UsuarioService>,
    pub roles: Arc<crate::services::roles::RolService>,
}

impl AppServices {
    /// Construye el contenedor completo de servicios sobre un mismo pool
    /// y canal de eventos.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        tasa_impuesto: Decimal,
    ) -> Self {
        Self {
            clientes: Arc::new(crate::services::clientes::ClienteService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            empleados: Arc::new(crate::services::empleados::EmpleadoService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            productos: Arc::new(crate::services::productos::ProductoService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            proveedores: Arc::new(crate::services::proveedores::ProveedorService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            facturas: Arc::new(crate::services::facturas::FacturaService::new(
                db_pool.clone(),
                event_sender.clone(),
                tasa_impuesto,
            )),
            pedidos: Arc::new(crate::services::pedidos::PedidoService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            stock: Arc::new(crate::services::stock::StockService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            horarios: Arc::new(crate::services::horarios::HorarioService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            usuarios: Arc::new(crate::services::usuarios::UsuarioService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            roles: Arc::new(crate::services::roles::RolService::new(
                db_pool, event_sender,
            )),
        }
    }
}
