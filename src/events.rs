use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cliente events
    ClienteCreado(i64),
    ClienteActualizado(i64),
    ClienteEstadoCambiado { cliente_id: i64, activo: bool },
    ClienteEliminado(i64),

    // Empleado events
    EmpleadoCreado(i64),
    EmpleadoActualizado(i64),
    EmpleadoEliminado(i64),

    // Producto events
    ProductoCreado(i64),
    ProductoActualizado(i64),
    ProductoEliminado(i64),

    // Proveedor events
    ProveedorCreado(i64),
    ProveedorActualizado(i64),
    ProveedorEliminado(i64),

    // Factura events
    FacturaCreada {
        factura_id: i64,
        numero_factura: String,
        total: Decimal,
    },
    FacturaActualizada(i64),
    FacturaAnulada {
        factura_id: i64,
        numero_factura: String,
    },

    // Pedido events
    PedidoCreado {
        pedido_id: i64,
        numero_pedido: String,
    },
    PedidoEstadoCambiado {
        pedido_id: i64,
        estado_anterior: String,
        estado_nuevo: String,
    },
    PedidoRecibido {
        pedido_id: i64,
        numero_pedido: String,
    },

    // Stock events
    StockAjustado {
        producto_id: i64,
        cantidad_anterior: i32,
        cantidad_nueva: i32,
        motivo: String,
    },
    StockBajoMinimo {
        producto_id: i64,
        cantidad_actual: i32,
        stock_minimo: i32,
    },

    // Horario events
    HorarioRegistrado {
        horario_id: i64,
        empleado_id: i64,
    },
    HorarioActualizado(i64),
    HorarioEliminado(i64),

    // Usuario y sesion events
    UsuarioCreado(i64),
    UsuarioActualizado(i64),
    UsuarioEstadoCambiado { usuario_id: i64, activo: bool },
    UsuarioEliminado(i64),
    SesionIniciada {
        usuario_id: i64,
        nombre_usuario: String,
    },
    LoginFallido {
        nombre_usuario: String,
        intentos_fallidos: i32,
    },
    UsuarioBloqueado {
        usuario_id: i64,
        nombre_usuario: String,
    },

    // Rol events
    RolCreado(i64),
    RolActualizado(i64),
    RolEliminado(i64),
}

// Function to process incoming events. Most events only need an audit line;
// stock and session events get dedicated handling.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StockBajoMinimo {
                producto_id,
                cantidad_actual,
                stock_minimo,
            } => {
                handle_stock_bajo_minimo(producto_id, cantidad_actual, stock_minimo).await;
            }
            Event::StockAjustado {
                producto_id,
                cantidad_anterior,
                cantidad_nueva,
                ref motivo,
            } => {
                info!(
                    producto_id,
                    cantidad_anterior, cantidad_nueva, motivo, "Stock ajustado"
                );
            }
            Event::FacturaCreada {
                factura_id,
                ref numero_factura,
                total,
            } => {
                info!(factura_id, numero_factura, %total, "Factura emitida");
            }
            Event::FacturaAnulada {
                factura_id,
                ref numero_factura,
            } => {
                warn!(factura_id, numero_factura, "Factura anulada, stock restituido");
            }
            Event::PedidoRecibido {
                pedido_id,
                ref numero_pedido,
            } => {
                info!(pedido_id, numero_pedido, "Pedido recibido, mercaderia ingresada a stock");
            }
            Event::LoginFallido {
                ref nombre_usuario,
                intentos_fallidos,
            } => {
                warn!(
                    nombre_usuario,
                    intentos_fallidos, "Intento de inicio de sesion fallido"
                );
            }
            Event::UsuarioBloqueado {
                usuario_id,
                ref nombre_usuario,
            } => {
                warn!(
                    usuario_id,
                    nombre_usuario, "Usuario bloqueado por intentos fallidos repetidos"
                );
            }
            Event::SesionIniciada {
                usuario_id,
                ref nombre_usuario,
            } => {
                info!(usuario_id, nombre_usuario, "Sesion iniciada");
            }
            _ => {
                info!("Received event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

async fn handle_stock_bajo_minimo(producto_id: i64, cantidad_actual: i32, stock_minimo: i32) {
    warn!(
        producto_id,
        cantidad_actual, stock_minimo, "Alerta de stock bajo minimo"
    );

    if cantidad_actual == 0 {
        warn!(producto_id, "Producto agotado, requiere reposicion inmediata");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_sender_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::ProductoCreado(42))
            .await
            .expect("send should succeed with open receiver");

        match rx.recv().await {
            Some(Event::ProductoCreado(id)) => assert_eq!(id, 42),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn event_sender_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::RolCreado(1)).await;
        assert!(result.is_err());
    }
}
