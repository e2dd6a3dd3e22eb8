pub mod cliente;
pub mod detalle_factura;
pub mod detalle_pedido;
pub mod empleado;
pub mod factura;
pub mod horario;
pub mod pedido;
pub mod producto;
pub mod proveedor;
pub mod rol;
pub mod stock;
pub mod usuario;
