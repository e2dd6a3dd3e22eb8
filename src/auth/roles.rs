//! Catalogo de roles del sistema.
//!
//! Los nombres son los que viajan dentro del claim `roles` del JWT y los que
//! guarda la tabla `roles`; toda verificacion de acceso compara contra estas
//! constantes.

pub const ADMINISTRADOR: &str = "ADMINISTRADOR";
pub const GERENTE: &str = "GERENTE";
pub const VENDEDOR: &str = "VENDEDOR";
pub const BODEGUERO: &str = "BODEGUERO";
pub const EMPLEADO: &str = "EMPLEADO";

/// Roles sembrados al inicializar la base, con su descripcion.
pub const DEFAULT_ROLES: &[(&str, &str)] = &[
    (
        ADMINISTRADOR,
        "Acceso total al sistema, incluida la gestion de usuarios y roles",
    ),
    (
        GERENTE,
        "Gestion de catalogo, personal, facturacion y pedidos",
    ),
    (VENDEDOR, "Atencion de clientes y emision de facturas"),
    (
        BODEGUERO,
        "Control de inventario, stock y pedidos a proveedores",
    ),
    (EMPLEADO, "Acceso basico de consulta"),
];
