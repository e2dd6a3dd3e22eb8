use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ferreteria API",
        version = "0.1.0",
        description = r#"
# API de gestion para ferreteria

Backoffice de la ferreteria: clientes, empleados, catalogo de productos y
proveedores, facturacion con control de stock, pedidos a proveedores,
horarios del personal y administracion de usuarios y roles.

## Autenticacion

Salvo `/api/auth/login`, `/api/auth/refresh`, `/api/status` y `/api/health`,
todos los endpoints exigen un JWT emitido por el propio servicio:

```
Authorization: Bearer <token>
```

Cada grupo de rutas esta restringido a los roles que correspondan
(ADMINISTRADOR, GERENTE, VENDEDOR, BODEGUERO, EMPLEADO).

## Errores

Las respuestas de error comparten el mismo cuerpo:

```json
{
  "error": "Not Found",
  "message": "Cliente con ID 42 no encontrado",
  "request_id": "req-abc123xyz",
  "timestamp": "2026-03-01T10:30:00.000Z"
}
```

## Paginacion

Los listados aceptan `page` y `per_page` (por defecto 20, maximo 100) y
devuelven `items`, `total`, `page`, `per_page` y `total_pages`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Desarrollo local")
    ),
    tags(
        (name = "auth", description = "Inicio y cierre de sesion, refresco de tokens"),
        (name = "clientes", description = "Cartera de clientes"),
        (name = "empleados", description = "Personal de la ferreteria"),
        (name = "productos", description = "Catalogo de productos"),
        (name = "proveedores", description = "Proveedores del negocio"),
        (name = "facturas", description = "Facturacion de ventas con control de stock"),
        (name = "pedidos", description = "Pedidos de reposicion a proveedores"),
        (name = "horarios", description = "Jornadas del personal"),
        (name = "stock", description = "Inventario y movimientos de bodega"),
        (name = "usuarios", description = "Cuentas de acceso al sistema"),
        (name = "roles", description = "Roles y permisos"),
        (name = "sistema", description = "Estado y salud del servicio")
    ),
    paths(
        // Sistema
        crate::api_status,
        crate::health_check,

        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,

        // Clientes
        crate::handlers::clientes::list_clientes,
        crate::handlers::clientes::list_clientes_activos,
        crate::handlers::clientes::buscar_clientes,
        crate::handlers::clientes::clientes_por_tipo,
        crate::handlers::clientes::verificar_email_cliente,
        crate::handlers::clientes::verificar_cedula_cliente,
        crate::handlers::clientes::estadisticas_clientes,
        crate::handlers::clientes::get_cliente,
        crate::handlers::clientes::create_cliente,
        crate::handlers::clientes::update_cliente,
        crate::handlers::clientes::cambiar_estado_cliente,
        crate::handlers::clientes::delete_cliente,

        // Empleados
        crate::handlers::empleados::list_empleados,
        crate::handlers::empleados::get_empleado,
        crate::handlers::empleados::create_empleado,
        crate::handlers::empleados::update_empleado,
        crate::handlers::empleados::delete_empleado,

        // Productos
        crate::handlers::productos::list_productos,
        crate::handlers::productos::get_producto,
        crate::handlers::productos::create_producto,
        crate::handlers::productos::update_producto,
        crate::handlers::productos::delete_producto,

        // Proveedores
        crate::handlers::proveedores::list_proveedores,
        crate::handlers::proveedores::get_proveedor,
        crate::handlers::proveedores::create_proveedor,
        crate::handlers::proveedores::update_proveedor,
        crate::handlers::proveedores::delete_proveedor,

        // Facturas
        crate::handlers::facturas::list_facturas,
        crate::handlers::facturas::get_factura,
        crate::handlers::facturas::get_detalles_factura,
        crate::handlers::facturas::create_factura,
        crate::handlers::facturas::update_factura,
        crate::handlers::facturas::anular_factura,

        // Pedidos
        crate::handlers::pedidos::list_pedidos,
        crate::handlers::pedidos::get_pedido,
        crate::handlers::pedidos::get_detalles_pedido,
        crate::handlers::pedidos::create_pedido,
        crate::handlers::pedidos::cambiar_estado_pedido,

        // Horarios
        crate::handlers::horarios::list_horarios,
        crate::handlers::horarios::get_horario,
        crate::handlers::horarios::horarios_por_empleado,
        crate::handlers::horarios::create_horario,
        crate::handlers::horarios::update_horario,
        crate::handlers::horarios::delete_horario,

        // Stock
        crate::handlers::stock::list_stock,
        crate::handlers::stock::get_stock,
        crate::handlers::stock::get_stock_por_producto,
        crate::handlers::stock::buscar_stock,
        crate::handlers::stock::verificar_disponibilidad,
        crate::handlers::stock::stock_bajo_minimo,
        crate::handlers::stock::update_stock,
        crate::handlers::stock::movimiento_stock,
        crate::handlers::stock::inicializar_stock,
        crate::handlers::stock::estadisticas_stock,
        crate::handlers::stock::delete_stock,

        // Usuarios
        crate::handlers::usuarios::list_usuarios,
        crate::handlers::usuarios::list_usuarios_activos,
        crate::handlers::usuarios::buscar_usuarios,
        crate::handlers::usuarios::estadisticas_usuarios,
        crate::handlers::usuarios::get_usuario,
        crate::handlers::usuarios::create_usuario,
        crate::handlers::usuarios::update_usuario,
        crate::handlers::usuarios::cambiar_contrasena,
        crate::handlers::usuarios::cambiar_estado_usuario,
        crate::handlers::usuarios::delete_usuario,

        // Roles
        crate::handlers::roles::list_roles,
        crate::handlers::roles::get_rol,
        crate::handlers::roles::usuarios_del_rol,
        crate::handlers::roles::create_rol,
        crate::handlers::roles::update_rol,
        crate::handlers::roles::delete_rol,
    ),
    components(
        schemas(
            // Envoltorios comunes
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::errors::ErrorResponse,
            crate::handlers::common::CambiarEstadoRequest,

            // Auth
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::RefreshRequest,
            crate::auth::TokenPair,

            // Clientes
            crate::entities::cliente::TipoCliente,
            crate::services::clientes::CrearClienteRequest,
            crate::services::clientes::ActualizarClienteRequest,
            crate::services::clientes::EstadisticasClientes,

            // Empleados
            crate::services::empleados::CrearEmpleadoRequest,
            crate::services::empleados::ActualizarEmpleadoRequest,

            // Productos
            crate::services::productos::CrearProductoRequest,
            crate::services::productos::ActualizarProductoRequest,
            crate::handlers::productos::ProductoResponse,

            // Proveedores
            crate::services::proveedores::CrearProveedorRequest,
            crate::services::proveedores::ActualizarProveedorRequest,

            // Facturas
            crate::entities::factura::EstadoFactura,
            crate::entities::factura::MetodoPago,
            crate::services::facturas::LineaFacturaRequest,
            crate::services::facturas::CrearFacturaRequest,
            crate::services::facturas::ActualizarFacturaRequest,
            crate::handlers::facturas::FacturaResponse,
            crate::handlers::facturas::DetalleFacturaResponse,
            crate::handlers::facturas::FacturaCompletaResponse,

            // Pedidos
            crate::entities::pedido::EstadoPedido,
            crate::services::pedidos::LineaPedidoRequest,
            crate::services::pedidos::CrearPedidoRequest,
            crate::handlers::pedidos::PedidoResponse,
            crate::handlers::pedidos::DetallePedidoResponse,
            crate::handlers::pedidos::PedidoCompletoResponse,

            // Horarios
            crate::services::horarios::CrearHorarioRequest,
            crate::services::horarios::ActualizarHorarioRequest,
            crate::handlers::horarios::HorarioResponse,

            // Stock
            crate::services::stock::ActualizarStockRequest,
            crate::services::stock::TipoMovimiento,
            crate::services::stock::MovimientoStockRequest,
            crate::services::stock::InicializarStockRequest,
            crate::services::stock::DisponibilidadStock,
            crate::services::stock::EstadisticasStock,
            crate::handlers::stock::StockResponse,

            // Usuarios
            crate::services::usuarios::CrearUsuarioRequest,
            crate::services::usuarios::ActualizarUsuarioRequest,
            crate::services::usuarios::CambiarContrasenaRequest,
            crate::services::usuarios::EstadisticasUsuarios,
            crate::handlers::usuarios::UsuarioResponse,

            // Roles
            crate::services::roles::CrearRolRequest,
            crate::services::roles::ActualizarRolRequest,
            crate::handlers::roles::RolResponse,
            crate::handlers::roles::UsuarioDelRolResponse,
        )
    )
)]
pub struct ApiDoc;

/// Swagger UI servida en `/docs` sobre el documento OpenAPI generado.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn el_documento_openapi_cubre_las_rutas_principales() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Ferreteria API"));
        assert!(json.contains("/api/facturas"));
        assert!(json.contains("/api/stock/movimiento"));
        assert!(json.contains("/api/auth/login"));
    }
}
