use sea_orm_migration::prelude::*;

use crate::m20250301_000002_create_usuarios_table::Usuarios;
use crate::m20250301_000003_create_clientes_table::Clientes;
use crate::m20250301_000006_create_productos_table::Productos;
use crate::m20250301_000007_create_stock_table::Stock;
use crate::m20250301_000008_create_facturas_table::Facturas;
use crate::m20250301_000009_create_detalle_facturas_table::DetalleFacturas;
use crate::m20250301_000010_create_pedidos_table::Pedidos;
use crate::m20250301_000011_create_detalle_pedidos_table::DetallePedidos;
use crate::m20250301_000012_create_horarios_table::Horarios;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Covering indexes for the hot lookup paths: foreign keys that back the
/// list-by-parent endpoints and the status columns the dashboards filter on.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_usuarios_rol")
                    .table(Usuarios::Table)
                    .col(Usuarios::IdRol)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clientes_tipo")
                    .table(Clientes::Table)
                    .col(Clientes::TipoCliente)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_productos_categoria")
                    .table(Productos::Table)
                    .col(Productos::Categoria)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_productos_proveedor")
                    .table(Productos::Table)
                    .col(Productos::IdProveedor)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_producto")
                    .table(Stock::Table)
                    .col(Stock::IdProducto)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_facturas_cliente")
                    .table(Facturas::Table)
                    .col(Facturas::IdCliente)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_facturas_estado")
                    .table(Facturas::Table)
                    .col(Facturas::Estado)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_facturas_fecha")
                    .table(Facturas::Table)
                    .col(Facturas::Fecha)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_detalle_facturas_factura")
                    .table(DetalleFacturas::Table)
                    .col(DetalleFacturas::IdFactura)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_detalle_facturas_producto")
                    .table(DetalleFacturas::Table)
                    .col(DetalleFacturas::IdProducto)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pedidos_proveedor")
                    .table(Pedidos::Table)
                    .col(Pedidos::IdProveedor)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pedidos_estado")
                    .table(Pedidos::Table)
                    .col(Pedidos::Estado)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_detalle_pedidos_producto")
                    .table(DetallePedidos::Table)
                    .col(DetallePedidos::IdProducto)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_horarios_empleado_fecha")
                    .table(Horarios::Table)
                    .col(Horarios::IdEmpleado)
                    .col(Horarios::Fecha)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_horarios_empleado_fecha")
                    .table(Horarios::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_detalle_pedidos_producto")
                    .table(DetallePedidos::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_pedidos_estado")
                    .table(Pedidos::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_pedidos_proveedor")
                    .table(Pedidos::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_detalle_facturas_producto")
                    .table(DetalleFacturas::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_detalle_facturas_factura")
                    .table(DetalleFacturas::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_facturas_fecha")
                    .table(Facturas::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_facturas_estado")
                    .table(Facturas::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_facturas_cliente")
                    .table(Facturas::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_stock_producto")
                    .table(Stock::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_productos_proveedor")
                    .table(Productos::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_productos_categoria")
                    .table(Productos::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_clientes_tipo")
                    .table(Clientes::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_usuarios_rol")
                    .table(Usuarios::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
