use sea_orm_migration::prelude::*;

use crate::m20250301_000006_create_productos_table::Productos;
use crate::m20250301_000010_create_pedidos_table::Pedidos;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DetallePedidos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DetallePedidos::IdDetallePedido)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DetallePedidos::IdPedido)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetallePedidos::IdProducto)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetallePedidos::Cantidad)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetallePedidos::PrecioUni)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detalle_pedidos_pedido")
                            .from(DetallePedidos::Table, DetallePedidos::IdPedido)
                            .to(Pedidos::Table, Pedidos::IdPedido)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detalle_pedidos_producto")
                            .from(DetallePedidos::Table, DetallePedidos::IdProducto)
                            .to(Productos::Table, Productos::IdProducto)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_detalle_pedidos_pedido_producto")
                    .table(DetallePedidos::Table)
                    .col(DetallePedidos::IdPedido)
                    .col(DetallePedidos::IdProducto)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DetallePedidos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DetallePedidos {
    Table,
    IdDetallePedido,
    IdPedido,
    IdProducto,
    Cantidad,
    PrecioUni,
}
