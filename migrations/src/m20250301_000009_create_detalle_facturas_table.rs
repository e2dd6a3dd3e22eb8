use sea_orm_migration::prelude::*;

use crate::m20250301_000006_create_productos_table::Productos;
use crate::m20250301_000008_create_facturas_table::Facturas;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DetalleFacturas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DetalleFacturas::IdDetalleFactura)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DetalleFacturas::IdFactura)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetalleFacturas::IdProducto)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetalleFacturas::Cantidad)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetalleFacturas::PrecioUni)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetalleFacturas::DescuentoItem)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detalle_facturas_factura")
                            .from(DetalleFacturas::Table, DetalleFacturas::IdFactura)
                            .to(Facturas::Table, Facturas::IdFactura)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detalle_facturas_producto")
                            .from(DetalleFacturas::Table, DetalleFacturas::IdProducto)
                            .to(Productos::Table, Productos::IdProducto)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DetalleFacturas::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DetalleFacturas {
    Table,
    IdDetalleFactura,
    IdFactura,
    IdProducto,
    Cantidad,
    PrecioUni,
    DescuentoItem,
}
