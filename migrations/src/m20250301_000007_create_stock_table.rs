use sea_orm_migration::prelude::*;

use crate::m20250301_000006_create_productos_table::Productos;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stock::IdStock)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Stock::IdProducto)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Stock::Cantidad)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Stock::Ubicacion)
                            .string_len(50)
                            .not_null()
                            .default("ALMACEN PRINCIPAL"),
                    )
                    .col(
                        ColumnDef::new(Stock::FechaUltimoMovimiento)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_producto")
                            .from(Stock::Table, Stock::IdProducto)
                            .to(Productos::Table, Productos::IdProducto)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stock::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Stock {
    Table,
    IdStock,
    IdProducto,
    Cantidad,
    Ubicacion,
    FechaUltimoMovimiento,
}
