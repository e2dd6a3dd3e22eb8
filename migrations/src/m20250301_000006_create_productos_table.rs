use sea_orm_migration::prelude::*;

use crate::m20250301_000005_create_proveedores_table::Proveedores;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Productos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Productos::IdProducto)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Productos::NombreProducto)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Productos::Descripcion).string_len(200))
                    .col(
                        ColumnDef::new(Productos::CodigoProducto)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Productos::Categoria)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Productos::Marca).string_len(50))
                    .col(
                        ColumnDef::new(Productos::Precio)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Productos::PrecioCompra).decimal_len(10, 2))
                    .col(
                        ColumnDef::new(Productos::UnidadMedida)
                            .string_len(20)
                            .not_null()
                            .default("UNIDAD"),
                    )
                    .col(
                        ColumnDef::new(Productos::StockMinimo)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Productos::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Productos::IdProveedor).big_integer())
                    .col(
                        ColumnDef::new(Productos::FechaRegistro)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Productos::FechaModificacion)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_productos_proveedor")
                            .from(Productos::Table, Productos::IdProveedor)
                            .to(Proveedores::Table, Proveedores::IdProveedor)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Productos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Productos {
    Table,
    IdProducto,
    NombreProducto,
    Descripcion,
    CodigoProducto,
    Categoria,
    Marca,
    Precio,
    PrecioCompra,
    UnidadMedida,
    StockMinimo,
    Activo,
    IdProveedor,
    FechaRegistro,
    FechaModificacion,
}
