use sea_orm_migration::prelude::*;

use crate::m20250301_000002_create_usuarios_table::Usuarios;
use crate::m20250301_000003_create_clientes_table::Clientes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Facturas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Facturas::IdFactura)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Facturas::NumeroFactura)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Facturas::Fecha).date().not_null())
                    .col(
                        ColumnDef::new(Facturas::Subtotal)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Facturas::Impuesto)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Facturas::Descuento)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Facturas::Total)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Facturas::Estado)
                            .string_len(20)
                            .not_null()
                            .default("PENDIENTE"),
                    )
                    .col(
                        ColumnDef::new(Facturas::MetodoPago)
                            .string_len(20)
                            .not_null()
                            .default("EFECTIVO"),
                    )
                    .col(ColumnDef::new(Facturas::Observaciones).string_len(300))
                    .col(ColumnDef::new(Facturas::IdCliente).big_integer().not_null())
                    .col(ColumnDef::new(Facturas::IdUsuario).big_integer())
                    .col(
                        ColumnDef::new(Facturas::FechaRegistro)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Facturas::FechaModificacion)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_facturas_cliente")
                            .from(Facturas::Table, Facturas::IdCliente)
                            .to(Clientes::Table, Clientes::IdCliente)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_facturas_usuario")
                            .from(Facturas::Table, Facturas::IdUsuario)
                            .to(Usuarios::Table, Usuarios::IdUsuario)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Facturas::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Facturas {
    Table,
    IdFactura,
    NumeroFactura,
    Fecha,
    Subtotal,
    Impuesto,
    Descuento,
    Total,
    Estado,
    MetodoPago,
    Observaciones,
    IdCliente,
    IdUsuario,
    FechaRegistro,
    FechaModificacion,
}
