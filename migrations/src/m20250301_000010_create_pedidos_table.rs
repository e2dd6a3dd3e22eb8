use sea_orm_migration::prelude::*;

use crate::m20250301_000002_create_usuarios_table::Usuarios;
use crate::m20250301_000005_create_proveedores_table::Proveedores;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pedidos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pedidos::IdPedido)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Pedidos::NumeroPedido)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Pedidos::Fecha).date().not_null())
                    .col(
                        ColumnDef::new(Pedidos::Total)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Pedidos::Estado)
                            .string_len(20)
                            .not_null()
                            .default("PENDIENTE"),
                    )
                    .col(ColumnDef::new(Pedidos::Descripcion).string_len(200))
                    .col(ColumnDef::new(Pedidos::Observaciones).string_len(300))
                    .col(ColumnDef::new(Pedidos::FechaEntregaEsperada).date())
                    .col(
                        ColumnDef::new(Pedidos::IdProveedor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Pedidos::IdUsuario).big_integer())
                    .col(
                        ColumnDef::new(Pedidos::FechaRegistro)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Pedidos::FechaModificacion)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pedidos_proveedor")
                            .from(Pedidos::Table, Pedidos::IdProveedor)
                            .to(Proveedores::Table, Proveedores::IdProveedor)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pedidos_usuario")
                            .from(Pedidos::Table, Pedidos::IdUsuario)
                            .to(Usuarios::Table, Usuarios::IdUsuario)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pedidos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Pedidos {
    Table,
    IdPedido,
    NumeroPedido,
    Fecha,
    Total,
    Estado,
    Descripcion,
    Observaciones,
    FechaEntregaEsperada,
    IdProveedor,
    IdUsuario,
    FechaRegistro,
    FechaModificacion,
}
