use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_roles_table::Roles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Usuarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Usuarios::IdUsuario)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Usuarios::NombreUsuario)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Usuarios::Contrasena)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Usuarios::Email)
                            .string_len(100)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Usuarios::Nombre).string_len(100))
                    .col(ColumnDef::new(Usuarios::Apellidos).string_len(100))
                    .col(ColumnDef::new(Usuarios::Telefono).string_len(15))
                    .col(
                        ColumnDef::new(Usuarios::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Usuarios::UltimoAcceso).timestamp())
                    .col(
                        ColumnDef::new(Usuarios::IntentosFallidos)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Usuarios::IdRol).big_integer().not_null())
                    .col(
                        ColumnDef::new(Usuarios::FechaCreacion)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Usuarios::FechaModificacion)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_usuarios_rol")
                            .from(Usuarios::Table, Usuarios::IdRol)
                            .to(Roles::Table, Roles::IdRol)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Usuarios::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Usuarios {
    Table,
    IdUsuario,
    NombreUsuario,
    Contrasena,
    Email,
    Nombre,
    Apellidos,
    Telefono,
    Activo,
    UltimoAcceso,
    IntentosFallidos,
    IdRol,
    FechaCreacion,
    FechaModificacion,
}
