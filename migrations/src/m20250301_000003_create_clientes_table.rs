use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clientes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clientes::IdCliente)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clientes::Nombre).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Clientes::Apellidos)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Clientes::Direccion)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Clientes::Telefono)
                            .string_len(15)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Clientes::Email)
                            .string_len(100)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Clientes::Cedula)
                            .string_len(20)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Clientes::TipoCliente)
                            .string_len(20)
                            .not_null()
                            .default("REGULAR"),
                    )
                    .col(
                        ColumnDef::new(Clientes::LimiteCredito)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clientes::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Clientes::FechaRegistro)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Clientes::FechaModificacion)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Clientes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Clientes {
    Table,
    IdCliente,
    Nombre,
    Apellidos,
    Direccion,
    Telefono,
    Email,
    Cedula,
    TipoCliente,
    LimiteCredito,
    Activo,
    FechaRegistro,
    FechaModificacion,
}
