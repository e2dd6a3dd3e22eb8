use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Proveedores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Proveedores::IdProveedor)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Proveedores::NombreProveedor)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Proveedores::Direccion)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Proveedores::Telefono)
                            .string_len(15)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Proveedores::Email)
                            .string_len(100)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Proveedores::ContactoPrincipal).string_len(100))
                    .col(
                        ColumnDef::new(Proveedores::Ruc)
                            .string_len(20)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Proveedores::CondicionesPago)
                            .string_len(50)
                            .not_null()
                            .default("CONTADO"),
                    )
                    .col(
                        ColumnDef::new(Proveedores::Calificacion)
                            .decimal_len(2, 1)
                            .not_null()
                            .default(5.0),
                    )
                    .col(
                        ColumnDef::new(Proveedores::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Proveedores::FechaRegistro)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Proveedores::FechaModificacion)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Proveedores::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Proveedores {
    Table,
    IdProveedor,
    NombreProveedor,
    Direccion,
    Telefono,
    Email,
    ContactoPrincipal,
    Ruc,
    CondicionesPago,
    Calificacion,
    Activo,
    FechaRegistro,
    FechaModificacion,
}
