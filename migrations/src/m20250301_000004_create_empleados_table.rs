use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Empleados::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Empleados::IdEmpleado)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Empleados::Nombre)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Empleados::Apellidos)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Empleados::Direccion)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Empleados::Telefono)
                            .string_len(15)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Empleados::Email)
                            .string_len(100)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Empleados::Cedula)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Empleados::Puesto).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Empleados::Salario)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Empleados::FechaIngreso).date().not_null())
                    .col(
                        ColumnDef::new(Empleados::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Empleados::FechaRegistro)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Empleados::FechaModificacion)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Empleados::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Empleados {
    Table,
    IdEmpleado,
    Nombre,
    Apellidos,
    Direccion,
    Telefono,
    Email,
    Cedula,
    Puesto,
    Salario,
    FechaIngreso,
    Activo,
    FechaRegistro,
    FechaModificacion,
}
