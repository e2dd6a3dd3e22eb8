use sea_orm_migration::prelude::*;

use crate::m20250301_000004_create_empleados_table::Empleados;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Horarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Horarios::IdHorario)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Horarios::Fecha).date().not_null())
                    .col(
                        ColumnDef::new(Horarios::HoraEntrada)
                            .decimal_len(4, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Horarios::HoraSalida)
                            .decimal_len(4, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Horarios::Observaciones).string_len(200))
                    .col(
                        ColumnDef::new(Horarios::IdEmpleado)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Horarios::FechaRegistro)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_horarios_empleado")
                            .from(Horarios::Table, Horarios::IdEmpleado)
                            .to(Empleados::Table, Empleados::IdEmpleado)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Horarios::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Horarios {
    Table,
    IdHorario,
    Fecha,
    HoraEntrada,
    HoraSalida,
    Observaciones,
    IdEmpleado,
    FechaRegistro,
}
