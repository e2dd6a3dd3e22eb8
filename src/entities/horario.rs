use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registro de jornada. Las horas se guardan en formato decimal
/// (8.50 equivale a las 08:30) para poder restarlas directamente.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "horarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_horario: i64,
    pub fecha: Date,
    #[sea_orm(column_type = "Decimal(Some((4, 2)))")]
    pub hora_entrada: Decimal,
    #[sea_orm(column_type = "Decimal(Some((4, 2)))")]
    pub hora_salida: Decimal,
    #[sea_orm(nullable)]
    pub observaciones: Option<String>,
    pub id_empleado: i64,
    pub fecha_registro: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::empleado::Entity",
        from = "Column::IdEmpleado",
        to = "super::empleado::Column::IdEmpleado"
    )]
    Empleado,
}

impl Related<super::empleado::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Empleado.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn horas_trabajadas(&self) -> Decimal {
        self.hora_salida - self.hora_entrada
    }

    /// Todo lo que exceda la jornada ordinaria de 8 horas.
    pub fn horas_extra(&self) -> Decimal {
        let extra = self.horas_trabajadas() - dec!(8);
        if extra > Decimal::ZERO {
            extra
        } else {
            Decimal::ZERO
        }
    }
}
