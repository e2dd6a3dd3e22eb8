use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "empleados")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_empleado: i64,
    pub nombre: String,
    pub apellidos: String,
    pub direccion: String,
    pub telefono: String,
    #[sea_orm(unique, nullable)]
    pub email: Option<String>,
    #[sea_orm(unique)]
    pub cedula: String,
    pub puesto: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub salario: Decimal,
    pub fecha_ingreso: Date,
    pub activo: bool,
    pub fecha_registro: DateTime,
    pub fecha_modificacion: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::horario::Entity")]
    Horarios,
}

impl Related<super::horario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Horarios.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombre, self.apellidos)
    }
}
