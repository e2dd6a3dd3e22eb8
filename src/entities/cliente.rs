use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clientes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_cliente: i64,
    pub nombre: String,
    pub apellidos: String,
    pub direccion: String,
    pub telefono: String,
    #[sea_orm(unique, nullable)]
    pub email: Option<String>,
    #[sea_orm(unique, nullable)]
    pub cedula: Option<String>,
    pub tipo_cliente: TipoCliente,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub limite_credito: Decimal,
    pub activo: bool,
    pub fecha_registro: DateTime,
    pub fecha_modificacion: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::factura::Entity")]
    Facturas,
}

impl Related<super::factura::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Facturas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombre, self.apellidos)
    }

    /// Los clientes mayoristas y VIP compran a credito hasta su limite.
    pub fn puede_comprar_a_credito(&self) -> bool {
        !matches!(self.tipo_cliente, TipoCliente::Regular) && self.limite_credito > Decimal::ZERO
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoCliente {
    #[sea_orm(string_value = "REGULAR")]
    Regular,
    #[sea_orm(string_value = "MAYORISTA")]
    Mayorista,
    #[sea_orm(string_value = "VIP")]
    Vip,
}
