use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proveedores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_proveedor: i64,
    pub nombre_proveedor: String,
    pub direccion: String,
    pub telefono: String,
    #[sea_orm(unique, nullable)]
    pub email: Option<String>,
    #[sea_orm(nullable)]
    pub contacto_principal: Option<String>,
    #[sea_orm(unique, nullable)]
    pub ruc: Option<String>,
    pub condiciones_pago: String,
    #[sea_orm(column_type = "Decimal(Some((2, 1)))")]
    pub calificacion: Decimal,
    pub activo: bool,
    pub fecha_registro: DateTime,
    pub fecha_modificacion: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::producto::Entity")]
    Productos,
    #[sea_orm(has_many = "super::pedido::Entity")]
    Pedidos,
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Productos.def()
    }
}

impl Related<super::pedido::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pedidos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
