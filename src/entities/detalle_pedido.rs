use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detalle_pedidos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_detalle_pedido: i64,
    pub id_pedido: i64,
    pub id_producto: i64,
    pub cantidad: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub precio_uni: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pedido::Entity",
        from = "Column::IdPedido",
        to = "super::pedido::Column::IdPedido"
    )]
    Pedido,
    #[sea_orm(
        belongs_to = "super::producto::Entity",
        from = "Column::IdProducto",
        to = "super::producto::Column::IdProducto"
    )]
    Producto,
}

impl Related<super::pedido::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pedido.def()
    }
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.cantidad) * self.precio_uni
    }
}
