use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detalle_facturas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_detalle_factura: i64,
    pub id_factura: i64,
    pub id_producto: i64,
    pub cantidad: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub precio_uni: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub descuento_item: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::factura::Entity",
        from = "Column::IdFactura",
        to = "super::factura::Column::IdFactura"
    )]
    Factura,
    #[sea_orm(
        belongs_to = "super::producto::Entity",
        from = "Column::IdProducto",
        to = "super::producto::Column::IdProducto"
    )]
    Producto,
}

impl Related<super::factura::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Factura.def()
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
        Decimal::from(self.cantidad) * self.precio_uni - self.descuento_item
    }
}
