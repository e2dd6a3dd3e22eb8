use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Existencias por producto. Una fila por producto, creada al inicializar
/// el inventario y actualizada por cada movimiento de entrada o salida.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_stock: i64,
    #[sea_orm(unique)]
    pub id_producto: i64,
    pub cantidad: i32,
    pub ubicacion: String,
    pub fecha_ultimo_movimiento: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::producto::Entity",
        from = "Column::IdProducto",
        to = "super::producto::Column::IdProducto"
    )]
    Producto,
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn alcanza_para(&self, cantidad: i32) -> bool {
        self.cantidad >= cantidad
    }
}
