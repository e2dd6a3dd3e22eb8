use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Articulo del catalogo. El inventario fisico vive en la tabla stock,
/// aqui solo se define el umbral de reposicion (stock_minimo).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_producto: i64,
    pub nombre_producto: String,
    #[sea_orm(nullable)]
    pub descripcion: Option<String>,
    #[sea_orm(unique)]
    pub codigo_producto: String,
    pub categoria: String,
    #[sea_orm(nullable)]
    pub marca: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub precio: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub precio_compra: Option<Decimal>,
    pub unidad_medida: String,
    pub stock_minimo: i32,
    pub activo: bool,
    #[sea_orm(nullable)]
    pub id_proveedor: Option<i64>,
    pub fecha_registro: DateTime,
    pub fecha_modificacion: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::proveedor::Entity",
        from = "Column::IdProveedor",
        to = "super::proveedor::Column::IdProveedor"
    )]
    Proveedor,
    #[sea_orm(has_one = "super::stock::Entity")]
    Stock,
    #[sea_orm(has_many = "super::detalle_factura::Entity")]
    DetalleFacturas,
    #[sea_orm(has_many = "super::detalle_pedido::Entity")]
    DetallePedidos,
}

impl Related<super::proveedor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proveedor.def()
    }
}

impl Related<super::stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stock.def()
    }
}

impl Related<super::detalle_factura::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DetalleFacturas.def()
    }
}

impl Related<super::detalle_pedido::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DetallePedidos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Margen bruto contra el precio de compra, cuando se conoce.
    pub fn margen(&self) -> Option<Decimal> {
        self.precio_compra.map(|compra| self.precio - compra)
    }
}
