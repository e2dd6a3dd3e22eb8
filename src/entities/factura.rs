use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cabecera de venta. Los montos se recalculan siempre a partir del detalle,
/// nunca se aceptan del cliente.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "facturas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_factura: i64,
    #[sea_orm(unique)]
    pub numero_factura: String,
    pub fecha: Date,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub impuesto: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub descuento: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub estado: EstadoFactura,
    pub metodo_pago: MetodoPago,
    #[sea_orm(nullable)]
    pub observaciones: Option<String>,
    pub id_cliente: i64,
    #[sea_orm(nullable)]
    pub id_usuario: Option<i64>,
    pub fecha_registro: DateTime,
    pub fecha_modificacion: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cliente::Entity",
        from = "Column::IdCliente",
        to = "super::cliente::Column::IdCliente"
    )]
    Cliente,
    #[sea_orm(
        belongs_to = "super::usuario::Entity",
        from = "Column::IdUsuario",
        to = "super::usuario::Column::IdUsuario"
    )]
    Usuario,
    #[sea_orm(has_many = "super::detalle_factura::Entity")]
    Detalles,
}

impl Related<super::cliente::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cliente.def()
    }
}

impl Related<super::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usuario.def()
    }
}

impl Related<super::detalle_factura::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Detalles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Solo las facturas pendientes admiten anulacion; una factura pagada
    /// exige nota de credito y una anulada ya devolvio su stock.
    pub fn puede_ser_anulada(&self) -> bool {
        matches!(self.estado, EstadoFactura::Pendiente)
    }

    /// El detalle solo se reemplaza mientras la factura sigue pendiente.
    pub fn puede_ser_editada(&self) -> bool {
        matches!(self.estado, EstadoFactura::Pendiente)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoFactura {
    #[sea_orm(string_value = "PENDIENTE")]
    Pendiente,
    #[sea_orm(string_value = "PAGADA")]
    Pagada,
    #[sea_orm(string_value = "ANULADA")]
    Anulada,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetodoPago {
    #[sea_orm(string_value = "EFECTIVO")]
    Efectivo,
    #[sea_orm(string_value = "TARJETA")]
    Tarjeta,
    #[sea_orm(string_value = "TRANSFERENCIA")]
    Transferencia,
    #[sea_orm(string_value = "CREDITO")]
    Credito,
}
