use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Orden de compra a proveedor. El ciclo de vida avanza solo hacia adelante:
/// PENDIENTE -> APROBADO -> ENVIADO -> RECIBIDO, con cancelacion posible
/// hasta antes del envio. Al marcar RECIBIDO la mercaderia ingresa al stock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pedidos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_pedido: i64,
    #[sea_orm(unique)]
    pub numero_pedido: String,
    pub fecha: Date,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub estado: EstadoPedido,
    #[sea_orm(nullable)]
    pub descripcion: Option<String>,
    #[sea_orm(nullable)]
    pub observaciones: Option<String>,
    #[sea_orm(nullable)]
    pub fecha_entrega_esperada: Option<Date>,
    pub id_proveedor: i64,
    #[sea_orm(nullable)]
    pub id_usuario: Option<i64>,
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
    #[sea_orm(
        belongs_to = "super::usuario::Entity",
        from = "Column::IdUsuario",
        to = "super::usuario::Column::IdUsuario"
    )]
    Usuario,
    #[sea_orm(has_many = "super::detalle_pedido::Entity")]
    Detalles,
}

impl Related<super::proveedor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proveedor.def()
    }
}

impl Related<super::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usuario.def()
    }
}

impl Related<super::detalle_pedido::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Detalles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn es_final(&self) -> bool {
        matches!(self.estado, EstadoPedido::Recibido | EstadoPedido::Cancelado)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoPedido {
    #[sea_orm(string_value = "PENDIENTE")]
    Pendiente,
    #[sea_orm(string_value = "APROBADO")]
    Aprobado,
    #[sea_orm(string_value = "ENVIADO")]
    Enviado,
    #[sea_orm(string_value = "RECIBIDO")]
    Recibido,
    #[sea_orm(string_value = "CANCELADO")]
    Cancelado,
}

impl EstadoPedido {
    /// Transiciones permitidas del ciclo de vida del pedido.
    pub fn puede_transicionar_a(&self, destino: EstadoPedido) -> bool {
        use EstadoPedido::*;
        matches!(
            (self, destino),
            (Pendiente, Aprobado)
                | (Pendiente, Cancelado)
                | (Aprobado, Enviado)
                | (Aprobado, Cancelado)
                | (Enviado, Recibido)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::EstadoPedido;
    use super::EstadoPedido::*;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(Pendiente, Aprobado => true; "pendiente se aprueba")]
    #[test_case(Pendiente, Cancelado => true; "pendiente se cancela")]
    #[test_case(Aprobado, Enviado => true; "aprobado se envia")]
    #[test_case(Aprobado, Cancelado => true; "aprobado se cancela")]
    #[test_case(Enviado, Recibido => true; "enviado se recibe")]
    #[test_case(Pendiente, Enviado => false; "sin aprobar no se envia")]
    #[test_case(Pendiente, Recibido => false; "sin enviar no se recibe")]
    #[test_case(Enviado, Cancelado => false; "en transito ya no se cancela")]
    #[test_case(Aprobado, Pendiente => false; "no retrocede")]
    #[test_case(Recibido, Cancelado => false; "recibido es final")]
    #[test_case(Cancelado, Aprobado => false; "cancelado es final")]
    fn transiciones_del_ciclo_de_vida(desde: EstadoPedido, hacia: EstadoPedido) -> bool {
        desde.puede_transicionar_a(hacia)
    }

    #[test]
    fn el_estado_se_escribe_en_mayusculas() {
        assert_eq!(Pendiente.to_string(), "PENDIENTE");
        assert_eq!(EstadoPedido::from_str("ENVIADO"), Ok(Enviado));
        assert!(EstadoPedido::from_str("enviado").is_err());
    }
}
