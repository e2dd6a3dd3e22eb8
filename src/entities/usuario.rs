use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cuenta de acceso al sistema. La contrasena se guarda como hash Argon2 y
/// nunca se serializa hacia afuera.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_usuario: i64,
    #[sea_orm(unique)]
    pub nombre_usuario: String,
    #[serde(skip_serializing)]
    pub contrasena: String,
    #[sea_orm(unique, nullable)]
    pub email: Option<String>,
    #[sea_orm(nullable)]
    pub nombre: Option<String>,
    #[sea_orm(nullable)]
    pub apellidos: Option<String>,
    #[sea_orm(nullable)]
    pub telefono: Option<String>,
    pub activo: bool,
    #[sea_orm(nullable)]
    pub ultimo_acceso: Option<DateTime>,
    pub intentos_fallidos: i32,
    pub id_rol: i64,
    pub fecha_creacion: DateTime,
    pub fecha_modificacion: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rol::Entity",
        from = "Column::IdRol",
        to = "super::rol::Column::IdRol"
    )]
    Rol,
    #[sea_orm(has_many = "super::factura::Entity")]
    Facturas,
    #[sea_orm(has_many = "super::pedido::Entity")]
    Pedidos,
}

impl Related<super::rol::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rol.def()
    }
}

impl Related<super::factura::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Facturas.def()
    }
}

impl Related<super::pedido::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pedidos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Nombre y apellidos cuando ambos existen; si no, el nombre de usuario.
    pub fn nombre_completo(&self) -> String {
        match (&self.nombre, &self.apellidos) {
            (Some(nombre), Some(apellidos)) => format!("{} {}", nombre, apellidos),
            _ => self.nombre_usuario.clone(),
        }
    }
}
