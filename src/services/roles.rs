use crate::{
    db::DbPool,
    entities::{
        rol::{self, Entity as RolEntity},
        usuario::{self, Entity as UsuarioEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearRolRequest {
    #[validate(length(min = 1, max = 50, message = "El nombre del rol es obligatorio"))]
    pub nombre: String,
    #[validate(length(max = 200, message = "La descripcion admite hasta 200 caracteres"))]
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarRolRequest {
    #[validate(length(min = 1, max = 50, message = "El nombre del rol no puede quedar vacio"))]
    pub nombre: Option<String>,
    #[validate(length(max = 200, message = "La descripcion admite hasta 200 caracteres"))]
    pub descripcion: Option<String>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct RolConConteo {
    pub rol: rol::Model,
    /// Usuarios activos que tienen asignado este rol.
    pub usuarios_count: u64,
}

/// Catalogo de roles del sistema. Los permisos por endpoint se resuelven por
/// nombre de rol, asi que el alta y renombrado son operaciones delicadas.
#[derive(Clone)]
pub struct RolService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl RolService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Todos los roles en orden alfabetico, cada uno con su conteo de
    /// usuarios activos. Los roles son pocos, no hace falta paginar.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<RolConConteo>, ServiceError> {
        let db = &*self.db_pool;

        let roles = RolEntity::find()
            .order_by_asc(rol::Column::Nombre)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch roles");
                ServiceError::DatabaseError(e)
            })?;

        let mut resultado = Vec::with_capacity(roles.len());
        for rol in roles {
            let usuarios_count = self.contar_usuarios_activos(rol.id_rol).await?;
            resultado.push(RolConConteo {
                rol,
                usuarios_count,
            });
        }

        Ok(resultado)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<RolConConteo, ServiceError> {
        let rol = self.get_rol(id).await?;
        let usuarios_count = self.contar_usuarios_activos(rol.id_rol).await?;
        Ok(RolConConteo {
            rol,
            usuarios_count,
        })
    }

    /// Usuarios activos que tienen asignado el rol.
    #[instrument(skip(self))]
    pub async fn usuarios_del_rol(&self, id: i64) -> Result<Vec<usuario::Model>, ServiceError> {
        let db = &*self.db_pool;
        let rol = self.get_rol(id).await?;

        UsuarioEntity::find()
            .filter(usuario::Column::IdRol.eq(rol.id_rol))
            .filter(usuario::Column::Activo.eq(true))
            .order_by_asc(usuario::Column::NombreUsuario)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol_id = id, "Failed to fetch usuarios of rol");
                ServiceError::DatabaseError(e)
            })
    }

    #[instrument(skip(self, request), fields(nombre = %request.nombre))]
    pub async fn crear(&self, request: CrearRolRequest) -> Result<rol::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        if self.nombre_en_uso(&request.nombre, None).await? {
            return Err(ServiceError::Conflict(format!(
                "Ya existe un rol con el nombre {}",
                request.nombre
            )));
        }

        let nuevo = rol::ActiveModel {
            nombre: Set(request.nombre),
            descripcion: Set(request.descripcion),
            activo: Set(true),
            fecha_creacion: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        let model = nuevo.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to insert rol");
            ServiceError::DatabaseError(e)
        })?;

        info!(rol_id = model.id_rol, nombre = %model.nombre, "Rol creado");

        if let Err(e) = self.event_sender.send(Event::RolCreado(model.id_rol)).await {
            warn!(error = %e, rol_id = model.id_rol, "Failed to send rol created event");
        }

        Ok(model)
    }

    #[instrument(skip(self, request), fields(rol_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarRolRequest,
    ) -> Result<rol::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let rol = self.get_rol(id).await?;

        if let Some(nombre) = &request.nombre {
            if self.nombre_en_uso(nombre, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un rol con el nombre {}",
                    nombre
                )));
            }
        }

        let mut activo_model: rol::ActiveModel = rol.into();
        if let Some(nombre) = request.nombre {
            activo_model.nombre = Set(nombre);
        }
        if let Some(descripcion) = request.descripcion {
            activo_model.descripcion = Set(Some(descripcion));
        }
        if let Some(activo) = request.activo {
            activo_model.activo = Set(activo);
        }

        let model = activo_model.update(db).await.map_err(|e| {
            error!(error = %e, rol_id = id, "Failed to update rol");
            ServiceError::DatabaseError(e)
        })?;

        info!(rol_id = id, nombre = %model.nombre, "Rol actualizado");

        if let Err(e) = self.event_sender.send(Event::RolActualizado(id)).await {
            warn!(error = %e, rol_id = id, "Failed to send rol updated event");
        }

        Ok(model)
    }

    /// Borra el rol si ningun usuario lo referencia. El conteo distingue
    /// usuarios activos para dar el mensaje mas util.
    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let rol = self.get_rol(id).await?;

        let activos = self.contar_usuarios_activos(id).await?;
        if activos > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el rol: tiene {} usuarios activos asignados",
                activos
            )));
        }

        let asociados = UsuarioEntity::find()
            .filter(usuario::Column::IdRol.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol_id = id, "Failed to count usuarios of rol");
                ServiceError::DatabaseError(e)
            })?;
        if asociados > 0 {
            return Err(ServiceError::Conflict(
                "No se puede eliminar el rol: tiene usuarios asociados".to_string(),
            ));
        }

        RolEntity::delete_by_id(id).exec(db).await.map_err(|e| {
            error!(error = %e, rol_id = id, "Failed to delete rol");
            ServiceError::DatabaseError(e)
        })?;

        info!(rol_id = id, nombre = %rol.nombre, "Rol eliminado");

        if let Err(e) = self.event_sender.send(Event::RolEliminado(id)).await {
            warn!(error = %e, rol_id = id, "Failed to send rol deleted event");
        }

        Ok(())
    }

    async fn get_rol(&self, id: i64) -> Result<rol::Model, ServiceError> {
        let db = &*self.db_pool;

        RolEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol_id = id, "Failed to fetch rol");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Rol con ID {} no encontrado", id)))
    }

    async fn contar_usuarios_activos(&self, id_rol: i64) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;

        UsuarioEntity::find()
            .filter(usuario::Column::IdRol.eq(id_rol))
            .filter(usuario::Column::Activo.eq(true))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol_id = id_rol, "Failed to count usuarios of rol");
                ServiceError::DatabaseError(e)
            })
    }

    async fn nombre_en_uso(&self, nombre: &str, excluir: Option<i64>) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut consulta = RolEntity::find().filter(rol::Column::Nombre.eq(nombre));
        if let Some(id) = excluir {
            consulta = consulta.filter(rol::Column::IdRol.ne(id));
        }

        let total = consulta.count(db).await.map_err(|e| {
            error!(error = %e, "Failed to check rol nombre uniqueness");
            ServiceError::DatabaseError(e)
        })?;

        Ok(total > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nombre_de_rol_vacio_no_pasa_validacion() {
        let request = CrearRolRequest {
            nombre: String::new(),
            descripcion: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn descripcion_larga_no_pasa_validacion() {
        let request = ActualizarRolRequest {
            nombre: None,
            descripcion: Some("x".repeat(201)),
            activo: None,
        };
        assert!(request.validate().is_err());
    }
}
