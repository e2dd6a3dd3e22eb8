use crate::{
    db::DbPool,
    entities::{
        pedido, producto,
        proveedor::{self, Entity as ProveedorEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use super::validacion;

/// Alta de un proveedor.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearProveedorRequest {
    #[validate(length(min = 1, max = 100, message = "El nombre del proveedor es obligatorio"))]
    pub nombre_proveedor: String,
    #[validate(length(min = 1, max = 150, message = "La direccion es obligatoria"))]
    pub direccion: String,
    #[validate(length(min = 1, max = 15, message = "El telefono es obligatorio"))]
    pub telefono: String,
    #[validate(email(message = "El email no tiene un formato valido"))]
    pub email: Option<String>,
    #[validate(length(max = 100, message = "El contacto admite hasta 100 caracteres"))]
    pub contacto_principal: Option<String>,
    #[validate(length(max = 20, message = "El RUC admite hasta 20 caracteres"))]
    pub ruc: Option<String>,
    #[validate(length(max = 50, message = "Las condiciones de pago admiten hasta 50 caracteres"))]
    pub condiciones_pago: Option<String>,
    pub calificacion: Option<Decimal>,
}

/// Cambios sobre un proveedor; solo los campos presentes se aplican.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarProveedorRequest {
    #[validate(length(min = 1, max = 100, message = "El nombre no puede quedar vacio"))]
    pub nombre_proveedor: Option<String>,
    #[validate(length(min = 1, max = 150, message = "La direccion no puede quedar vacia"))]
    pub direccion: Option<String>,
    #[validate(length(min = 1, max = 15, message = "El telefono no puede quedar vacio"))]
    pub telefono: Option<String>,
    #[validate(email(message = "El email no tiene un formato valido"))]
    pub email: Option<String>,
    #[validate(length(max = 100, message = "El contacto admite hasta 100 caracteres"))]
    pub contacto_principal: Option<String>,
    #[validate(length(max = 20, message = "El RUC admite hasta 20 caracteres"))]
    pub ruc: Option<String>,
    #[validate(length(max = 50, message = "Las condiciones de pago admiten hasta 50 caracteres"))]
    pub condiciones_pago: Option<String>,
    pub calificacion: Option<Decimal>,
    pub activo: Option<bool>,
}

fn validar_calificacion(calificacion: Decimal) -> Result<(), ServiceError> {
    if calificacion < Decimal::ZERO || calificacion > dec!(5) {
        return Err(ServiceError::ValidationError(
            "La calificacion debe estar entre 0 y 5".to_string(),
        ));
    }
    Ok(())
}

/// Servicio de proveedores del catalogo de compras.
#[derive(Clone)]
pub struct ProveedorService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProveedorService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<proveedor::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = ProveedorEntity::find()
            .order_by_asc(proveedor::Column::NombreProveedor)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count proveedores");
            ServiceError::DatabaseError(e)
        })?;

        let proveedores = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch proveedores page");
                ServiceError::DatabaseError(e)
            })?;

        Ok((proveedores, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<proveedor::Model, ServiceError> {
        let db = &*self.db_pool;

        ProveedorEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, proveedor_id = id, "Failed to fetch proveedor");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Proveedor con ID {} no encontrado", id))
            })
    }

    /// Alta de proveedor; RUC y email deben ser unicos.
    #[instrument(skip(self, request), fields(nombre = %request.nombre_proveedor))]
    pub async fn crear(
        &self,
        request: CrearProveedorRequest,
    ) -> Result<proveedor::Model, ServiceError> {
        request.validate()?;

        if !validacion::telefono_valido(&request.telefono) {
            return Err(ServiceError::ValidationError(
                "El telefono solo admite digitos y guiones".to_string(),
            ));
        }
        if let Some(calificacion) = request.calificacion {
            validar_calificacion(calificacion)?;
        }

        if let Some(ruc) = &request.ruc {
            if self.ruc_en_uso(ruc, None).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un proveedor con el RUC {}",
                    ruc
                )));
            }
        }
        if let Some(email) = &request.email {
            if self.email_en_uso(email, None).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un proveedor con el email {}",
                    email
                )));
            }
        }

        let db = &*self.db_pool;
        let ahora = Utc::now().naive_utc();

        let proveedor = proveedor::ActiveModel {
            nombre_proveedor: Set(request.nombre_proveedor),
            direccion: Set(request.direccion),
            telefono: Set(request.telefono),
            email: Set(request.email),
            contacto_principal: Set(request.contacto_principal),
            ruc: Set(request.ruc),
            condiciones_pago: Set(request
                .condiciones_pago
                .unwrap_or_else(|| "CONTADO".to_string())),
            calificacion: Set(request.calificacion.unwrap_or_else(|| dec!(5.0))),
            activo: Set(true),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        };

        let model = proveedor.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to insert proveedor");
            ServiceError::DatabaseError(e)
        })?;

        info!(proveedor_id = model.id_proveedor, "Proveedor registrado");

        if let Err(e) = self
            .event_sender
            .send(Event::ProveedorCreado(model.id_proveedor))
            .await
        {
            warn!(error = %e, proveedor_id = model.id_proveedor, "Failed to send proveedor created event");
        }

        Ok(model)
    }

    /// Aplica los campos presentes; la unicidad excluye al propio proveedor.
    #[instrument(skip(self, request), fields(proveedor_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarProveedorRequest,
    ) -> Result<proveedor::Model, ServiceError> {
        request.validate()?;

        if let Some(telefono) = &request.telefono {
            if !validacion::telefono_valido(telefono) {
                return Err(ServiceError::ValidationError(
                    "El telefono solo admite digitos y guiones".to_string(),
                ));
            }
        }
        if let Some(calificacion) = request.calificacion {
            validar_calificacion(calificacion)?;
        }

        let actual = self.get(id).await?;

        if let Some(ruc) = &request.ruc {
            if self.ruc_en_uso(ruc, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un proveedor con el RUC {}",
                    ruc
                )));
            }
        }
        if let Some(email) = &request.email {
            if self.email_en_uso(email, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un proveedor con el email {}",
                    email
                )));
            }
        }

        let db = &*self.db_pool;
        let mut proveedor: proveedor::ActiveModel = actual.into();

        if let Some(nombre) = request.nombre_proveedor {
            proveedor.nombre_proveedor = Set(nombre);
        }
        if let Some(direccion) = request.direccion {
            proveedor.direccion = Set(direccion);
        }
        if let Some(telefono) = request.telefono {
            proveedor.telefono = Set(telefono);
        }
        if let Some(email) = request.email {
            proveedor.email = Set(Some(email));
        }
        if let Some(contacto) = request.contacto_principal {
            proveedor.contacto_principal = Set(Some(contacto));
        }
        if let Some(ruc) = request.ruc {
            proveedor.ruc = Set(Some(ruc));
        }
        if let Some(condiciones) = request.condiciones_pago {
            proveedor.condiciones_pago = Set(condiciones);
        }
        if let Some(calificacion) = request.calificacion {
            proveedor.calificacion = Set(calificacion);
        }
        if let Some(activo) = request.activo {
            proveedor.activo = Set(activo);
        }
        proveedor.fecha_modificacion = Set(Utc::now().naive_utc());

        let model = proveedor.update(db).await.map_err(|e| {
            error!(error = %e, proveedor_id = id, "Failed to update proveedor");
            ServiceError::DatabaseError(e)
        })?;

        info!(proveedor_id = id, "Proveedor actualizado");

        if let Err(e) = self.event_sender.send(Event::ProveedorActualizado(id)).await {
            warn!(error = %e, proveedor_id = id, "Failed to send proveedor updated event");
        }

        Ok(model)
    }

    /// Borrado fisico; se rechaza mientras haya productos o pedidos del proveedor.
    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get(id).await?;

        let productos = producto::Entity::find()
            .filter(producto::Column::IdProveedor.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, proveedor_id = id, "Failed to count productos for proveedor");
                ServiceError::DatabaseError(e)
            })?;

        if productos > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el proveedor: tiene {} productos asociados",
                productos
            )));
        }

        let pedidos = pedido::Entity::find()
            .filter(pedido::Column::IdProveedor.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, proveedor_id = id, "Failed to count pedidos for proveedor");
                ServiceError::DatabaseError(e)
            })?;

        if pedidos > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el proveedor: tiene {} pedidos asociados",
                pedidos
            )));
        }

        ProveedorEntity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, proveedor_id = id, "Failed to delete proveedor");
                ServiceError::DatabaseError(e)
            })?;

        info!(proveedor_id = id, "Proveedor eliminado");

        if let Err(e) = self.event_sender.send(Event::ProveedorEliminado(id)).await {
            warn!(error = %e, proveedor_id = id, "Failed to send proveedor deleted event");
        }

        Ok(())
    }

    async fn ruc_en_uso(&self, ruc: &str, excluir_id: Option<i64>) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut query = ProveedorEntity::find().filter(proveedor::Column::Ruc.eq(ruc));
        if let Some(excluir) = excluir_id {
            query = query.filter(proveedor::Column::IdProveedor.ne(excluir));
        }

        let ocupados = query.count(db).await.map_err(|e| {
            error!(error = %e, ruc, "Failed to check RUC availability");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ocupados > 0)
    }

    async fn email_en_uso(
        &self,
        email: &str,
        excluir_id: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut query = ProveedorEntity::find().filter(proveedor::Column::Email.eq(email));
        if let Some(excluir) = excluir_id {
            query = query.filter(proveedor::Column::IdProveedor.ne(excluir));
        }

        let ocupados = query.count(db).await.map_err(|e| {
            error!(error = %e, email, "Failed to check email availability");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ocupados > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CrearProveedorRequest {
        CrearProveedorRequest {
            nombre_proveedor: "Aceros del Pacifico".into(),
            direccion: "Parque Industrial Norte, nave 7".into(),
            telefono: "04-380-4455".into(),
            email: Some("ventas@acerosdelpacifico.example.com".into()),
            contacto_principal: Some("Ing. Rosa Villalba".into()),
            ruc: Some("0992345678001".into()),
            condiciones_pago: Some("CREDITO 30 DIAS".into()),
            calificacion: None,
        }
    }

    #[test]
    fn crear_request_valido_pasa_validacion() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn calificacion_fuera_de_rango_se_rechaza() {
        assert!(validar_calificacion(dec!(5.1)).is_err());
        assert!(validar_calificacion(dec!(-0.5)).is_err());
        assert!(validar_calificacion(dec!(0)).is_ok());
        assert!(validar_calificacion(dec!(5)).is_ok());
        assert!(validar_calificacion(dec!(3.5)).is_ok());
    }
}
