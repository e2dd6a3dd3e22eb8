use crate::{
    db::DbPool,
    entities::{
        empleado::{self, Entity as EmpleadoEntity},
        horario,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use super::validacion;

/// Alta de un empleado en nomina.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearEmpleadoRequest {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(min = 1, max = 100, message = "Los apellidos son obligatorios"))]
    pub apellidos: String,
    #[validate(length(min = 1, max = 150, message = "La direccion es obligatoria"))]
    pub direccion: String,
    #[validate(length(min = 1, max = 15, message = "El telefono es obligatorio"))]
    pub telefono: String,
    #[validate(email(message = "El email no tiene un formato valido"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 20, message = "La cedula es obligatoria"))]
    pub cedula: String,
    #[validate(length(min = 1, max = 50, message = "El puesto es obligatorio"))]
    pub puesto: String,
    pub salario: Decimal,
    pub fecha_ingreso: NaiveDate,
}

/// Cambios sobre un empleado; solo los campos presentes se aplican.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarEmpleadoRequest {
    #[validate(length(min = 1, max = 100, message = "El nombre no puede quedar vacio"))]
    pub nombre: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Los apellidos no pueden quedar vacios"))]
    pub apellidos: Option<String>,
    #[validate(length(min = 1, max = 150, message = "La direccion no puede quedar vacia"))]
    pub direccion: Option<String>,
    #[validate(length(min = 1, max = 15, message = "El telefono no puede quedar vacio"))]
    pub telefono: Option<String>,
    #[validate(email(message = "El email no tiene un formato valido"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 20, message = "La cedula no puede quedar vacia"))]
    pub cedula: Option<String>,
    #[validate(length(min = 1, max = 50, message = "El puesto no puede quedar vacio"))]
    pub puesto: Option<String>,
    pub salario: Option<Decimal>,
    pub fecha_ingreso: Option<NaiveDate>,
    pub activo: Option<bool>,
}

/// Servicio de empleados: nomina y datos de contacto.
#[derive(Clone)]
pub struct EmpleadoService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl EmpleadoService {
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
    ) -> Result<(Vec<empleado::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = EmpleadoEntity::find()
            .order_by_asc(empleado::Column::Apellidos)
            .order_by_asc(empleado::Column::Nombre)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count empleados");
            ServiceError::DatabaseError(e)
        })?;

        let empleados = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch empleados page");
                ServiceError::DatabaseError(e)
            })?;

        Ok((empleados, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<empleado::Model, ServiceError> {
        let db = &*self.db_pool;

        EmpleadoEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, empleado_id = id, "Failed to fetch empleado");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Empleado con ID {} no encontrado", id)))
    }

    /// Alta de empleado; cedula y email deben ser unicos en la nomina.
    #[instrument(skip(self, request), fields(cedula = %request.cedula))]
    pub async fn crear(
        &self,
        request: CrearEmpleadoRequest,
    ) -> Result<empleado::Model, ServiceError> {
        request.validate()?;

        if !validacion::telefono_valido(&request.telefono) {
            return Err(ServiceError::ValidationError(
                "El telefono solo admite digitos y guiones".to_string(),
            ));
        }
        if request.salario <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "El salario debe ser mayor a cero".to_string(),
            ));
        }

        if self.cedula_en_uso(&request.cedula, None).await? {
            return Err(ServiceError::Conflict(format!(
                "Ya existe un empleado con la cedula {}",
                request.cedula
            )));
        }
        if let Some(email) = &request.email {
            if self.email_en_uso(email, None).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un empleado con el email {}",
                    email
                )));
            }
        }

        let db = &*self.db_pool;
        let ahora = Utc::now().naive_utc();

        let empleado = empleado::ActiveModel {
            nombre: Set(request.nombre),
            apellidos: Set(request.apellidos),
            direccion: Set(request.direccion),
            telefono: Set(request.telefono),
            email: Set(request.email),
            cedula: Set(request.cedula),
            puesto: Set(request.puesto),
            salario: Set(request.salario),
            fecha_ingreso: Set(request.fecha_ingreso),
            activo: Set(true),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        };

        let model = empleado.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to insert empleado");
            ServiceError::DatabaseError(e)
        })?;

        info!(empleado_id = model.id_empleado, "Empleado registrado");

        if let Err(e) = self
            .event_sender
            .send(Event::EmpleadoCreado(model.id_empleado))
            .await
        {
            warn!(error = %e, empleado_id = model.id_empleado, "Failed to send empleado created event");
        }

        Ok(model)
    }

    /// Aplica los campos presentes; la unicidad excluye al propio empleado.
    #[instrument(skip(self, request), fields(empleado_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarEmpleadoRequest,
    ) -> Result<empleado::Model, ServiceError> {
        request.validate()?;

        if let Some(telefono) = &request.telefono {
            if !validacion::telefono_valido(telefono) {
                return Err(ServiceError::ValidationError(
                    "El telefono solo admite digitos y guiones".to_string(),
                ));
            }
        }
        if let Some(salario) = request.salario {
            if salario <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El salario debe ser mayor a cero".to_string(),
                ));
            }
        }

        let actual = self.get(id).await?;

        if let Some(cedula) = &request.cedula {
            if self.cedula_en_uso(cedula, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un empleado con la cedula {}",
                    cedula
                )));
            }
        }
        if let Some(email) = &request.email {
            if self.email_en_uso(email, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un empleado con el email {}",
                    email
                )));
            }
        }

        let db = &*self.db_pool;
        let mut empleado: empleado::ActiveModel = actual.into();

        if let Some(nombre) = request.nombre {
            empleado.nombre = Set(nombre);
        }
        if let Some(apellidos) = request.apellidos {
            empleado.apellidos = Set(apellidos);
        }
        if let Some(direccion) = request.direccion {
            empleado.direccion = Set(direccion);
        }
        if let Some(telefono) = request.telefono {
            empleado.telefono = Set(telefono);
        }
        if let Some(email) = request.email {
            empleado.email = Set(Some(email));
        }
        if let Some(cedula) = request.cedula {
            empleado.cedula = Set(cedula);
        }
        if let Some(puesto) = request.puesto {
            empleado.puesto = Set(puesto);
        }
        if let Some(salario) = request.salario {
            empleado.salario = Set(salario);
        }
        if let Some(fecha_ingreso) = request.fecha_ingreso {
            empleado.fecha_ingreso = Set(fecha_ingreso);
        }
        if let Some(activo) = request.activo {
            empleado.activo = Set(activo);
        }
        empleado.fecha_modificacion = Set(Utc::now().naive_utc());

        let model = empleado.update(db).await.map_err(|e| {
            error!(error = %e, empleado_id = id, "Failed to update empleado");
            ServiceError::DatabaseError(e)
        })?;

        info!(empleado_id = id, "Empleado actualizado");

        if let Err(e) = self.event_sender.send(Event::EmpleadoActualizado(id)).await {
            warn!(error = %e, empleado_id = id, "Failed to send empleado updated event");
        }

        Ok(model)
    }

    /// Borrado fisico; se rechaza mientras el empleado tenga horarios.
    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get(id).await?;

        let horarios = horario::Entity::find()
            .filter(horario::Column::IdEmpleado.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, empleado_id = id, "Failed to count horarios for empleado");
                ServiceError::DatabaseError(e)
            })?;

        if horarios > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el empleado: tiene {} horarios registrados",
                horarios
            )));
        }

        EmpleadoEntity::delete_by_id(id).exec(db).await.map_err(|e| {
            error!(error = %e, empleado_id = id, "Failed to delete empleado");
            ServiceError::DatabaseError(e)
        })?;

        info!(empleado_id = id, "Empleado eliminado");

        if let Err(e) = self.event_sender.send(Event::EmpleadoEliminado(id)).await {
            warn!(error = %e, empleado_id = id, "Failed to send empleado deleted event");
        }

        Ok(())
    }

    async fn cedula_en_uso(
        &self,
        cedula: &str,
        excluir_id: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut query = EmpleadoEntity::find().filter(empleado::Column::Cedula.eq(cedula));
        if let Some(excluir) = excluir_id {
            query = query.filter(empleado::Column::IdEmpleado.ne(excluir));
        }

        let ocupados = query.count(db).await.map_err(|e| {
            error!(error = %e, cedula, "Failed to check cedula availability");
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

        let mut query = EmpleadoEntity::find().filter(empleado::Column::Email.eq(email));
        if let Some(excluir) = excluir_id {
            query = query.filter(empleado::Column::IdEmpleado.ne(excluir));
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
    use rust_decimal_macros::dec;

    fn base_request() -> CrearEmpleadoRequest {
        CrearEmpleadoRequest {
            nombre: "Carlos".into(),
            apellidos: "Mendez".into(),
            direccion: "Calle Guayaquil 1502".into(),
            telefono: "02-256-7890".into(),
            email: Some("carlos.mendez@example.com".into()),
            cedula: "1709876543".into(),
            puesto: "Bodeguero".into(),
            salario: dec!(620.00),
            fecha_ingreso: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn crear_request_valido_pasa_validacion() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn crear_request_sin_cedula_falla() {
        let mut request = base_request();
        request.cedula = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn crear_request_sin_puesto_falla() {
        let mut request = base_request();
        request.puesto = String::new();
        assert!(request.validate().is_err());
    }
}
