use crate::{
    db::DbPool,
    entities::{
        empleado::{self, Entity as EmpleadoEntity},
        horario::{self, Entity as HorarioEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Alta de jornada. Las horas van en decimal: 8.50 son las 08:30.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearHorarioRequest {
    pub fecha: NaiveDate,
    pub hora_entrada: Decimal,
    pub hora_salida: Decimal,
    #[validate(length(max = 300, message = "Las observaciones admiten hasta 300 caracteres"))]
    pub observaciones: Option<String>,
    pub id_empleado: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarHorarioRequest {
    pub fecha: Option<NaiveDate>,
    pub hora_entrada: Option<Decimal>,
    pub hora_salida: Option<Decimal>,
    #[validate(length(max = 300, message = "Las observaciones admiten hasta 300 caracteres"))]
    pub observaciones: Option<String>,
    pub id_empleado: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct HorarioConEmpleado {
    pub horario: horario::Model,
    pub empleado: Option<empleado::Model>,
}

/// La jornada cabe en un dia: entrada desde las 0, salida hasta las 24 y
/// siempre despues de la entrada.
fn validar_rango_horario(hora_entrada: Decimal, hora_salida: Decimal) -> Result<(), ServiceError> {
    if hora_entrada < Decimal::ZERO || hora_salida > dec!(24) || hora_entrada >= hora_salida {
        return Err(ServiceError::ValidationError(
            "El horario debe cumplir 0 <= hora_entrada < hora_salida <= 24".to_string(),
        ));
    }
    Ok(())
}

/// Registro de jornadas del personal.
#[derive(Clone)]
pub struct HorarioService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl HorarioService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lista paginada, jornadas mas recientes primero.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<HorarioConEmpleado>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = HorarioEntity::find()
            .order_by_desc(horario::Column::Fecha)
            .order_by_desc(horario::Column::IdHorario)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count horarios");
            ServiceError::DatabaseError(e)
        })?;

        let horarios = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch horarios page");
                ServiceError::DatabaseError(e)
            })?;

        let empleado_ids: Vec<i64> = horarios.iter().map(|h| h.id_empleado).collect();
        let empleados: HashMap<i64, empleado::Model> = EmpleadoEntity::find()
            .filter(empleado::Column::IdEmpleado.is_in(empleado_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch empleados for horarios page");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|e| (e.id_empleado, e))
            .collect();

        let resultado = horarios
            .into_iter()
            .map(|h| {
                let empleado = empleados.get(&h.id_empleado).cloned();
                HorarioConEmpleado {
                    horario: h,
                    empleado,
                }
            })
            .collect();

        Ok((resultado, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<HorarioConEmpleado, ServiceError> {
        let db = &*self.db_pool;
        let horario = self.get_horario(id).await?;

        let empleado = horario
            .find_related(empleado::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, horario_id = id, "Failed to fetch empleado for horario");
                ServiceError::DatabaseError(e)
            })?;

        Ok(HorarioConEmpleado { horario, empleado })
    }

    /// Jornadas de un empleado, mas recientes primero.
    #[instrument(skip(self))]
    pub async fn por_empleado(&self, id_empleado: i64) -> Result<Vec<horario::Model>, ServiceError> {
        let db = &*self.db_pool;

        let empleado = EmpleadoEntity::find_by_id(id_empleado)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, empleado_id = id_empleado, "Failed to fetch empleado");
                ServiceError::DatabaseError(e)
            })?;
        if empleado.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Empleado con ID {} no encontrado",
                id_empleado
            )));
        }

        HorarioEntity::find()
            .filter(horario::Column::IdEmpleado.eq(id_empleado))
            .order_by_desc(horario::Column::Fecha)
            .order_by_desc(horario::Column::IdHorario)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, empleado_id = id_empleado, "Failed to fetch horarios");
                ServiceError::DatabaseError(e)
            })
    }

    #[instrument(skip(self, request), fields(empleado_id = request.id_empleado))]
    pub async fn crear(&self, request: CrearHorarioRequest) -> Result<horario::Model, ServiceError> {
        request.validate()?;
        validar_rango_horario(request.hora_entrada, request.hora_salida)?;
        self.verificar_empleado(request.id_empleado).await?;

        let db = &*self.db_pool;
        let nuevo = horario::ActiveModel {
            fecha: Set(request.fecha),
            hora_entrada: Set(request.hora_entrada),
            hora_salida: Set(request.hora_salida),
            observaciones: Set(request.observaciones),
            id_empleado: Set(request.id_empleado),
            fecha_registro: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        let model = nuevo.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to insert horario");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            horario_id = model.id_horario,
            empleado_id = model.id_empleado,
            fecha = %model.fecha,
            horas = %model.horas_trabajadas(),
            "Jornada registrada"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::HorarioRegistrado {
                horario_id: model.id_horario,
                empleado_id: model.id_empleado,
            })
            .await
        {
            warn!(error = %e, horario_id = model.id_horario, "Failed to send horario event");
        }

        Ok(model)
    }

    #[instrument(skip(self, request), fields(horario_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarHorarioRequest,
    ) -> Result<horario::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let horario = self.get_horario(id).await?;

        // El rango se valida sobre los valores ya combinados, para que
        // cambiar solo la salida siga chequeando contra la entrada vigente.
        let hora_entrada = request.hora_entrada.unwrap_or(horario.hora_entrada);
        let hora_salida = request.hora_salida.unwrap_or(horario.hora_salida);
        validar_rango_horario(hora_entrada, hora_salida)?;

        if let Some(id_empleado) = request.id_empleado {
            self.verificar_empleado(id_empleado).await?;
        }

        let mut activo: horario::ActiveModel = horario.into();
        if let Some(fecha) = request.fecha {
            activo.fecha = Set(fecha);
        }
        activo.hora_entrada = Set(hora_entrada);
        activo.hora_salida = Set(hora_salida);
        if let Some(observaciones) = request.observaciones {
            activo.observaciones = Set(Some(observaciones));
        }
        if let Some(id_empleado) = request.id_empleado {
            activo.id_empleado = Set(id_empleado);
        }

        let model = activo.update(db).await.map_err(|e| {
            error!(error = %e, horario_id = id, "Failed to update horario");
            ServiceError::DatabaseError(e)
        })?;

        info!(horario_id = id, "Jornada actualizada");

        if let Err(e) = self.event_sender.send(Event::HorarioActualizado(id)).await {
            warn!(error = %e, horario_id = id, "Failed to send horario updated event");
        }

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let horario = self.get_horario(id).await?;

        HorarioEntity::delete_by_id(id).exec(db).await.map_err(|e| {
            error!(error = %e, horario_id = id, "Failed to delete horario");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            horario_id = id,
            empleado_id = horario.id_empleado,
            "Jornada eliminada"
        );

        if let Err(e) = self.event_sender.send(Event::HorarioEliminado(id)).await {
            warn!(error = %e, horario_id = id, "Failed to send horario deleted event");
        }

        Ok(())
    }

    async fn get_horario(&self, id: i64) -> Result<horario::Model, ServiceError> {
        let db = &*self.db_pool;

        HorarioEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, horario_id = id, "Failed to fetch horario");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Horario con ID {} no encontrado", id)))
    }

    async fn verificar_empleado(&self, id_empleado: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existe = EmpleadoEntity::find_by_id(id_empleado)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, empleado_id = id_empleado, "Failed to fetch empleado");
                ServiceError::DatabaseError(e)
            })?;

        if existe.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "El empleado con ID {} no existe",
                id_empleado
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rango_horario_acepta_jornada_completa() {
        assert!(validar_rango_horario(dec!(0), dec!(24)).is_ok());
        assert!(validar_rango_horario(dec!(8), dec!(16.50)).is_ok());
    }

    #[test]
    fn rango_horario_rechaza_valores_fuera_del_dia() {
        assert!(validar_rango_horario(dec!(-1), dec!(8)).is_err());
        assert!(validar_rango_horario(dec!(8), dec!(24.50)).is_err());
    }

    #[test]
    fn rango_horario_exige_salida_posterior() {
        assert!(validar_rango_horario(dec!(8), dec!(8)).is_err());
        assert!(validar_rango_horario(dec!(17), dec!(9)).is_err());
    }
}
