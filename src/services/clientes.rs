use crate::{
    db::DbPool,
    entities::{
        cliente::{self, Entity as ClienteEntity, TipoCliente},
        factura,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use super::validacion;

/// Datos para registrar un cliente nuevo.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearClienteRequest {
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
    #[validate(length(max = 20, message = "La cedula admite hasta 20 caracteres"))]
    pub cedula: Option<String>,
    pub tipo_cliente: Option<TipoCliente>,
    pub limite_credito: Option<Decimal>,
}

/// Cambios sobre un cliente existente; solo los campos presentes se aplican.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarClienteRequest {
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
    #[validate(length(max = 20, message = "La cedula admite hasta 20 caracteres"))]
    pub cedula: Option<String>,
    pub tipo_cliente: Option<TipoCliente>,
    pub limite_credito: Option<Decimal>,
}

/// Conteos agregados del padron de clientes.
#[derive(Debug, Serialize, ToSchema)]
pub struct EstadisticasClientes {
    pub total: u64,
    pub activos: u64,
    pub inactivos: u64,
    pub regulares: u64,
    pub mayoristas: u64,
    pub vip: u64,
}

/// Servicio de clientes: padron, busquedas y reglas de unicidad.
#[derive(Clone)]
pub struct ClienteService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ClienteService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lista paginada, los registrados mas recientemente primero.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<cliente::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = ClienteEntity::find()
            .order_by_desc(cliente::Column::FechaRegistro)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count clientes");
            ServiceError::DatabaseError(e)
        })?;

        let clientes = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch clientes page");
                ServiceError::DatabaseError(e)
            })?;

        Ok((clientes, total))
    }

    /// Solo clientes activos, en orden alfabetico.
    #[instrument(skip(self))]
    pub async fn list_activos(&self) -> Result<Vec<cliente::Model>, ServiceError> {
        let db = &*self.db_pool;

        ClienteEntity::find()
            .filter(cliente::Column::Activo.eq(true))
            .order_by_asc(cliente::Column::Apellidos)
            .order_by_asc(cliente::Column::Nombre)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch active clientes");
                ServiceError::DatabaseError(e)
            })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<cliente::Model, ServiceError> {
        let db = &*self.db_pool;

        ClienteEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, cliente_id = id, "Failed to fetch cliente");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Cliente con ID {} no encontrado", id)))
    }

    /// Busqueda por nombre o apellidos, sin distinguir mayusculas.
    #[instrument(skip(self))]
    pub async fn buscar(&self, termino: &str) -> Result<Vec<cliente::Model>, ServiceError> {
        let db = &*self.db_pool;
        let patron = format!("%{}%", termino.to_lowercase());

        ClienteEntity::find()
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            cliente::Entity,
                            cliente::Column::Nombre,
                        ))))
                        .like(patron.as_str()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            cliente::Entity,
                            cliente::Column::Apellidos,
                        ))))
                        .like(patron.as_str()),
                    ),
            )
            .order_by_asc(cliente::Column::Apellidos)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, termino, "Failed to search clientes");
                ServiceError::DatabaseError(e)
            })
    }

    #[instrument(skip(self))]
    pub async fn por_tipo(&self, tipo: TipoCliente) -> Result<Vec<cliente::Model>, ServiceError> {
        let db = &*self.db_pool;

        ClienteEntity::find()
            .filter(cliente::Column::TipoCliente.eq(tipo))
            .order_by_asc(cliente::Column::Apellidos)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, ?tipo, "Failed to fetch clientes by tipo");
                ServiceError::DatabaseError(e)
            })
    }

    /// true cuando ningun otro cliente usa ese email.
    #[instrument(skip(self))]
    pub async fn email_disponible(
        &self,
        email: &str,
        excluir_id: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut query = ClienteEntity::find().filter(cliente::Column::Email.eq(email));
        if let Some(excluir) = excluir_id {
            query = query.filter(cliente::Column::IdCliente.ne(excluir));
        }

        let ocupados = query.count(db).await.map_err(|e| {
            error!(error = %e, email, "Failed to check email availability");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ocupados == 0)
    }

    /// true cuando ningun otro cliente usa esa cedula.
    #[instrument(skip(self))]
    pub async fn cedula_disponible(
        &self,
        cedula: &str,
        excluir_id: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut query = ClienteEntity::find().filter(cliente::Column::Cedula.eq(cedula));
        if let Some(excluir) = excluir_id {
            query = query.filter(cliente::Column::IdCliente.ne(excluir));
        }

        let ocupados = query.count(db).await.map_err(|e| {
            error!(error = %e, cedula, "Failed to check cedula availability");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ocupados == 0)
    }

    /// Registra un cliente con los valores por defecto del padron.
    #[instrument(skip(self, request), fields(nombre = %request.nombre))]
    pub async fn crear(
        &self,
        request: CrearClienteRequest,
    ) -> Result<cliente::Model, ServiceError> {
        request.validate()?;

        if !validacion::telefono_valido(&request.telefono) {
            return Err(ServiceError::ValidationError(
                "El telefono solo admite digitos y guiones".to_string(),
            ));
        }
        if let Some(limite) = request.limite_credito {
            if limite < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El limite de credito no puede ser negativo".to_string(),
                ));
            }
        }

        if let Some(email) = &request.email {
            if !self.email_disponible(email, None).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un cliente con el email {}",
                    email
                )));
            }
        }
        if let Some(cedula) = &request.cedula {
            if !self.cedula_disponible(cedula, None).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un cliente con la cedula {}",
                    cedula
                )));
            }
        }

        let db = &*self.db_pool;
        let ahora = Utc::now().naive_utc();

        let cliente = cliente::ActiveModel {
            nombre: Set(request.nombre),
            apellidos: Set(request.apellidos),
            direccion: Set(request.direccion),
            telefono: Set(request.telefono),
            email: Set(request.email),
            cedula: Set(request.cedula),
            tipo_cliente: Set(request.tipo_cliente.unwrap_or(TipoCliente::Regular)),
            limite_credito: Set(request.limite_credito.unwrap_or(Decimal::ZERO)),
            activo: Set(true),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        };

        let model = cliente.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to insert cliente");
            ServiceError::DatabaseError(e)
        })?;

        info!(cliente_id = model.id_cliente, "Cliente registrado");

        if let Err(e) = self
            .event_sender
            .send(Event::ClienteCreado(model.id_cliente))
            .await
        {
            warn!(error = %e, cliente_id = model.id_cliente, "Failed to send cliente created event");
        }

        Ok(model)
    }

    /// Aplica los campos presentes; la unicidad excluye al propio cliente.
    #[instrument(skip(self, request), fields(cliente_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarClienteRequest,
    ) -> Result<cliente::Model, ServiceError> {
        request.validate()?;

        if let Some(telefono) = &request.telefono {
            if !validacion::telefono_valido(telefono) {
                return Err(ServiceError::ValidationError(
                    "El telefono solo admite digitos y guiones".to_string(),
                ));
            }
        }
        if let Some(limite) = request.limite_credito {
            if limite < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El limite de credito no puede ser negativo".to_string(),
                ));
            }
        }

        let actual = self.get(id).await?;

        if let Some(email) = &request.email {
            if !self.email_disponible(email, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un cliente con el email {}",
                    email
                )));
            }
        }
        if let Some(cedula) = &request.cedula {
            if !self.cedula_disponible(cedula, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un cliente con la cedula {}",
                    cedula
                )));
            }
        }

        let db = &*self.db_pool;
        let mut cliente: cliente::ActiveModel = actual.into();

        if let Some(nombre) = request.nombre {
            cliente.nombre = Set(nombre);
        }
        if let Some(apellidos) = request.apellidos {
            cliente.apellidos = Set(apellidos);
        }
        if let Some(direccion) = request.direccion {
            cliente.direccion = Set(direccion);
        }
        if let Some(telefono) = request.telefono {
            cliente.telefono = Set(telefono);
        }
        if let Some(email) = request.email {
            cliente.email = Set(Some(email));
        }
        if let Some(cedula) = request.cedula {
            cliente.cedula = Set(Some(cedula));
        }
        if let Some(tipo) = request.tipo_cliente {
            cliente.tipo_cliente = Set(tipo);
        }
        if let Some(limite) = request.limite_credito {
            cliente.limite_credito = Set(limite);
        }
        cliente.fecha_modificacion = Set(Utc::now().naive_utc());

        let model = cliente.update(db).await.map_err(|e| {
            error!(error = %e, cliente_id = id, "Failed to update cliente");
            ServiceError::DatabaseError(e)
        })?;

        info!(cliente_id = id, "Cliente actualizado");

        if let Err(e) = self.event_sender.send(Event::ClienteActualizado(id)).await {
            warn!(error = %e, cliente_id = id, "Failed to send cliente updated event");
        }

        Ok(model)
    }

    /// Activa o desactiva el cliente sin tocar el resto de sus datos.
    #[instrument(skip(self))]
    pub async fn cambiar_estado(
        &self,
        id: i64,
        activo: bool,
    ) -> Result<cliente::Model, ServiceError> {
        let actual = self.get(id).await?;
        let db = &*self.db_pool;

        let mut cliente: cliente::ActiveModel = actual.into();
        cliente.activo = Set(activo);
        cliente.fecha_modificacion = Set(Utc::now().naive_utc());

        let model = cliente.update(db).await.map_err(|e| {
            error!(error = %e, cliente_id = id, "Failed to update cliente estado");
            ServiceError::DatabaseError(e)
        })?;

        info!(cliente_id = id, activo, "Estado del cliente cambiado");

        if let Err(e) = self
            .event_sender
            .send(Event::ClienteEstadoCambiado {
                cliente_id: id,
                activo,
            })
            .await
        {
            warn!(error = %e, cliente_id = id, "Failed to send cliente estado event");
        }

        Ok(model)
    }

    /// Borrado fisico; se rechaza mientras existan facturas del cliente.
    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get(id).await?;

        let facturas = factura::Entity::find()
            .filter(factura::Column::IdCliente.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, cliente_id = id, "Failed to count facturas for cliente");
                ServiceError::DatabaseError(e)
            })?;

        if facturas > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el cliente: tiene {} facturas asociadas",
                facturas
            )));
        }

        ClienteEntity::delete_by_id(id).exec(db).await.map_err(|e| {
            error!(error = %e, cliente_id = id, "Failed to delete cliente");
            ServiceError::DatabaseError(e)
        })?;

        info!(cliente_id = id, "Cliente eliminado");

        if let Err(e) = self.event_sender.send(Event::ClienteEliminado(id)).await {
            warn!(error = %e, cliente_id = id, "Failed to send cliente deleted event");
        }

        Ok(())
    }

    /// Conteos del padron; los totales por tipo consideran solo activos.
    #[instrument(skip(self))]
    pub async fn estadisticas(&self) -> Result<EstadisticasClientes, ServiceError> {
        let db = &*self.db_pool;

        let total = ClienteEntity::find().count(db).await.map_err(|e| {
            error!(error = %e, "Failed to count clientes");
            ServiceError::DatabaseError(e)
        })?;

        let activos = ClienteEntity::find()
            .filter(cliente::Column::Activo.eq(true))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count active clientes");
                ServiceError::DatabaseError(e)
            })?;

        let por_tipo = |tipo: TipoCliente| {
            ClienteEntity::find()
                .filter(cliente::Column::Activo.eq(true))
                .filter(cliente::Column::TipoCliente.eq(tipo))
                .count(db)
        };

        let regulares = por_tipo(TipoCliente::Regular)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let mayoristas = por_tipo(TipoCliente::Mayorista)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let vip = por_tipo(TipoCliente::Vip)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(EstadisticasClientes {
            total,
            activos,
            inactivos: total - activos,
            regulares,
            mayoristas,
            vip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CrearClienteRequest {
        CrearClienteRequest {
            nombre: "Maria".into(),
            apellidos: "Paredes".into(),
            direccion: "Av. Quitumbe y Condor Nan".into(),
            telefono: "02-234-5678".into(),
            email: Some("maria.paredes@example.com".into()),
            cedula: Some("1712345678".into()),
            tipo_cliente: None,
            limite_credito: None,
        }
    }

    #[test]
    fn crear_request_valido_pasa_validacion() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn crear_request_sin_nombre_falla() {
        let mut request = base_request();
        request.nombre = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn crear_request_con_email_invalido_falla() {
        let mut request = base_request();
        request.email = Some("no-es-un-email".into());
        assert!(request.validate().is_err());
    }

    #[test]
    fn telefono_con_letras_no_es_valido() {
        assert!(!validacion::telefono_valido("02-ABC-5678"));
        assert!(validacion::telefono_valido("0998765432"));
    }
}
