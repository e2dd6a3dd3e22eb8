use crate::{
    db::DbPool,
    entities::{
        cliente::{self, Entity as ClienteEntity},
        detalle_factura::{self, Entity as DetalleFacturaEntity},
        factura::{self, Entity as FacturaEntity, EstadoFactura, MetodoPago},
        producto::{self, Entity as ProductoEntity},
        stock::{self, Entity as StockEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

const UBICACION_DEFAULT: &str = "ALMACEN PRINCIPAL";

/// Linea del cuerpo de factura. Las lineas sin producto se descartan, igual
/// que las filas vacias que el punto de venta manda al guardar.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineaFacturaRequest {
    pub id_producto: Option<i64>,
    pub cantidad: i32,
    /// Si no viene, se toma el precio vigente del producto.
    pub precio_uni: Option<Decimal>,
    pub descuento_item: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearFacturaRequest {
    #[validate(length(min = 1, max = 20, message = "El numero de factura es obligatorio"))]
    pub numero_factura: String,
    pub fecha: Option<NaiveDate>,
    pub id_cliente: i64,
    pub id_usuario: Option<i64>,
    pub metodo_pago: Option<MetodoPago>,
    pub estado: Option<EstadoFactura>,
    pub descuento: Option<Decimal>,
    #[validate(length(max = 300, message = "Las observaciones admiten hasta 300 caracteres"))]
    pub observaciones: Option<String>,
    pub detalles: Vec<LineaFacturaRequest>,
}

/// Modificacion de una factura pendiente. Si `detalles` viene, el detalle
/// completo se reemplaza devolviendo primero el stock de las lineas viejas.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarFacturaRequest {
    #[validate(length(min = 1, max = 20, message = "El numero de factura no puede quedar vacio"))]
    pub numero_factura: Option<String>,
    pub fecha: Option<NaiveDate>,
    pub id_cliente: Option<i64>,
    pub metodo_pago: Option<MetodoPago>,
    pub estado: Option<EstadoFactura>,
    pub descuento: Option<Decimal>,
    #[validate(length(max = 300, message = "Las observaciones admiten hasta 300 caracteres"))]
    pub observaciones: Option<String>,
    pub detalles: Option<Vec<LineaFacturaRequest>>,
}

#[derive(Debug, Clone)]
pub struct FacturaConCliente {
    pub factura: factura::Model,
    pub cliente: Option<cliente::Model>,
}

#[derive(Debug, Clone)]
pub struct DetalleConProducto {
    pub detalle: detalle_factura::Model,
    pub producto: Option<producto::Model>,
}

#[derive(Debug, Clone)]
pub struct FacturaCompleta {
    pub factura: factura::Model,
    pub cliente: Option<cliente::Model>,
    pub detalles: Vec<DetalleConProducto>,
}

/// Linea ya validada contra catalogo y stock, lista para insertarse.
struct LineaPreparada {
    producto: producto::Model,
    cantidad: i32,
    precio_uni: Decimal,
    descuento_item: Decimal,
    stock_antes: i32,
}

impl LineaPreparada {
    fn subtotal(&self) -> Decimal {
        Decimal::from(self.cantidad) * self.precio_uni - self.descuento_item
    }
}

/// Lineas que traen producto; el resto eran filas vacias del formulario.
fn lineas_con_producto(
    detalles: &[LineaFacturaRequest],
) -> Vec<(i64, &LineaFacturaRequest)> {
    detalles
        .iter()
        .filter_map(|linea| linea.id_producto.map(|id| (id, linea)))
        .collect()
}

/// Aplica el descuento global y el IVA sobre la suma de las lineas.
/// Devuelve (subtotal, impuesto, total) redondeados a 2 decimales.
fn calcular_totales(
    subtotal_lineas: Decimal,
    descuento: Decimal,
    tasa_impuesto: Decimal,
) -> (Decimal, Decimal, Decimal) {
    let subtotal = (subtotal_lineas - descuento).round_dp(2);
    let impuesto = (subtotal * tasa_impuesto).round_dp(2);
    let total = subtotal + impuesto;
    (subtotal, impuesto, total)
}

/// Emision y ciclo de vida de facturas de venta. Cada emision descuenta
/// stock en la misma transaccion que inserta la factura: si una linea no
/// alcanza existencia, nada se guarda y nada se descuenta.
#[derive(Clone)]
pub struct FacturaService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tasa_impuesto: Decimal,
}

impl FacturaService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, tasa_impuesto: Decimal) -> Self {
        Self {
            db_pool,
            event_sender,
            tasa_impuesto,
        }
    }

    /// Lista paginada, facturas mas recientes primero.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<FacturaConCliente>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = FacturaEntity::find()
            .order_by_desc(factura::Column::Fecha)
            .order_by_desc(factura::Column::IdFactura)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count facturas");
            ServiceError::DatabaseError(e)
        })?;

        let facturas = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch facturas page");
                ServiceError::DatabaseError(e)
            })?;

        let cliente_ids: Vec<i64> = facturas.iter().map(|f| f.id_cliente).collect();
        let clientes: HashMap<i64, cliente::Model> = ClienteEntity::find()
            .filter(cliente::Column::IdCliente.is_in(cliente_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch clientes for facturas page");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|c| (c.id_cliente, c))
            .collect();

        let resultado = facturas
            .into_iter()
            .map(|f| {
                let cliente = clientes.get(&f.id_cliente).cloned();
                FacturaConCliente {
                    factura: f,
                    cliente,
                }
            })
            .collect();

        Ok((resultado, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<FacturaCompleta, ServiceError> {
        let db = &*self.db_pool;
        let factura = self.get_factura(id).await?;

        let cliente = factura
            .find_related(cliente::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, factura_id = id, "Failed to fetch cliente for factura");
                ServiceError::DatabaseError(e)
            })?;

        let detalles = self.cargar_detalles(&factura).await?;

        Ok(FacturaCompleta {
            factura,
            cliente,
            detalles,
        })
    }

    /// Lineas de una factura con su producto.
    #[instrument(skip(self))]
    pub async fn detalles(&self, id: i64) -> Result<Vec<DetalleConProducto>, ServiceError> {
        let factura = self.get_factura(id).await?;
        self.cargar_detalles(&factura).await
    }

    /// Emite una factura: valida cliente y lineas, descuenta stock y guarda
    /// cabecera y detalle en una sola transaccion.
    #[instrument(skip(self, request), fields(numero_factura = %request.numero_factura))]
    pub async fn crear(&self, request: CrearFacturaRequest) -> Result<FacturaCompleta, ServiceError> {
        request.validate()?;

        let descuento = request.descuento.unwrap_or(Decimal::ZERO);
        if descuento < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "El descuento no puede ser negativo".to_string(),
            ));
        }
        if matches!(request.estado, Some(EstadoFactura::Anulada)) {
            return Err(ServiceError::InvalidOperation(
                "Una factura no puede emitirse anulada".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let duplicadas = FacturaEntity::find()
            .filter(factura::Column::NumeroFactura.eq(request.numero_factura.as_str()))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check numero_factura uniqueness");
                ServiceError::DatabaseError(e)
            })?;
        if duplicadas > 0 {
            return Err(ServiceError::Conflict(format!(
                "Ya existe una factura con el numero {}",
                request.numero_factura
            )));
        }

        let cliente = ClienteEntity::find_by_id(request.id_cliente)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, cliente_id = request.id_cliente, "Failed to fetch cliente");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "El cliente con ID {} no existe",
                    request.id_cliente
                ))
            })?;

        let lineas = lineas_con_producto(&request.detalles);
        if lineas.is_empty() {
            return Err(ServiceError::ValidationError(
                "La factura debe incluir al menos una linea con producto".to_string(),
            ));
        }

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction for factura");
            ServiceError::DatabaseError(e)
        })?;

        let preparadas = self.preparar_lineas(&txn, &lineas).await?;
        let subtotal_lineas: Decimal = preparadas.iter().map(LineaPreparada::subtotal).sum();
        let (subtotal, impuesto, total) =
            calcular_totales(subtotal_lineas, descuento, self.tasa_impuesto);

        let ahora = Utc::now().naive_utc();
        let nueva = factura::ActiveModel {
            numero_factura: Set(request.numero_factura.clone()),
            fecha: Set(request.fecha.unwrap_or_else(|| Utc::now().date_naive())),
            subtotal: Set(subtotal),
            impuesto: Set(impuesto),
            descuento: Set(descuento),
            total: Set(total),
            estado: Set(request.estado.unwrap_or(EstadoFactura::Pendiente)),
            metodo_pago: Set(request.metodo_pago.unwrap_or(MetodoPago::Efectivo)),
            observaciones: Set(request.observaciones),
            id_cliente: Set(request.id_cliente),
            id_usuario: Set(request.id_usuario),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        };

        let factura_creada = nueva.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to insert factura");
            ServiceError::DatabaseError(e)
        })?;

        for linea in &preparadas {
            let detalle = detalle_factura::ActiveModel {
                id_factura: Set(factura_creada.id_factura),
                id_producto: Set(linea.producto.id_producto),
                cantidad: Set(linea.cantidad),
                precio_uni: Set(linea.precio_uni),
                descuento_item: Set(linea.descuento_item),
                ..Default::default()
            };
            detalle.insert(&txn).await.map_err(|e| {
                error!(error = %e, factura_id = factura_creada.id_factura, "Failed to insert detalle");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit factura");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            factura_id = factura_creada.id_factura,
            numero_factura = %factura_creada.numero_factura,
            total = %factura_creada.total,
            lineas = preparadas.len(),
            "Factura emitida"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::FacturaCreada {
                factura_id: factura_creada.id_factura,
                numero_factura: factura_creada.numero_factura.clone(),
                total: factura_creada.total,
            })
            .await
        {
            warn!(error = %e, factura_id = factura_creada.id_factura, "Failed to send factura created event");
        }
        self.notificar_bajos_minimos(&preparadas).await;

        let detalles = self.cargar_detalles(&factura_creada).await?;
        Ok(FacturaCompleta {
            factura: factura_creada,
            cliente: Some(cliente),
            detalles,
        })
    }

    /// Modifica una factura pendiente. Con `detalles` presente devuelve el
    /// stock de las lineas anteriores, las borra y procesa las nuevas con la
    /// misma validacion de existencias que la emision.
    #[instrument(skip(self, request), fields(factura_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarFacturaRequest,
    ) -> Result<FacturaCompleta, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let factura = self.get_factura(id).await?;

        if !factura.puede_ser_editada() {
            return Err(ServiceError::Conflict(format!(
                "Solo se pueden modificar facturas en estado PENDIENTE (estado actual: {:?})",
                factura.estado
            )));
        }
        if matches!(request.estado, Some(EstadoFactura::Anulada)) {
            return Err(ServiceError::InvalidOperation(
                "Para anular la factura use la operacion de anulacion".to_string(),
            ));
        }

        if let Some(numero) = &request.numero_factura {
            let duplicadas = FacturaEntity::find()
                .filter(factura::Column::NumeroFactura.eq(numero.as_str()))
                .filter(factura::Column::IdFactura.ne(id))
                .count(db)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to check numero_factura uniqueness");
                    ServiceError::DatabaseError(e)
                })?;
            if duplicadas > 0 {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe una factura con el numero {}",
                    numero
                )));
            }
        }

        if let Some(id_cliente) = request.id_cliente {
            let existe = ClienteEntity::find_by_id(id_cliente)
                .one(db)
                .await
                .map_err(|e| {
                    error!(error = %e, cliente_id = id_cliente, "Failed to fetch cliente");
                    ServiceError::DatabaseError(e)
                })?;
            if existe.is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "El cliente con ID {} no existe",
                    id_cliente
                )));
            }
        }

        let descuento = request.descuento.unwrap_or(factura.descuento);
        if descuento < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "El descuento no puede ser negativo".to_string(),
            ));
        }

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction for factura update");
            ServiceError::DatabaseError(e)
        })?;

        let (subtotal_lineas, preparadas) = match &request.detalles {
            Some(detalles) => {
                let lineas = lineas_con_producto(detalles);
                if lineas.is_empty() {
                    return Err(ServiceError::ValidationError(
                        "La factura debe incluir al menos una linea con producto".to_string(),
                    ));
                }

                // Primero se devuelve el stock del detalle anterior, para que
                // una factura que solo cambia cantidades valide contra la
                // existencia real.
                let anteriores = factura
                    .find_related(detalle_factura::Entity)
                    .all(&txn)
                    .await
                    .map_err(|e| {
                        error!(error = %e, factura_id = id, "Failed to fetch detalles");
                        ServiceError::DatabaseError(e)
                    })?;
                for detalle in &anteriores {
                    self.reponer_stock(&txn, detalle.id_producto, detalle.cantidad)
                        .await?;
                }
                DetalleFacturaEntity::delete_many()
                    .filter(detalle_factura::Column::IdFactura.eq(id))
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        error!(error = %e, factura_id = id, "Failed to delete detalles");
                        ServiceError::DatabaseError(e)
                    })?;

                let preparadas = self.preparar_lineas(&txn, &lineas).await?;
                let subtotal: Decimal = preparadas.iter().map(LineaPreparada::subtotal).sum();

                for linea in &preparadas {
                    let detalle = detalle_factura::ActiveModel {
                        id_factura: Set(id),
                        id_producto: Set(linea.producto.id_producto),
                        cantidad: Set(linea.cantidad),
                        precio_uni: Set(linea.precio_uni),
                        descuento_item: Set(linea.descuento_item),
                        ..Default::default()
                    };
                    detalle.insert(&txn).await.map_err(|e| {
                        error!(error = %e, factura_id = id, "Failed to insert detalle");
                        ServiceError::DatabaseError(e)
                    })?;
                }

                (subtotal, preparadas)
            }
            None => {
                let existentes = factura
                    .find_related(detalle_factura::Entity)
                    .all(&txn)
                    .await
                    .map_err(|e| {
                        error!(error = %e, factura_id = id, "Failed to fetch detalles");
                        ServiceError::DatabaseError(e)
                    })?;
                let subtotal = existentes.iter().map(detalle_factura::Model::subtotal).sum();
                (subtotal, Vec::new())
            }
        };

        let (subtotal, impuesto, total) =
            calcular_totales(subtotal_lineas, descuento, self.tasa_impuesto);

        let mut activo: factura::ActiveModel = factura.into();
        if let Some(numero) = request.numero_factura {
            activo.numero_factura = Set(numero);
        }
        if let Some(fecha) = request.fecha {
            activo.fecha = Set(fecha);
        }
        if let Some(id_cliente) = request.id_cliente {
            activo.id_cliente = Set(id_cliente);
        }
        if let Some(metodo_pago) = request.metodo_pago {
            activo.metodo_pago = Set(metodo_pago);
        }
        if let Some(estado) = request.estado {
            activo.estado = Set(estado);
        }
        if let Some(observaciones) = request.observaciones {
            activo.observaciones = Set(Some(observaciones));
        }
        activo.descuento = Set(descuento);
        activo.subtotal = Set(subtotal);
        activo.impuesto = Set(impuesto);
        activo.total = Set(total);
        activo.fecha_modificacion = Set(Utc::now().naive_utc());

        let actualizada = activo.update(&txn).await.map_err(|e| {
            error!(error = %e, factura_id = id, "Failed to update factura");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit factura update");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            factura_id = id,
            total = %actualizada.total,
            "Factura actualizada"
        );

        if let Err(e) = self.event_sender.send(Event::FacturaActualizada(id)).await {
            warn!(error = %e, factura_id = id, "Failed to send factura updated event");
        }
        self.notificar_bajos_minimos(&preparadas).await;

        let cliente = actualizada
            .find_related(cliente::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, factura_id = id, "Failed to fetch cliente for factura");
                ServiceError::DatabaseError(e)
            })?;
        let detalles = self.cargar_detalles(&actualizada).await?;

        Ok(FacturaCompleta {
            factura: actualizada,
            cliente,
            detalles,
        })
    }

    /// Anula una factura pendiente devolviendo el stock de todas sus lineas.
    #[instrument(skip(self))]
    pub async fn anular(&self, id: i64) -> Result<factura::Model, ServiceError> {
        let db = &*self.db_pool;
        let factura = self.get_factura(id).await?;

        if !factura.puede_ser_anulada() {
            let mensaje = if factura.estado == EstadoFactura::Anulada {
                "La factura ya esta anulada".to_string()
            } else {
                "No se puede anular una factura pagada; emita una nota de credito".to_string()
            };
            return Err(ServiceError::Conflict(mensaje));
        }

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction for anulacion");
            ServiceError::DatabaseError(e)
        })?;

        let detalles = factura
            .find_related(detalle_factura::Entity)
            .all(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, factura_id = id, "Failed to fetch detalles");
                ServiceError::DatabaseError(e)
            })?;

        for detalle in &detalles {
            self.reponer_stock(&txn, detalle.id_producto, detalle.cantidad)
                .await?;
        }

        let numero_factura = factura.numero_factura.clone();
        let mut activo: factura::ActiveModel = factura.into();
        activo.estado = Set(EstadoFactura::Anulada);
        activo.fecha_modificacion = Set(Utc::now().naive_utc());

        let anulada = activo.update(&txn).await.map_err(|e| {
            error!(error = %e, factura_id = id, "Failed to mark factura anulada");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit anulacion");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            factura_id = id,
            numero_factura = %numero_factura,
            lineas_devueltas = detalles.len(),
            "Factura anulada"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::FacturaAnulada {
                factura_id: id,
                numero_factura,
            })
            .await
        {
            warn!(error = %e, factura_id = id, "Failed to send factura anulada event");
        }

        Ok(anulada)
    }

    async fn get_factura(&self, id: i64) -> Result<factura::Model, ServiceError> {
        let db = &*self.db_pool;

        FacturaEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, factura_id = id, "Failed to fetch factura");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Factura con ID {} no encontrada", id)))
    }

    async fn cargar_detalles(
        &self,
        factura: &factura::Model,
    ) -> Result<Vec<DetalleConProducto>, ServiceError> {
        let db = &*self.db_pool;

        let detalles = factura
            .find_related(detalle_factura::Entity)
            .order_by_asc(detalle_factura::Column::IdDetalleFactura)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, factura_id = factura.id_factura, "Failed to fetch detalles");
                ServiceError::DatabaseError(e)
            })?;

        let producto_ids: Vec<i64> = detalles.iter().map(|d| d.id_producto).collect();
        let productos: HashMap<i64, producto::Model> = ProductoEntity::find()
            .filter(producto::Column::IdProducto.is_in(producto_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch productos for detalles");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|p| (p.id_producto, p))
            .collect();

        Ok(detalles
            .into_iter()
            .map(|detalle| {
                let producto = productos.get(&detalle.id_producto).cloned();
                DetalleConProducto { detalle, producto }
            })
            .collect())
    }

    /// Valida cada linea contra el catalogo y descuenta su stock dentro de
    /// la transaccion. Un fallo en cualquier linea revierte todo.
    async fn preparar_lineas<C: ConnectionTrait>(
        &self,
        txn: &C,
        lineas: &[(i64, &LineaFacturaRequest)],
    ) -> Result<Vec<LineaPreparada>, ServiceError> {
        let mut preparadas = Vec::with_capacity(lineas.len());

        for (id_producto, linea) in lineas {
            let producto = ProductoEntity::find_by_id(*id_producto)
                .one(txn)
                .await
                .map_err(|e| {
                    error!(error = %e, producto_id = id_producto, "Failed to fetch producto");
                    ServiceError::DatabaseError(e)
                })?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "El producto con ID {} no existe",
                        id_producto
                    ))
                })?;

            if linea.cantidad <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "La cantidad del producto {} debe ser mayor a cero",
                    producto.nombre_producto
                )));
            }

            let precio_uni = linea.precio_uni.unwrap_or(producto.precio);
            if precio_uni < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El precio unitario no puede ser negativo".to_string(),
                ));
            }

            let descuento_item = linea.descuento_item.unwrap_or(Decimal::ZERO);
            if descuento_item < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El descuento de la linea no puede ser negativo".to_string(),
                ));
            }

            let fila = self.asegurar_fila_stock(txn, *id_producto).await?;
            self.descontar_stock(txn, *id_producto, linea.cantidad, fila.cantidad)
                .await?;

            preparadas.push(LineaPreparada {
                producto,
                cantidad: linea.cantidad,
                precio_uni,
                descuento_item,
                stock_antes: fila.cantidad,
            });
        }

        Ok(preparadas)
    }

    /// Fila de stock del producto; si no existe se crea en cero para que el
    /// descuento condicional tenga contra que validar.
    async fn asegurar_fila_stock<C: ConnectionTrait>(
        &self,
        txn: &C,
        id_producto: i64,
    ) -> Result<stock::Model, ServiceError> {
        let existente = StockEntity::find()
            .filter(stock::Column::IdProducto.eq(id_producto))
            .one(txn)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to fetch stock row");
                ServiceError::DatabaseError(e)
            })?;

        match existente {
            Some(fila) => Ok(fila),
            None => {
                let nueva = stock::ActiveModel {
                    id_producto: Set(id_producto),
                    cantidad: Set(0),
                    ubicacion: Set(UBICACION_DEFAULT.to_string()),
                    fecha_ultimo_movimiento: Set(Utc::now().naive_utc()),
                    ..Default::default()
                };
                nueva.insert(txn).await.map_err(|e| {
                    error!(error = %e, producto_id = id_producto, "Failed to create stock row");
                    ServiceError::DatabaseError(e)
                })
            }
        }
    }

    /// Decremento condicional: solo aplica si la existencia alcanza, de lo
    /// contrario ninguna fila cambia y se reporta el faltante.
    async fn descontar_stock<C: ConnectionTrait>(
        &self,
        txn: &C,
        id_producto: i64,
        cantidad: i32,
        disponible: i32,
    ) -> Result<(), ServiceError> {
        let resultado = StockEntity::update_many()
            .col_expr(
                stock::Column::Cantidad,
                Expr::col(stock::Column::Cantidad).sub(cantidad),
            )
            .col_expr(
                stock::Column::FechaUltimoMovimiento,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(stock::Column::IdProducto.eq(id_producto))
            .filter(stock::Column::Cantidad.gte(cantidad))
            .exec(txn)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to discount stock");
                ServiceError::DatabaseError(e)
            })?;

        if resultado.rows_affected == 0 {
            return Err(ServiceError::InsufficientStock {
                disponible,
                requerido: cantidad,
            });
        }

        Ok(())
    }

    async fn reponer_stock<C: ConnectionTrait>(
        &self,
        txn: &C,
        id_producto: i64,
        cantidad: i32,
    ) -> Result<(), ServiceError> {
        self.asegurar_fila_stock(txn, id_producto).await?;

        StockEntity::update_many()
            .col_expr(
                stock::Column::Cantidad,
                Expr::col(stock::Column::Cantidad).add(cantidad),
            )
            .col_expr(
                stock::Column::FechaUltimoMovimiento,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(stock::Column::IdProducto.eq(id_producto))
            .exec(txn)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to restore stock");
                ServiceError::DatabaseError(e)
            })?;

        Ok(())
    }

    /// Aviso de bajo minimo para las lineas que dejaron al producto en o
    /// bajo su umbral. Se envia despues del commit.
    async fn notificar_bajos_minimos(&self, lineas: &[LineaPreparada]) {
        for linea in lineas {
            let restante = linea.stock_antes - linea.cantidad;
            if restante <= linea.producto.stock_minimo {
                if let Err(e) = self
                    .event_sender
                    .send(Event::StockBajoMinimo {
                        producto_id: linea.producto.id_producto,
                        cantidad_actual: restante,
                        stock_minimo: linea.producto.stock_minimo,
                    })
                    .await
                {
                    warn!(
                        error = %e,
                        producto_id = linea.producto.id_producto,
                        "Failed to send stock bajo minimo event"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totales_aplican_descuento_e_impuesto() {
        let (subtotal, impuesto, total) = calcular_totales(dec!(100.00), dec!(10.00), dec!(0.15));
        assert_eq!(subtotal, dec!(90.00));
        assert_eq!(impuesto, dec!(13.50));
        assert_eq!(total, dec!(103.50));
    }

    #[test]
    fn totales_sin_descuento() {
        let (subtotal, impuesto, total) = calcular_totales(dec!(59.97), Decimal::ZERO, dec!(0.15));
        assert_eq!(subtotal, dec!(59.97));
        assert_eq!(impuesto, dec!(9.00));
        assert_eq!(total, dec!(68.97));
    }

    #[test]
    fn lineas_sin_producto_se_descartan() {
        let detalles = vec![
            LineaFacturaRequest {
                id_producto: Some(1),
                cantidad: 2,
                precio_uni: None,
                descuento_item: None,
            },
            LineaFacturaRequest {
                id_producto: None,
                cantidad: 5,
                precio_uni: Some(dec!(9.99)),
                descuento_item: None,
            },
            LineaFacturaRequest {
                id_producto: Some(3),
                cantidad: 1,
                precio_uni: None,
                descuento_item: Some(dec!(0.50)),
            },
        ];

        let lineas = lineas_con_producto(&detalles);
        assert_eq!(lineas.len(), 2);
        assert_eq!(lineas[0].0, 1);
        assert_eq!(lineas[1].0, 3);
    }

    #[test]
    fn numero_factura_vacio_no_pasa_validacion() {
        let request = CrearFacturaRequest {
            numero_factura: String::new(),
            fecha: None,
            id_cliente: 1,
            id_usuario: None,
            metodo_pago: None,
            estado: None,
            descuento: None,
            observaciones: None,
            detalles: vec![],
        };
        assert!(request.validate().is_err());
    }
}
