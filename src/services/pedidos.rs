use crate::{
    db::DbPool,
    entities::{
        detalle_pedido::{self, Entity as DetallePedidoEntity},
        pedido::{self, Entity as PedidoEntity, EstadoPedido},
        producto::{self, Entity as ProductoEntity},
        proveedor::{self, Entity as ProveedorEntity},
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

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineaPedidoRequest {
    pub id_producto: i64,
    pub cantidad: i32,
    /// Si no viene, se toma el precio vigente del producto.
    pub precio_uni: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearPedidoRequest {
    #[validate(length(min = 1, max = 20, message = "El numero de pedido es obligatorio"))]
    pub numero_pedido: String,
    pub fecha: Option<NaiveDate>,
    pub id_proveedor: i64,
    pub id_usuario: Option<i64>,
    pub estado: Option<EstadoPedido>,
    pub fecha_entrega_esperada: Option<NaiveDate>,
    #[validate(length(max = 200, message = "La descripcion admite hasta 200 caracteres"))]
    pub descripcion: Option<String>,
    #[validate(length(max = 300, message = "Las observaciones admiten hasta 300 caracteres"))]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub detalles: Vec<LineaPedidoRequest>,
}

#[derive(Debug, Clone)]
pub struct PedidoConProveedor {
    pub pedido: pedido::Model,
    pub proveedor: Option<proveedor::Model>,
}

#[derive(Debug, Clone)]
pub struct DetallePedidoConProducto {
    pub detalle: detalle_pedido::Model,
    pub producto: Option<producto::Model>,
}

#[derive(Debug, Clone)]
pub struct PedidoCompleto {
    pub pedido: pedido::Model,
    pub proveedor: Option<proveedor::Model>,
    pub detalles: Vec<DetallePedidoConProducto>,
}

/// Une las lineas repetidas de un mismo producto sumando cantidades; el
/// primer precio explicito se conserva. Cada producto termina en una sola
/// linea, que es lo que la tabla de detalle exige.
fn agrupar_lineas(detalles: &[LineaPedidoRequest]) -> Vec<LineaPedidoRequest> {
    let mut agrupadas: Vec<LineaPedidoRequest> = Vec::new();
    let mut posiciones: HashMap<i64, usize> = HashMap::new();

    for linea in detalles {
        match posiciones.get(&linea.id_producto) {
            Some(&i) => {
                agrupadas[i].cantidad += linea.cantidad;
                if agrupadas[i].precio_uni.is_none() {
                    agrupadas[i].precio_uni = linea.precio_uni;
                }
            }
            None => {
                posiciones.insert(linea.id_producto, agrupadas.len());
                agrupadas.push(linea.clone());
            }
        }
    }

    agrupadas
}

/// Ordenes de compra a proveedores. El estado solo avanza segun el ciclo
/// PENDIENTE -> APROBADO -> ENVIADO -> RECIBIDO; recibir un pedido ingresa
/// toda su mercaderia al stock en una sola transaccion.
#[derive(Clone)]
pub struct PedidoService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PedidoService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lista paginada, pedidos mas recientes primero.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<PedidoConProveedor>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = PedidoEntity::find()
            .order_by_desc(pedido::Column::Fecha)
            .order_by_desc(pedido::Column::IdPedido)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count pedidos");
            ServiceError::DatabaseError(e)
        })?;

        let pedidos = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch pedidos page");
                ServiceError::DatabaseError(e)
            })?;

        let proveedor_ids: Vec<i64> = pedidos.iter().map(|p| p.id_proveedor).collect();
        let proveedores: HashMap<i64, proveedor::Model> = ProveedorEntity::find()
            .filter(proveedor::Column::IdProveedor.is_in(proveedor_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch proveedores for pedidos page");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|p| (p.id_proveedor, p))
            .collect();

        let resultado = pedidos
            .into_iter()
            .map(|p| {
                let proveedor = proveedores.get(&p.id_proveedor).cloned();
                PedidoConProveedor {
                    pedido: p,
                    proveedor,
                }
            })
            .collect();

        Ok((resultado, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<PedidoCompleto, ServiceError> {
        let db = &*self.db_pool;
        let pedido = self.get_pedido(id).await?;

        let proveedor = pedido
            .find_related(proveedor::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, pedido_id = id, "Failed to fetch proveedor for pedido");
                ServiceError::DatabaseError(e)
            })?;

        let detalles = self.cargar_detalles(&pedido).await?;

        Ok(PedidoCompleto {
            pedido,
            proveedor,
            detalles,
        })
    }

    /// Lineas de un pedido con su producto.
    #[instrument(skip(self))]
    pub async fn detalles(&self, id: i64) -> Result<Vec<DetallePedidoConProducto>, ServiceError> {
        let pedido = self.get_pedido(id).await?;
        self.cargar_detalles(&pedido).await
    }

    /// Registra un pedido con su detalle. El stock no cambia hasta que el
    /// pedido se marque RECIBIDO.
    #[instrument(skip(self, request), fields(numero_pedido = %request.numero_pedido))]
    pub async fn crear(&self, request: CrearPedidoRequest) -> Result<PedidoCompleto, ServiceError> {
        request.validate()?;

        let estado = request.estado.unwrap_or(EstadoPedido::Pendiente);
        if !matches!(estado, EstadoPedido::Pendiente | EstadoPedido::Aprobado) {
            return Err(ServiceError::InvalidStatus(
                "Un pedido solo puede crearse en estado PENDIENTE o APROBADO".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let duplicados = PedidoEntity::find()
            .filter(pedido::Column::NumeroPedido.eq(request.numero_pedido.as_str()))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check numero_pedido uniqueness");
                ServiceError::DatabaseError(e)
            })?;
        if duplicados > 0 {
            return Err(ServiceError::Conflict(format!(
                "Ya existe un pedido con el numero {}",
                request.numero_pedido
            )));
        }

        let proveedor = ProveedorEntity::find_by_id(request.id_proveedor)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, proveedor_id = request.id_proveedor, "Failed to fetch proveedor");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "El proveedor con ID {} no existe",
                    request.id_proveedor
                ))
            })?;

        let lineas = agrupar_lineas(&request.detalles);
        let mut preparadas: Vec<(i64, i32, Decimal)> = Vec::with_capacity(lineas.len());
        let mut total = Decimal::ZERO;

        for linea in &lineas {
            let producto = ProductoEntity::find_by_id(linea.id_producto)
                .one(db)
                .await
                .map_err(|e| {
                    error!(error = %e, producto_id = linea.id_producto, "Failed to fetch producto");
                    ServiceError::DatabaseError(e)
                })?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "El producto con ID {} no existe",
                        linea.id_producto
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

            total += Decimal::from(linea.cantidad) * precio_uni;
            preparadas.push((linea.id_producto, linea.cantidad, precio_uni));
        }
        let total = total.round_dp(2);

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction for pedido");
            ServiceError::DatabaseError(e)
        })?;

        let ahora = Utc::now().naive_utc();
        let nuevo = pedido::ActiveModel {
            numero_pedido: Set(request.numero_pedido.clone()),
            fecha: Set(request.fecha.unwrap_or_else(|| Utc::now().date_naive())),
            total: Set(total),
            estado: Set(estado),
            descripcion: Set(request.descripcion),
            observaciones: Set(request.observaciones),
            fecha_entrega_esperada: Set(request.fecha_entrega_esperada),
            id_proveedor: Set(request.id_proveedor),
            id_usuario: Set(request.id_usuario),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        };

        let pedido_creado = nuevo.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to insert pedido");
            ServiceError::DatabaseError(e)
        })?;

        for (id_producto, cantidad, precio_uni) in &preparadas {
            let detalle = detalle_pedido::ActiveModel {
                id_pedido: Set(pedido_creado.id_pedido),
                id_producto: Set(*id_producto),
                cantidad: Set(*cantidad),
                precio_uni: Set(*precio_uni),
                ..Default::default()
            };
            detalle.insert(&txn).await.map_err(|e| {
                error!(error = %e, pedido_id = pedido_creado.id_pedido, "Failed to insert detalle");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit pedido");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            pedido_id = pedido_creado.id_pedido,
            numero_pedido = %pedido_creado.numero_pedido,
            total = %pedido_creado.total,
            lineas = preparadas.len(),
            "Pedido registrado"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::PedidoCreado {
                pedido_id: pedido_creado.id_pedido,
                numero_pedido: pedido_creado.numero_pedido.clone(),
            })
            .await
        {
            warn!(error = %e, pedido_id = pedido_creado.id_pedido, "Failed to send pedido created event");
        }

        let detalles = self.cargar_detalles(&pedido_creado).await?;
        Ok(PedidoCompleto {
            pedido: pedido_creado,
            proveedor: Some(proveedor),
            detalles,
        })
    }

    /// Avanza el pedido a un nuevo estado. Marcar RECIBIDO ingresa la
    /// mercaderia de todas las lineas al stock dentro de una transaccion.
    #[instrument(skip(self), fields(pedido_id = id, estado_nuevo = %nuevo))]
    pub async fn cambiar_estado(
        &self,
        id: i64,
        nuevo: EstadoPedido,
    ) -> Result<pedido::Model, ServiceError> {
        let db = &*self.db_pool;
        let pedido = self.get_pedido(id).await?;
        let anterior = pedido.estado;

        if !anterior.puede_transicionar_a(nuevo) {
            let mensaje = if pedido.es_final() {
                format!(
                    "El pedido {} ya esta en estado final {}",
                    pedido.numero_pedido, anterior
                )
            } else {
                format!("Transicion de estado no permitida: {} -> {}", anterior, nuevo)
            };
            return Err(ServiceError::Conflict(mensaje));
        }

        let actualizado = if nuevo == EstadoPedido::Recibido {
            self.recibir(pedido).await?
        } else {
            let mut activo: pedido::ActiveModel = pedido.into();
            activo.estado = Set(nuevo);
            activo.fecha_modificacion = Set(Utc::now().naive_utc());
            activo.update(db).await.map_err(|e| {
                error!(error = %e, pedido_id = id, "Failed to update pedido estado");
                ServiceError::DatabaseError(e)
            })?
        };

        info!(
            pedido_id = id,
            estado_anterior = %anterior,
            estado_nuevo = %nuevo,
            "Estado de pedido cambiado"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::PedidoEstadoCambiado {
                pedido_id: id,
                estado_anterior: anterior.to_string(),
                estado_nuevo: nuevo.to_string(),
            })
            .await
        {
            warn!(error = %e, pedido_id = id, "Failed to send pedido estado event");
        }

        Ok(actualizado)
    }

    /// Recepcion de mercaderia: suma cada linea al stock (creando filas en
    /// cero cuando el producto aun no tiene) y marca el pedido RECIBIDO.
    async fn recibir(&self, pedido: pedido::Model) -> Result<pedido::Model, ServiceError> {
        let db = &*self.db_pool;
        let pedido_id = pedido.id_pedido;
        let numero_pedido = pedido.numero_pedido.clone();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction for recepcion");
            ServiceError::DatabaseError(e)
        })?;

        let detalles = pedido
            .find_related(detalle_pedido::Entity)
            .all(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, pedido_id, "Failed to fetch detalles");
                ServiceError::DatabaseError(e)
            })?;

        let mut ingresos: Vec<(i64, i32, i32)> = Vec::with_capacity(detalles.len());
        for detalle in &detalles {
            let anterior = self
                .ingresar_stock(&txn, detalle.id_producto, detalle.cantidad)
                .await?;
            ingresos.push((detalle.id_producto, anterior, anterior + detalle.cantidad));
        }

        let mut activo: pedido::ActiveModel = pedido.into();
        activo.estado = Set(EstadoPedido::Recibido);
        activo.fecha_modificacion = Set(Utc::now().naive_utc());
        let recibido = activo.update(&txn).await.map_err(|e| {
            error!(error = %e, pedido_id, "Failed to mark pedido recibido");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit recepcion");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            pedido_id,
            numero_pedido = %numero_pedido,
            lineas = ingresos.len(),
            "Pedido recibido, mercaderia ingresada"
        );

        for (producto_id, cantidad_anterior, cantidad_nueva) in ingresos {
            if let Err(e) = self
                .event_sender
                .send(Event::StockAjustado {
                    producto_id,
                    cantidad_anterior,
                    cantidad_nueva,
                    motivo: format!("Recepcion del pedido {}", numero_pedido),
                })
                .await
            {
                warn!(error = %e, producto_id, "Failed to send stock adjusted event");
            }
        }
        if let Err(e) = self
            .event_sender
            .send(Event::PedidoRecibido {
                pedido_id,
                numero_pedido,
            })
            .await
        {
            warn!(error = %e, pedido_id, "Failed to send pedido recibido event");
        }

        Ok(recibido)
    }

    /// Suma cantidad al stock del producto dentro de la transaccion.
    /// Devuelve la existencia previa.
    async fn ingresar_stock<C: ConnectionTrait>(
        &self,
        txn: &C,
        id_producto: i64,
        cantidad: i32,
    ) -> Result<i32, ServiceError> {
        let existente = StockEntity::find()
            .filter(stock::Column::IdProducto.eq(id_producto))
            .one(txn)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to fetch stock row");
                ServiceError::DatabaseError(e)
            })?;

        match existente {
            Some(fila) => {
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
                        error!(error = %e, producto_id = id_producto, "Failed to add stock");
                        ServiceError::DatabaseError(e)
                    })?;
                Ok(fila.cantidad)
            }
            None => {
                let nueva = stock::ActiveModel {
                    id_producto: Set(id_producto),
                    cantidad: Set(cantidad),
                    ubicacion: Set(UBICACION_DEFAULT.to_string()),
                    fecha_ultimo_movimiento: Set(Utc::now().naive_utc()),
                    ..Default::default()
                };
                nueva.insert(txn).await.map_err(|e| {
                    error!(error = %e, producto_id = id_producto, "Failed to create stock row");
                    ServiceError::DatabaseError(e)
                })?;
                Ok(0)
            }
        }
    }

    async fn get_pedido(&self, id: i64) -> Result<pedido::Model, ServiceError> {
        let db = &*self.db_pool;

        PedidoEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, pedido_id = id, "Failed to fetch pedido");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Pedido con ID {} no encontrado", id)))
    }

    async fn cargar_detalles(
        &self,
        pedido: &pedido::Model,
    ) -> Result<Vec<DetallePedidoConProducto>, ServiceError> {
        let db = &*self.db_pool;

        let detalles = pedido
            .find_related(detalle_pedido::Entity)
            .order_by_asc(detalle_pedido::Column::IdDetallePedido)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, pedido_id = pedido.id_pedido, "Failed to fetch detalles");
                ServiceError::DatabaseError(e)
            })?;

        let producto_ids: Vec<i64> = detalles.iter().map(|d| d.id_producto).collect();
        let mut productos: HashMap<i64, producto::Model> = ProductoEntity::find()
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
                let producto = productos.remove(&detalle.id_producto);
                DetallePedidoConProducto { detalle, producto }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn lineas_repetidas_se_agrupan_sumando_cantidades() {
        let detalles = vec![
            LineaPedidoRequest {
                id_producto: 7,
                cantidad: 10,
                precio_uni: None,
            },
            LineaPedidoRequest {
                id_producto: 9,
                cantidad: 3,
                precio_uni: Some(dec!(4.50)),
            },
            LineaPedidoRequest {
                id_producto: 7,
                cantidad: 5,
                precio_uni: Some(dec!(2.00)),
            },
        ];

        let agrupadas = agrupar_lineas(&detalles);
        assert_eq!(agrupadas.len(), 2);
        assert_eq!(agrupadas[0].id_producto, 7);
        assert_eq!(agrupadas[0].cantidad, 15);
        assert_eq!(agrupadas[0].precio_uni, Some(dec!(2.00)));
        assert_eq!(agrupadas[1].id_producto, 9);
        assert_eq!(agrupadas[1].cantidad, 3);
    }

    #[test]
    fn estado_pedido_se_parsea_desde_query() {
        use std::str::FromStr;

        assert_eq!(
            EstadoPedido::from_str("APROBADO").ok(),
            Some(EstadoPedido::Aprobado)
        );
        assert!(EstadoPedido::from_str("FACTURADO").is_err());
    }

    #[test]
    fn numero_pedido_vacio_no_pasa_validacion() {
        let request = CrearPedidoRequest {
            numero_pedido: String::new(),
            fecha: None,
            id_proveedor: 1,
            id_usuario: None,
            estado: None,
            fecha_entrega_esperada: None,
            descripcion: None,
            observaciones: None,
            detalles: vec![],
        };
        assert!(request.validate().is_err());
    }
}
