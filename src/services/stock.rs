use crate::{
    db::DbPool,
    entities::{
        producto::{self, Entity as ProductoEntity},
        stock::{self, Entity as StockEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

const UBICACION_DEFAULT: &str = "ALMACEN PRINCIPAL";

/// Ajuste absoluto de una fila de stock.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarStockRequest {
    pub cantidad: i32,
    #[validate(length(min = 1, max = 50, message = "La ubicacion no puede quedar vacia"))]
    pub ubicacion: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TipoMovimiento {
    Entrada,
    Salida,
}

/// Movimiento relativo de inventario: entrada o salida de mercaderia.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MovimientoStockRequest {
    pub id_producto: i64,
    pub tipo: TipoMovimiento,
    pub cantidad: i32,
    #[validate(length(max = 100, message = "El motivo admite hasta 100 caracteres"))]
    pub motivo: Option<String>,
}

/// Alta del registro de stock de un producto que aun no tiene.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InicializarStockRequest {
    pub id_producto: i64,
    pub cantidad_inicial: i32,
    #[validate(length(min = 1, max = 50, message = "La ubicacion no puede quedar vacia"))]
    pub ubicacion: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisponibilidadStock {
    pub disponible: bool,
    pub stock_actual: i32,
    pub cantidad_requerida: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstadisticasStock {
    pub total_productos: u64,
    pub productos_bajo_minimo: u64,
    /// Suma de cantidad por precio de venta de cada producto.
    pub valor_total: Decimal,
}

/// Fila de stock con su producto, cuando el producto sigue en el catalogo.
#[derive(Debug, Clone)]
pub struct StockConProducto {
    pub stock: stock::Model,
    pub producto: Option<producto::Model>,
}

/// Servicio de inventario fisico. Toda salida usa un decremento condicional
/// (cantidad = cantidad - n solo si cantidad >= n) para que el stock nunca
/// quede negativo, incluso con ventas concurrentes.
#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lista paginada, movimientos mas recientes primero.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<StockConProducto>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = StockEntity::find()
            .order_by_desc(stock::Column::FechaUltimoMovimiento)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count stock rows");
            ServiceError::DatabaseError(e)
        })?;

        let filas = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch stock page");
                ServiceError::DatabaseError(e)
            })?;

        let producto_ids: Vec<i64> = filas.iter().map(|f| f.id_producto).collect();
        let mut productos: HashMap<i64, producto::Model> = ProductoEntity::find()
            .filter(producto::Column::IdProducto.is_in(producto_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch productos for stock page");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|p| (p.id_producto, p))
            .collect();

        let resultado = filas
            .into_iter()
            .map(|fila| {
                let producto = productos.remove(&fila.id_producto);
                StockConProducto {
                    stock: fila,
                    producto,
                }
            })
            .collect();

        Ok((resultado, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<StockConProducto, ServiceError> {
        let db = &*self.db_pool;
        let fila = self.get_fila(id).await?;

        let producto = fila
            .find_related(producto::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, stock_id = id, "Failed to fetch producto for stock");
                ServiceError::DatabaseError(e)
            })?;

        Ok(StockConProducto {
            stock: fila,
            producto,
        })
    }

    #[instrument(skip(self))]
    pub async fn por_producto(&self, id_producto: i64) -> Result<StockConProducto, ServiceError> {
        let db = &*self.db_pool;

        let fila = StockEntity::find()
            .filter(stock::Column::IdProducto.eq(id_producto))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to fetch stock by producto");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No existe registro de stock para el producto {}",
                    id_producto
                ))
            })?;

        let producto = fila
            .find_related(producto::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to fetch producto for stock");
                ServiceError::DatabaseError(e)
            })?;

        Ok(StockConProducto {
            stock: fila,
            producto,
        })
    }

    /// Busqueda por nombre o codigo del producto, sin distinguir mayusculas.
    #[instrument(skip(self))]
    pub async fn buscar(&self, termino: &str) -> Result<Vec<StockConProducto>, ServiceError> {
        let db = &*self.db_pool;
        let patron = format!("%{}%", termino.to_lowercase());

        let filas = StockEntity::find()
            .find_also_related(producto::Entity)
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            producto::Entity,
                            producto::Column::NombreProducto,
                        ))))
                        .like(patron.as_str()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            producto::Entity,
                            producto::Column::CodigoProducto,
                        ))))
                        .like(patron.as_str()),
                    ),
            )
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, termino, "Failed to search stock");
                ServiceError::DatabaseError(e)
            })?;

        Ok(filas
            .into_iter()
            .map(|(stock, producto)| StockConProducto { stock, producto })
            .collect())
    }

    /// Existencia suficiente para cubrir una cantidad requerida.
    /// Sin registro de stock la respuesta es no disponible con existencia 0.
    #[instrument(skip(self))]
    pub async fn disponibilidad(
        &self,
        id_producto: i64,
        cantidad_requerida: i32,
    ) -> Result<DisponibilidadStock, ServiceError> {
        let db = &*self.db_pool;

        let stock_actual = StockEntity::find()
            .filter(stock::Column::IdProducto.eq(id_producto))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to check disponibilidad");
                ServiceError::DatabaseError(e)
            })?
            .map(|fila| fila.cantidad)
            .unwrap_or(0);

        Ok(DisponibilidadStock {
            disponible: stock_actual >= cantidad_requerida,
            stock_actual,
            cantidad_requerida,
        })
    }

    /// Productos activos cuya existencia esta en o bajo su stock minimo.
    #[instrument(skip(self))]
    pub async fn bajo_minimo(&self) -> Result<Vec<StockConProducto>, ServiceError> {
        let db = &*self.db_pool;

        let filas = StockEntity::find()
            .find_also_related(producto::Entity)
            .filter(producto::Column::Activo.eq(true))
            .filter(
                Expr::col((stock::Entity, stock::Column::Cantidad))
                    .lte(Expr::col((producto::Entity, producto::Column::StockMinimo))),
            )
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch stock bajo minimo");
                ServiceError::DatabaseError(e)
            })?;

        Ok(filas
            .into_iter()
            .map(|(stock, producto)| StockConProducto { stock, producto })
            .collect())
    }

    /// Ajuste absoluto de cantidad y ubicacion de una fila existente.
    #[instrument(skip(self, request), fields(stock_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarStockRequest,
    ) -> Result<stock::Model, ServiceError> {
        request.validate()?;

        if request.cantidad < 0 {
            return Err(ServiceError::ValidationError(
                "La cantidad no puede ser negativa".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let fila = self.get_fila(id).await?;
        let cantidad_anterior = fila.cantidad;

        let mut activo: stock::ActiveModel = fila.into();
        activo.cantidad = Set(request.cantidad);
        if let Some(ubicacion) = request.ubicacion {
            activo.ubicacion = Set(ubicacion);
        }
        activo.fecha_ultimo_movimiento = Set(Utc::now().naive_utc());

        let model = activo.update(db).await.map_err(|e| {
            error!(error = %e, stock_id = id, "Failed to update stock");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            stock_id = id,
            producto_id = model.id_producto,
            cantidad_anterior,
            cantidad_nueva = model.cantidad,
            "Stock ajustado"
        );

        self.notificar_ajuste(
            model.id_producto,
            cantidad_anterior,
            model.cantidad,
            "Ajuste absoluto".to_string(),
        )
        .await;
        self.verificar_minimo(model.id_producto, model.cantidad).await;

        Ok(model)
    }

    /// Entrada o salida de mercaderia. La entrada crea la fila si no existe;
    /// la salida exige fila previa y existencia suficiente.
    #[instrument(skip(self, request), fields(producto_id = request.id_producto, tipo = ?request.tipo))]
    pub async fn movimiento(
        &self,
        request: MovimientoStockRequest,
    ) -> Result<stock::Model, ServiceError> {
        request.validate()?;

        if request.cantidad <= 0 {
            return Err(ServiceError::ValidationError(
                "La cantidad del movimiento debe ser mayor a cero".to_string(),
            ));
        }

        let producto = self.obtener_producto(request.id_producto).await?;
        let db = &*self.db_pool;
        let ahora = Utc::now().naive_utc();

        let existente = StockEntity::find()
            .filter(stock::Column::IdProducto.eq(request.id_producto))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = request.id_producto, "Failed to fetch stock row");
                ServiceError::DatabaseError(e)
            })?;

        let (cantidad_anterior, model) = match request.tipo {
            TipoMovimiento::Entrada => match existente {
                Some(fila) => {
                    let cantidad_anterior = fila.cantidad;
                    StockEntity::update_many()
                        .col_expr(
                            stock::Column::Cantidad,
                            Expr::col(stock::Column::Cantidad).add(request.cantidad),
                        )
                        .col_expr(stock::Column::FechaUltimoMovimiento, Expr::value(ahora))
                        .filter(stock::Column::IdProducto.eq(request.id_producto))
                        .exec(db)
                        .await
                        .map_err(|e| {
                            error!(error = %e, producto_id = request.id_producto, "Failed to apply stock entrada");
                            ServiceError::DatabaseError(e)
                        })?;

                    (cantidad_anterior, self.refetch_por_producto(request.id_producto).await?)
                }
                None => {
                    let nueva = stock::ActiveModel {
                        id_producto: Set(request.id_producto),
                        cantidad: Set(request.cantidad),
                        ubicacion: Set(UBICACION_DEFAULT.to_string()),
                        fecha_ultimo_movimiento: Set(ahora),
                        ..Default::default()
                    };
                    let model = nueva.insert(db).await.map_err(|e| {
                        error!(error = %e, producto_id = request.id_producto, "Failed to create stock row");
                        ServiceError::DatabaseError(e)
                    })?;
                    (0, model)
                }
            },
            TipoMovimiento::Salida => {
                let fila = existente.ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "No existe registro de stock para el producto {}",
                        request.id_producto
                    ))
                })?;
                let cantidad_anterior = fila.cantidad;

                let resultado = StockEntity::update_many()
                    .col_expr(
                        stock::Column::Cantidad,
                        Expr::col(stock::Column::Cantidad).sub(request.cantidad),
                    )
                    .col_expr(stock::Column::FechaUltimoMovimiento, Expr::value(ahora))
                    .filter(stock::Column::IdProducto.eq(request.id_producto))
                    .filter(stock::Column::Cantidad.gte(request.cantidad))
                    .exec(db)
                    .await
                    .map_err(|e| {
                        error!(error = %e, producto_id = request.id_producto, "Failed to apply stock salida");
                        ServiceError::DatabaseError(e)
                    })?;

                if resultado.rows_affected == 0 {
                    return Err(ServiceError::InsufficientStock {
                        disponible: cantidad_anterior,
                        requerido: request.cantidad,
                    });
                }

                (cantidad_anterior, self.refetch_por_producto(request.id_producto).await?)
            }
        };

        let motivo = request.motivo.unwrap_or_else(|| match request.tipo {
            TipoMovimiento::Entrada => "Entrada de mercaderia".to_string(),
            TipoMovimiento::Salida => "Salida de mercaderia".to_string(),
        });

        info!(
            producto_id = model.id_producto,
            cantidad_anterior,
            cantidad_nueva = model.cantidad,
            motivo = %motivo,
            "Movimiento de stock aplicado"
        );

        self.notificar_ajuste(model.id_producto, cantidad_anterior, model.cantidad, motivo)
            .await;
        if model.cantidad <= producto.stock_minimo {
            self.enviar_bajo_minimo(&producto, model.cantidad).await;
        }

        Ok(model)
    }

    /// Crea el registro de stock inicial de un producto.
    #[instrument(skip(self, request), fields(producto_id = request.id_producto))]
    pub async fn inicializar(
        &self,
        request: InicializarStockRequest,
    ) -> Result<stock::Model, ServiceError> {
        request.validate()?;

        if request.cantidad_inicial < 0 {
            return Err(ServiceError::ValidationError(
                "La cantidad inicial no puede ser negativa".to_string(),
            ));
        }

        let producto = self.obtener_producto(request.id_producto).await?;
        let db = &*self.db_pool;

        let existente = StockEntity::find()
            .filter(stock::Column::IdProducto.eq(request.id_producto))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = request.id_producto, "Failed to check existing stock");
                ServiceError::DatabaseError(e)
            })?;

        if existente > 0 {
            return Err(ServiceError::Conflict(format!(
                "Ya existe un registro de stock para el producto {}",
                request.id_producto
            )));
        }

        let nueva = stock::ActiveModel {
            id_producto: Set(request.id_producto),
            cantidad: Set(request.cantidad_inicial),
            ubicacion: Set(request
                .ubicacion
                .unwrap_or_else(|| UBICACION_DEFAULT.to_string())),
            fecha_ultimo_movimiento: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        let model = nueva.insert(db).await.map_err(|e| {
            error!(error = %e, producto_id = request.id_producto, "Failed to initialize stock");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            stock_id = model.id_stock,
            producto_id = model.id_producto,
            cantidad = model.cantidad,
            "Stock inicializado"
        );

        self.notificar_ajuste(
            model.id_producto,
            0,
            model.cantidad,
            "Inventario inicial".to_string(),
        )
        .await;
        if model.cantidad <= producto.stock_minimo {
            self.enviar_bajo_minimo(&producto, model.cantidad).await;
        }

        Ok(model)
    }

    /// Conteos globales del inventario valorado a precio de venta.
    #[instrument(skip(self))]
    pub async fn estadisticas(&self) -> Result<EstadisticasStock, ServiceError> {
        let db = &*self.db_pool;

        let filas = StockEntity::find()
            .find_also_related(producto::Entity)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch stock for estadisticas");
                ServiceError::DatabaseError(e)
            })?;

        let total_productos = filas.len() as u64;
        let mut productos_bajo_minimo = 0u64;
        let mut valor_total = Decimal::ZERO;

        for (fila, producto) in &filas {
            if let Some(producto) = producto {
                if producto.activo && fila.cantidad <= producto.stock_minimo {
                    productos_bajo_minimo += 1;
                }
                valor_total += Decimal::from(fila.cantidad) * producto.precio;
            }
        }

        Ok(EstadisticasStock {
            total_productos,
            productos_bajo_minimo,
            valor_total,
        })
    }

    /// Elimina el registro de stock. El producto queda sin fila de inventario.
    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let fila = self.get_fila(id).await?;

        StockEntity::delete_by_id(id).exec(db).await.map_err(|e| {
            error!(error = %e, stock_id = id, "Failed to delete stock row");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            stock_id = id,
            producto_id = fila.id_producto,
            "Registro de stock eliminado"
        );

        Ok(())
    }

    async fn get_fila(&self, id: i64) -> Result<stock::Model, ServiceError> {
        let db = &*self.db_pool;

        StockEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, stock_id = id, "Failed to fetch stock row");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Registro de stock con ID {} no encontrado", id))
            })
    }

    async fn refetch_por_producto(&self, id_producto: i64) -> Result<stock::Model, ServiceError> {
        let db = &*self.db_pool;

        StockEntity::find()
            .filter(stock::Column::IdProducto.eq(id_producto))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id_producto, "Failed to refetch stock row");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "La fila de stock del producto {} desaparecio durante el movimiento",
                    id_producto
                ))
            })
    }

    async fn obtener_producto(&self, id_producto: i64) -> Result<producto::Model, ServiceError> {
        let db = &*self.db_pool;

        ProductoEntity::find_by_id(id_producto)
            .one(db)
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
            })
    }

    async fn notificar_ajuste(
        &self,
        producto_id: i64,
        cantidad_anterior: i32,
        cantidad_nueva: i32,
        motivo: String,
    ) {
        if let Err(e) = self
            .event_sender
            .send(Event::StockAjustado {
                producto_id,
                cantidad_anterior,
                cantidad_nueva,
                motivo,
            })
            .await
        {
            warn!(error = %e, producto_id, "Failed to send stock adjusted event");
        }
    }

    async fn verificar_minimo(&self, producto_id: i64, cantidad_actual: i32) {
        let db = &*self.db_pool;

        match ProductoEntity::find_by_id(producto_id).one(db).await {
            Ok(Some(producto)) if cantidad_actual <= producto.stock_minimo => {
                self.enviar_bajo_minimo(&producto, cantidad_actual).await;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, producto_id, "Failed to check stock minimo");
            }
        }
    }

    async fn enviar_bajo_minimo(&self, producto: &producto::Model, cantidad_actual: i32) {
        if let Err(e) = self
            .event_sender
            .send(Event::StockBajoMinimo {
                producto_id: producto.id_producto,
                cantidad_actual,
                stock_minimo: producto.stock_minimo,
            })
            .await
        {
            warn!(error = %e, producto_id = producto.id_producto, "Failed to send stock bajo minimo event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tipo_movimiento_se_deserializa_en_minusculas() {
        let entrada: TipoMovimiento = serde_json::from_str("\"entrada\"").unwrap();
        let salida: TipoMovimiento = serde_json::from_str("\"salida\"").unwrap();
        assert_eq!(entrada, TipoMovimiento::Entrada);
        assert_eq!(salida, TipoMovimiento::Salida);

        assert!(serde_json::from_str::<TipoMovimiento>("\"traslado\"").is_err());
    }

    #[test]
    fn movimiento_request_con_motivo_largo_falla() {
        let request = MovimientoStockRequest {
            id_producto: 1,
            tipo: TipoMovimiento::Entrada,
            cantidad: 5,
            motivo: Some("x".repeat(101)),
        };
        assert!(request.validate().is_err());
    }
}
