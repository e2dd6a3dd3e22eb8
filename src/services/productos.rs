use crate::{
    db::DbPool,
    entities::{
        detalle_factura, detalle_pedido,
        producto::{self, Entity as ProductoEntity},
        proveedor, stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Alta de un producto del catalogo.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearProductoRequest {
    #[validate(length(min = 1, max = 100, message = "El nombre del producto es obligatorio"))]
    pub nombre_producto: String,
    #[validate(length(max = 200, message = "La descripcion admite hasta 200 caracteres"))]
    pub descripcion: Option<String>,
    #[validate(length(min = 1, max = 50, message = "El codigo del producto es obligatorio"))]
    pub codigo_producto: String,
    #[validate(length(min = 1, max = 50, message = "La categoria es obligatoria"))]
    pub categoria: String,
    #[validate(length(max = 50, message = "La marca admite hasta 50 caracteres"))]
    pub marca: Option<String>,
    pub precio: Decimal,
    pub precio_compra: Option<Decimal>,
    #[validate(length(max = 20, message = "La unidad de medida admite hasta 20 caracteres"))]
    pub unidad_medida: Option<String>,
    pub stock_minimo: Option<i32>,
    pub id_proveedor: Option<i64>,
}

/// Cambios sobre un producto; solo los campos presentes se aplican.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarProductoRequest {
    #[validate(length(min = 1, max = 100, message = "El nombre no puede quedar vacio"))]
    pub nombre_producto: Option<String>,
    #[validate(length(max = 200, message = "La descripcion admite hasta 200 caracteres"))]
    pub descripcion: Option<String>,
    #[validate(length(min = 1, max = 50, message = "El codigo no puede quedar vacio"))]
    pub codigo_producto: Option<String>,
    #[validate(length(min = 1, max = 50, message = "La categoria no puede quedar vacia"))]
    pub categoria: Option<String>,
    #[validate(length(max = 50, message = "La marca admite hasta 50 caracteres"))]
    pub marca: Option<String>,
    pub precio: Option<Decimal>,
    pub precio_compra: Option<Decimal>,
    #[validate(length(max = 20, message = "La unidad de medida admite hasta 20 caracteres"))]
    pub unidad_medida: Option<String>,
    pub stock_minimo: Option<i32>,
    pub id_proveedor: Option<i64>,
    pub activo: Option<bool>,
}

/// Producto con el proveedor y la existencia actual, cuando existen.
#[derive(Debug, Clone)]
pub struct ProductoConRelaciones {
    pub producto: producto::Model,
    pub proveedor: Option<proveedor::Model>,
    pub stock: Option<stock::Model>,
}

/// Servicio del catalogo de productos.
#[derive(Clone)]
pub struct ProductoService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductoService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lista paginada con proveedor y existencia incorporados.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductoConRelaciones>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = ProductoEntity::find()
            .order_by_asc(producto::Column::NombreProducto)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count productos");
            ServiceError::DatabaseError(e)
        })?;

        let productos = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch productos page");
                ServiceError::DatabaseError(e)
            })?;

        // Una consulta por relacion para toda la pagina, en lugar de un
        // par de consultas por producto.
        let ids: Vec<i64> = productos.iter().map(|p| p.id_producto).collect();
        let proveedor_ids: Vec<i64> = productos.iter().filter_map(|p| p.id_proveedor).collect();

        let proveedores: HashMap<i64, proveedor::Model> = proveedor::Entity::find()
            .filter(proveedor::Column::IdProveedor.is_in(proveedor_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch proveedores for productos page");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|p| (p.id_proveedor, p))
            .collect();

        let mut stocks: HashMap<i64, stock::Model> = stock::Entity::find()
            .filter(stock::Column::IdProducto.is_in(ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch stock for productos page");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|s| (s.id_producto, s))
            .collect();

        let filas = productos
            .into_iter()
            .map(|producto| {
                let proveedor = producto
                    .id_proveedor
                    .and_then(|id| proveedores.get(&id).cloned());
                let stock = stocks.remove(&producto.id_producto);
                ProductoConRelaciones {
                    producto,
                    proveedor,
                    stock,
                }
            })
            .collect();

        Ok((filas, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<ProductoConRelaciones, ServiceError> {
        let db = &*self.db_pool;

        let producto = self.get_model(id).await?;

        let proveedor = producto
            .find_related(proveedor::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id, "Failed to fetch proveedor for producto");
                ServiceError::DatabaseError(e)
            })?;

        let stock = producto
            .find_related(stock::Entity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id, "Failed to fetch stock for producto");
                ServiceError::DatabaseError(e)
            })?;

        Ok(ProductoConRelaciones {
            producto,
            proveedor,
            stock,
        })
    }

    /// Modelo pelado, para los servicios que solo necesitan validar existencia.
    #[instrument(skip(self))]
    pub async fn get_model(&self, id: i64) -> Result<producto::Model, ServiceError> {
        let db = &*self.db_pool;

        ProductoEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id, "Failed to fetch producto");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Producto con ID {} no encontrado", id)))
    }

    /// Alta de producto; el codigo es unico y el proveedor, si viene, debe existir.
    #[instrument(skip(self, request), fields(codigo = %request.codigo_producto))]
    pub async fn crear(
        &self,
        request: CrearProductoRequest,
    ) -> Result<producto::Model, ServiceError> {
        request.validate()?;

        if request.precio <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "El precio debe ser mayor a cero".to_string(),
            ));
        }
        if let Some(precio_compra) = request.precio_compra {
            if precio_compra < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El precio de compra no puede ser negativo".to_string(),
                ));
            }
        }
        if let Some(stock_minimo) = request.stock_minimo {
            if stock_minimo < 0 {
                return Err(ServiceError::ValidationError(
                    "El stock minimo no puede ser negativo".to_string(),
                ));
            }
        }

        if self.codigo_en_uso(&request.codigo_producto, None).await? {
            return Err(ServiceError::Conflict(format!(
                "Ya existe un producto con el codigo {}",
                request.codigo_producto
            )));
        }

        if let Some(id_proveedor) = request.id_proveedor {
            self.verificar_proveedor(id_proveedor).await?;
        }

        let db = &*self.db_pool;
        let ahora = Utc::now().naive_utc();

        let producto = producto::ActiveModel {
            nombre_producto: Set(request.nombre_producto),
            descripcion: Set(request.descripcion),
            codigo_producto: Set(request.codigo_producto),
            categoria: Set(request.categoria),
            marca: Set(request.marca),
            precio: Set(request.precio),
            precio_compra: Set(request.precio_compra),
            unidad_medida: Set(request
                .unidad_medida
                .unwrap_or_else(|| "UNIDAD".to_string())),
            stock_minimo: Set(request.stock_minimo.unwrap_or(0)),
            activo: Set(true),
            id_proveedor: Set(request.id_proveedor),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        };

        let model = producto.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to insert producto");
            ServiceError::DatabaseError(e)
        })?;

        info!(producto_id = model.id_producto, "Producto registrado");

        if let Err(e) = self
            .event_sender
            .send(Event::ProductoCreado(model.id_producto))
            .await
        {
            warn!(error = %e, producto_id = model.id_producto, "Failed to send producto created event");
        }

        Ok(model)
    }

    /// Aplica los campos presentes; la unicidad del codigo excluye al propio producto.
    #[instrument(skip(self, request), fields(producto_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarProductoRequest,
    ) -> Result<producto::Model, ServiceError> {
        request.validate()?;

        if let Some(precio) = request.precio {
            if precio <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El precio debe ser mayor a cero".to_string(),
                ));
            }
        }
        if let Some(precio_compra) = request.precio_compra {
            if precio_compra < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "El precio de compra no puede ser negativo".to_string(),
                ));
            }
        }
        if let Some(stock_minimo) = request.stock_minimo {
            if stock_minimo < 0 {
                return Err(ServiceError::ValidationError(
                    "El stock minimo no puede ser negativo".to_string(),
                ));
            }
        }

        let actual = self.get_model(id).await?;

        if let Some(codigo) = &request.codigo_producto {
            if self.codigo_en_uso(codigo, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un producto con el codigo {}",
                    codigo
                )));
            }
        }
        if let Some(id_proveedor) = request.id_proveedor {
            self.verificar_proveedor(id_proveedor).await?;
        }

        let db = &*self.db_pool;
        let mut producto: producto::ActiveModel = actual.into();

        if let Some(nombre) = request.nombre_producto {
            producto.nombre_producto = Set(nombre);
        }
        if let Some(descripcion) = request.descripcion {
            producto.descripcion = Set(Some(descripcion));
        }
        if let Some(codigo) = request.codigo_producto {
            producto.codigo_producto = Set(codigo);
        }
        if let Some(categoria) = request.categoria {
            producto.categoria = Set(categoria);
        }
        if let Some(marca) = request.marca {
            producto.marca = Set(Some(marca));
        }
        if let Some(precio) = request.precio {
            producto.precio = Set(precio);
        }
        if let Some(precio_compra) = request.precio_compra {
            producto.precio_compra = Set(Some(precio_compra));
        }
        if let Some(unidad) = request.unidad_medida {
            producto.unidad_medida = Set(unidad);
        }
        if let Some(stock_minimo) = request.stock_minimo {
            producto.stock_minimo = Set(stock_minimo);
        }
        if let Some(id_proveedor) = request.id_proveedor {
            producto.id_proveedor = Set(Some(id_proveedor));
        }
        if let Some(activo) = request.activo {
            producto.activo = Set(activo);
        }
        producto.fecha_modificacion = Set(Utc::now().naive_utc());

        let model = producto.update(db).await.map_err(|e| {
            error!(error = %e, producto_id = id, "Failed to update producto");
            ServiceError::DatabaseError(e)
        })?;

        info!(producto_id = id, "Producto actualizado");

        if let Err(e) = self.event_sender.send(Event::ProductoActualizado(id)).await {
            warn!(error = %e, producto_id = id, "Failed to send producto updated event");
        }

        Ok(model)
    }

    /// Borrado fisico del producto y de su registro de stock. Se rechaza
    /// mientras haya lineas de factura o de pedido que lo referencien.
    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get_model(id).await?;

        let en_facturas = detalle_factura::Entity::find()
            .filter(detalle_factura::Column::IdProducto.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id, "Failed to count detalle_facturas for producto");
                ServiceError::DatabaseError(e)
            })?;

        if en_facturas > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el producto: aparece en {} lineas de factura",
                en_facturas
            )));
        }

        let en_pedidos = detalle_pedido::Entity::find()
            .filter(detalle_pedido::Column::IdProducto.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id, "Failed to count detalle_pedidos for producto");
                ServiceError::DatabaseError(e)
            })?;

        if en_pedidos > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el producto: aparece en {} lineas de pedido",
                en_pedidos
            )));
        }

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for producto deletion");
            ServiceError::DatabaseError(e)
        })?;

        stock::Entity::delete_many()
            .filter(stock::Column::IdProducto.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id, "Failed to delete stock for producto");
                ServiceError::DatabaseError(e)
            })?;

        ProductoEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, producto_id = id, "Failed to delete producto");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, producto_id = id, "Failed to commit producto deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(producto_id = id, "Producto eliminado");

        if let Err(e) = self.event_sender.send(Event::ProductoEliminado(id)).await {
            warn!(error = %e, producto_id = id, "Failed to send producto deleted event");
        }

        Ok(())
    }

    async fn codigo_en_uso(
        &self,
        codigo: &str,
        excluir_id: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut query =
            ProductoEntity::find().filter(producto::Column::CodigoProducto.eq(codigo));
        if let Some(excluir) = excluir_id {
            query = query.filter(producto::Column::IdProducto.ne(excluir));
        }

        let ocupados = query.count(db).await.map_err(|e| {
            error!(error = %e, codigo, "Failed to check codigo availability");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ocupados > 0)
    }

    async fn verificar_proveedor(&self, id_proveedor: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existe = proveedor::Entity::find_by_id(id_proveedor)
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, proveedor_id = id_proveedor, "Failed to check proveedor existence");
                ServiceError::DatabaseError(e)
            })?
            > 0;

        if !existe {
            return Err(ServiceError::ValidationError(format!(
                "El proveedor con ID {} no existe",
                id_proveedor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_request() -> CrearProductoRequest {
        CrearProductoRequest {
            nombre_producto: "Taladro percutor 650W".into(),
            descripcion: Some("Mandril de 13 mm, incluye maletin".into()),
            codigo_producto: "HER-0042".into(),
            categoria: "HERRAMIENTAS ELECTRICAS".into(),
            marca: Some("Truper".into()),
            precio: dec!(89.90),
            precio_compra: Some(dec!(61.20)),
            unidad_medida: None,
            stock_minimo: Some(3),
            id_proveedor: None,
        }
    }

    #[test]
    fn crear_request_valido_pasa_validacion() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn crear_request_sin_codigo_falla() {
        let mut request = base_request();
        request.codigo_producto = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn descripcion_demasiado_larga_falla() {
        let mut request = base_request();
        request.descripcion = Some("x".repeat(201));
        assert!(request.validate().is_err());
    }
}
