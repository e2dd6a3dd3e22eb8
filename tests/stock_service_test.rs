mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use ferreteria_api::{
    auth::roles,
    errors::ServiceError,
    services::{
        productos::CrearProductoRequest,
        stock::{
            ActualizarStockRequest, InicializarStockRequest, MovimientoStockRequest,
            TipoMovimiento,
        },
    },
};
use rust_decimal_macros::dec;
use serde_json::json;

fn movimiento(id_producto: i64, tipo: TipoMovimiento, cantidad: i32) -> MovimientoStockRequest {
    MovimientoStockRequest {
        id_producto,
        tipo,
        cantidad,
        motivo: None,
    }
}

#[tokio::test]
async fn la_salida_nunca_deja_existencias_negativas() {
    let app = TestApp::new().await;
    let producto = app.seed_producto_con_stock("SAL-001", dec!(10.00), 5).await;

    let resultado = app
        .state
        .services
        .stock
        .movimiento(movimiento(producto.id_producto, TipoMovimiento::Salida, 8))
        .await;

    assert_matches!(
        resultado,
        Err(ServiceError::InsufficientStock {
            disponible: 5,
            requerido: 8,
        })
    );

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    assert_eq!(fila.stock.cantidad, 5);

    // La salida exacta si procede.
    let agotado = app
        .state
        .services
        .stock
        .movimiento(movimiento(producto.id_producto, TipoMovimiento::Salida, 5))
        .await
        .expect("la salida exacta debia aplicarse");
    assert_eq!(agotado.cantidad, 0);
}

#[tokio::test]
async fn la_entrada_crea_la_fila_cuando_no_existe() {
    let app = TestApp::new().await;

    let producto = app
        .state
        .services
        .productos
        .crear(CrearProductoRequest {
            nombre_producto: "Llave ajustable".to_string(),
            descripcion: None,
            codigo_producto: "LLA-001".to_string(),
            categoria: "HERRAMIENTAS".to_string(),
            marca: None,
            precio: dec!(14.00),
            precio_compra: None,
            unidad_medida: None,
            stock_minimo: None,
            id_proveedor: None,
        })
        .await
        .unwrap();

    let fila = app
        .state
        .services
        .stock
        .movimiento(movimiento(producto.id_producto, TipoMovimiento::Entrada, 10))
        .await
        .expect("la entrada debia crear la fila");

    assert_eq!(fila.cantidad, 10);
    assert_eq!(fila.ubicacion, "ALMACEN PRINCIPAL");

    // La salida sobre fila inexistente, en cambio, es un error.
    let fantasma = app
        .state
        .services
        .stock
        .movimiento(movimiento(producto.id_producto + 1000, TipoMovimiento::Salida, 1))
        .await;
    assert_matches!(fantasma, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn inicializar_rechaza_el_stock_duplicado() {
    let app = TestApp::new().await;
    let producto = app.seed_producto_con_stock("DUP-001", dec!(3.00), 4).await;

    let repetido = app
        .state
        .services
        .stock
        .inicializar(InicializarStockRequest {
            id_producto: producto.id_producto,
            cantidad_inicial: 99,
            ubicacion: None,
        })
        .await;

    assert_matches!(repetido, Err(ServiceError::Conflict(_)));

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    assert_eq!(fila.stock.cantidad, 4);
}

#[tokio::test]
async fn bajo_minimo_lista_solo_los_productos_agotandose() {
    let app = TestApp::new().await;
    // El arnes siembra stock_minimo = 2.
    let escaso = app.seed_producto_con_stock("ESC-100", dec!(5.00), 1).await;
    let _sobrado = app.seed_producto_con_stock("SOB-100", dec!(5.00), 50).await;

    let alertas = app.state.services.stock.bajo_minimo().await.unwrap();

    assert_eq!(alertas.len(), 1);
    assert_eq!(alertas[0].stock.id_producto, escaso.id_producto);
}

#[tokio::test]
async fn el_ajuste_absoluto_fija_cantidad_y_ubicacion() {
    let app = TestApp::new().await;
    let producto = app.seed_producto_con_stock("AJU-001", dec!(2.00), 9).await;

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();

    let ajustada = app
        .state
        .services
        .stock
        .actualizar(
            fila.stock.id_stock,
            ActualizarStockRequest {
                cantidad: 42,
                ubicacion: Some("BODEGA 2".to_string()),
            },
        )
        .await
        .expect("el ajuste debia aplicarse");

    assert_eq!(ajustada.cantidad, 42);
    assert_eq!(ajustada.ubicacion, "BODEGA 2");

    let negativo = app
        .state
        .services
        .stock
        .actualizar(
            fila.stock.id_stock,
            ActualizarStockRequest {
                cantidad: -1,
                ubicacion: None,
            },
        )
        .await;
    assert_matches!(negativo, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn las_estadisticas_valoran_el_inventario_a_precio_de_venta() {
    let app = TestApp::new().await;
    let _a = app.seed_producto_con_stock("VAL-001", dec!(10.00), 3).await;
    let _b = app.seed_producto_con_stock("VAL-002", dec!(4.50), 1).await;

    let stats = app.state.services.stock.estadisticas().await.unwrap();

    assert_eq!(stats.total_productos, 2);
    // VAL-002 quedo en 1, por debajo del minimo de 2 del arnes.
    assert_eq!(stats.productos_bajo_minimo, 1);
    // 3 x 10.00 + 1 x 4.50
    assert_eq!(stats.valor_total, dec!(34.50));
}

#[tokio::test]
async fn eliminar_borra_el_registro_de_inventario() {
    let app = TestApp::new().await;
    let producto = app.seed_producto_con_stock("DEL-001", dec!(7.00), 2).await;

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();

    app.state
        .services
        .stock
        .eliminar(fila.stock.id_stock)
        .await
        .expect("el registro debia eliminarse");

    let ausente = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await;
    assert_matches!(ausente, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn solo_el_administrador_elimina_registros_de_stock() {
    let app = TestApp::new().await;
    let producto = app.seed_producto_con_stock("ADM-001", dec!(6.00), 2).await;
    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    let uri = format!("/api/stock/{}", fila.stock.id_stock);

    let negado = app
        .request_con_rol(Method::DELETE, &uri, None, roles::BODEGUERO)
        .await;
    assert_eq!(negado.status(), StatusCode::FORBIDDEN);

    let admitido = app
        .request_con_rol(Method::DELETE, &uri, None, roles::ADMINISTRADOR)
        .await;
    assert_eq!(admitido.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn el_movimiento_por_http_requiere_rol_de_bodega() {
    let app = TestApp::new().await;
    let producto = app.seed_producto_con_stock("MOV-001", dec!(5.00), 10).await;

    let cuerpo = json!({
        "id_producto": producto.id_producto,
        "tipo": "salida",
        "cantidad": 4,
        "motivo": "Merma por rotura",
    });

    let negado = app
        .request_con_rol(
            Method::POST,
            "/api/stock/movimiento",
            Some(cuerpo.clone()),
            roles::VENDEDOR,
        )
        .await;
    assert_eq!(negado.status(), StatusCode::FORBIDDEN);

    let admitido = app
        .request_con_rol(
            Method::POST,
            "/api/stock/movimiento",
            Some(cuerpo),
            roles::BODEGUERO,
        )
        .await;
    assert_eq!(admitido.status(), StatusCode::OK);

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    assert_eq!(fila.stock.cantidad, 6);
}
