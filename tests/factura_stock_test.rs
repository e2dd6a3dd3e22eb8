mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use ferreteria_api::{
    auth::roles,
    entities::factura::EstadoFactura,
    errors::ServiceError,
    services::facturas::{CrearFacturaRequest, LineaFacturaRequest},
};
use rust_decimal_macros::dec;
use serde_json::json;

fn factura_basica(numero: &str, id_cliente: i64, lineas: Vec<LineaFacturaRequest>) -> CrearFacturaRequest {
    CrearFacturaRequest {
        numero_factura: numero.to_string(),
        fecha: None,
        id_cliente,
        id_usuario: None,
        metodo_pago: None,
        estado: None,
        descuento: None,
        observaciones: None,
        detalles: lineas,
    }
}

fn linea(id_producto: i64, cantidad: i32) -> LineaFacturaRequest {
    LineaFacturaRequest {
        id_producto: Some(id_producto),
        cantidad,
        precio_uni: None,
        descuento_item: None,
    }
}

#[tokio::test]
async fn emitir_factura_descuenta_stock_y_calcula_totales() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Marta").await;
    let producto = app.seed_producto_con_stock("MAR-001", dec!(25.00), 10).await;

    let emitida = app
        .state
        .services
        .facturas
        .crear(factura_basica(
            "F-0001",
            cliente.id_cliente,
            vec![linea(producto.id_producto, 3)],
        ))
        .await
        .expect("la factura debia emitirse");

    // 3 x 25.00 = 75.00; IVA 15% = 11.25
    assert_eq!(emitida.factura.subtotal, dec!(75.00));
    assert_eq!(emitida.factura.impuesto, dec!(11.25));
    assert_eq!(emitida.factura.total, dec!(86.25));
    assert_eq!(emitida.factura.estado, EstadoFactura::Pendiente);
    assert_eq!(emitida.detalles.len(), 1);
    assert_eq!(emitida.detalles[0].detalle.cantidad, 3);
    assert_eq!(emitida.detalles[0].detalle.precio_uni, dec!(25.00));

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .expect("el producto debia tener stock");
    assert_eq!(fila.stock.cantidad, 7);
}

#[tokio::test]
async fn stock_insuficiente_revierte_la_emision_completa() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Ruben").await;
    let holgado = app.seed_producto_con_stock("HOL-001", dec!(10.00), 50).await;
    let escaso = app.seed_producto_con_stock("ESC-001", dec!(10.00), 1).await;

    let resultado = app
        .state
        .services
        .facturas
        .crear(factura_basica(
            "F-0002",
            cliente.id_cliente,
            vec![linea(holgado.id_producto, 5), linea(escaso.id_producto, 5)],
        ))
        .await;

    assert_matches!(
        resultado,
        Err(ServiceError::InsufficientStock {
            disponible: 1,
            requerido: 5,
        })
    );

    // Nada se descuenta: ni la linea que alcanzaba ni la que no.
    let stock_holgado = app
        .state
        .services
        .stock
        .por_producto(holgado.id_producto)
        .await
        .unwrap();
    assert_eq!(stock_holgado.stock.cantidad, 50);
    let stock_escaso = app
        .state
        .services
        .stock
        .por_producto(escaso.id_producto)
        .await
        .unwrap();
    assert_eq!(stock_escaso.stock.cantidad, 1);

    // La factura tampoco quedo guardada.
    let (facturas, total) = app.state.services.facturas.list(1, 20).await.unwrap();
    assert_eq!(total, 0);
    assert!(facturas.is_empty());
}

#[tokio::test]
async fn el_numero_de_factura_no_se_repite() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Laura").await;
    let producto = app.seed_producto_con_stock("LAU-001", dec!(5.00), 20).await;

    app.state
        .services
        .facturas
        .crear(factura_basica(
            "F-0100",
            cliente.id_cliente,
            vec![linea(producto.id_producto, 1)],
        ))
        .await
        .expect("la primera emision debia funcionar");

    let repetida = app
        .state
        .services
        .facturas
        .crear(factura_basica(
            "F-0100",
            cliente.id_cliente,
            vec![linea(producto.id_producto, 1)],
        ))
        .await;

    assert_matches!(repetida, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn el_descuento_global_se_aplica_antes_del_impuesto() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Diego").await;
    let producto = app.seed_producto_con_stock("DIE-001", dec!(40.00), 10).await;

    let mut request = factura_basica(
        "F-0200",
        cliente.id_cliente,
        vec![linea(producto.id_producto, 2)],
    );
    request.descuento = Some(dec!(30.00));

    let emitida = app
        .state
        .services
        .facturas
        .crear(request)
        .await
        .expect("la factura con descuento debia emitirse");

    // (80.00 - 30.00) = 50.00; IVA 15% = 7.50
    assert_eq!(emitida.factura.subtotal, dec!(50.00));
    assert_eq!(emitida.factura.impuesto, dec!(7.50));
    assert_eq!(emitida.factura.total, dec!(57.50));
}

#[tokio::test]
async fn las_filas_sin_producto_se_descartan() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Nora").await;
    let producto = app.seed_producto_con_stock("NOR-001", dec!(12.50), 8).await;

    let vacia = LineaFacturaRequest {
        id_producto: None,
        cantidad: 0,
        precio_uni: None,
        descuento_item: None,
    };

    let emitida = app
        .state
        .services
        .facturas
        .crear(factura_basica(
            "F-0300",
            cliente.id_cliente,
            vec![vacia, linea(producto.id_producto, 2)],
        ))
        .await
        .expect("las filas vacias no deben impedir la emision");

    assert_eq!(emitida.detalles.len(), 1);
    assert_eq!(emitida.factura.subtotal, dec!(25.00));
}

#[tokio::test]
async fn anular_una_factura_repone_el_stock() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Ines").await;
    let producto = app.seed_producto_con_stock("INE-001", dec!(15.00), 10).await;

    let emitida = app
        .state
        .services
        .facturas
        .crear(factura_basica(
            "F-0400",
            cliente.id_cliente,
            vec![linea(producto.id_producto, 4)],
        ))
        .await
        .unwrap();

    let anulada = app
        .state
        .services
        .facturas
        .anular(emitida.factura.id_factura)
        .await
        .expect("la factura pendiente debia anularse");
    assert_eq!(anulada.estado, EstadoFactura::Anulada);

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    assert_eq!(fila.stock.cantidad, 10);

    // Anular dos veces no devuelve stock dos veces.
    let repetida = app
        .state
        .services
        .facturas
        .anular(emitida.factura.id_factura)
        .await;
    assert_matches!(repetida, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn una_factura_pagada_no_se_anula() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Oscar").await;
    let producto = app.seed_producto_con_stock("OSC-001", dec!(9.99), 5).await;

    let mut request = factura_basica(
        "F-0500",
        cliente.id_cliente,
        vec![linea(producto.id_producto, 1)],
    );
    request.estado = Some(EstadoFactura::Pagada);

    let emitida = app.state.services.facturas.crear(request).await.unwrap();

    let resultado = app
        .state
        .services
        .facturas
        .anular(emitida.factura.id_factura)
        .await;
    assert_matches!(resultado, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn el_vendedor_emite_facturas_pero_no_las_anula() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Mostrador").await;
    let producto = app.seed_producto_con_stock("MOS-001", dec!(20.00), 10).await;

    let cuerpo = json!({
        "numero_factura": "F-0600",
        "id_cliente": cliente.id_cliente,
        "detalles": [{ "id_producto": producto.id_producto, "cantidad": 2 }],
    });

    let respuesta = app
        .request_con_rol(Method::POST, "/api/facturas", Some(cuerpo), roles::VENDEDOR)
        .await;
    assert_eq!(respuesta.status(), StatusCode::CREATED);

    // La anulacion queda reservada a gerencia.
    let (facturas, _) = app.state.services.facturas.list(1, 20).await.unwrap();
    let id = facturas[0].factura.id_factura;

    let prohibida = app
        .request_con_rol(
            Method::POST,
            &format!("/api/facturas/{}/anular", id),
            None,
            roles::VENDEDOR,
        )
        .await;
    assert_eq!(prohibida.status(), StatusCode::FORBIDDEN);

    let permitida = app
        .request_con_rol(
            Method::POST,
            &format!("/api/facturas/{}/anular", id),
            None,
            roles::GERENTE,
        )
        .await;
    assert_eq!(permitida.status(), StatusCode::OK);
}
