mod common;

use assert_matches::assert_matches;
use common::TestApp;
use ferreteria_api::{
    entities::pedido::EstadoPedido,
    errors::ServiceError,
    services::{
        pedidos::{CrearPedidoRequest, LineaPedidoRequest},
        productos::CrearProductoRequest,
    },
};
use rust_decimal_macros::dec;

fn pedido_basico(
    numero: &str,
    id_proveedor: i64,
    lineas: Vec<LineaPedidoRequest>,
) -> CrearPedidoRequest {
    CrearPedidoRequest {
        numero_pedido: numero.to_string(),
        fecha: None,
        id_proveedor,
        id_usuario: None,
        estado: None,
        fecha_entrega_esperada: None,
        descripcion: None,
        observaciones: None,
        detalles: lineas,
    }
}

fn linea(id_producto: i64, cantidad: i32) -> LineaPedidoRequest {
    LineaPedidoRequest {
        id_producto,
        cantidad,
        precio_uni: None,
    }
}

#[tokio::test]
async fn crear_pedido_agrupa_las_lineas_repetidas() {
    let app = TestApp::new().await;
    let proveedor = app.seed_proveedor("Aceros del Sur").await;
    let producto = app.seed_producto_con_stock("ACE-001", dec!(8.00), 0).await;

    let creado = app
        .state
        .services
        .pedidos
        .crear(pedido_basico(
            "P-0001",
            proveedor.id_proveedor,
            vec![linea(producto.id_producto, 3), linea(producto.id_producto, 2)],
        ))
        .await
        .expect("el pedido debia registrarse");

    assert_eq!(creado.pedido.estado, EstadoPedido::Pendiente);
    assert_eq!(creado.detalles.len(), 1);
    assert_eq!(creado.detalles[0].detalle.cantidad, 5);
    // 5 x 8.00 al precio vigente del producto
    assert_eq!(creado.pedido.total, dec!(40.00));
}

#[tokio::test]
async fn recibir_un_pedido_ingresa_la_mercaderia_al_stock() {
    let app = TestApp::new().await;
    let proveedor = app.seed_proveedor("El Tornillo Feliz").await;
    let producto = app.seed_producto_con_stock("TOR-001", dec!(2.50), 10).await;

    let creado = app
        .state
        .services
        .pedidos
        .crear(pedido_basico(
            "P-0100",
            proveedor.id_proveedor,
            vec![linea(producto.id_producto, 40)],
        ))
        .await
        .unwrap();
    let id = creado.pedido.id_pedido;

    let pedidos = &app.state.services.pedidos;
    pedidos.cambiar_estado(id, EstadoPedido::Aprobado).await.unwrap();
    pedidos.cambiar_estado(id, EstadoPedido::Enviado).await.unwrap();
    let recibido = pedidos
        .cambiar_estado(id, EstadoPedido::Recibido)
        .await
        .expect("la recepcion debia completarse");

    assert_eq!(recibido.estado, EstadoPedido::Recibido);

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    assert_eq!(fila.stock.cantidad, 50);
}

#[tokio::test]
async fn la_recepcion_crea_la_fila_de_stock_si_no_existe() {
    let app = TestApp::new().await;
    let proveedor = app.seed_proveedor("Pinturas Norte").await;

    // Producto recien dado de alta, sin registro de stock todavia.
    let producto = app
        .state
        .services
        .productos
        .crear(CrearProductoRequest {
            nombre_producto: "Esmalte blanco".to_string(),
            descripcion: None,
            codigo_producto: "PIN-001".to_string(),
            categoria: "PINTURAS".to_string(),
            marca: None,
            precio: dec!(6.75),
            precio_compra: None,
            unidad_medida: None,
            stock_minimo: None,
            id_proveedor: Some(proveedor.id_proveedor),
        })
        .await
        .unwrap();

    let creado = app
        .state
        .services
        .pedidos
        .crear(pedido_basico(
            "P-0200",
            proveedor.id_proveedor,
            vec![linea(producto.id_producto, 12)],
        ))
        .await
        .unwrap();
    let id = creado.pedido.id_pedido;

    let pedidos = &app.state.services.pedidos;
    pedidos.cambiar_estado(id, EstadoPedido::Aprobado).await.unwrap();
    pedidos.cambiar_estado(id, EstadoPedido::Enviado).await.unwrap();
    pedidos.cambiar_estado(id, EstadoPedido::Recibido).await.unwrap();

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .expect("la recepcion debia crear la fila de stock");
    assert_eq!(fila.stock.cantidad, 12);
}

#[tokio::test]
async fn el_estado_no_salta_pasos_ni_retrocede() {
    let app = TestApp::new().await;
    let proveedor = app.seed_proveedor("Distribuidora Mixta").await;
    let producto = app.seed_producto_con_stock("MIX-001", dec!(1.00), 0).await;

    let creado = app
        .state
        .services
        .pedidos
        .crear(pedido_basico(
            "P-0300",
            proveedor.id_proveedor,
            vec![linea(producto.id_producto, 1)],
        ))
        .await
        .unwrap();
    let id = creado.pedido.id_pedido;
    let pedidos = &app.state.services.pedidos;

    // PENDIENTE no llega directo a RECIBIDO ni a ENVIADO.
    assert_matches!(
        pedidos.cambiar_estado(id, EstadoPedido::Recibido).await,
        Err(ServiceError::Conflict(_))
    );
    assert_matches!(
        pedidos.cambiar_estado(id, EstadoPedido::Enviado).await,
        Err(ServiceError::Conflict(_))
    );

    pedidos.cambiar_estado(id, EstadoPedido::Aprobado).await.unwrap();

    // Tampoco se retrocede.
    assert_matches!(
        pedidos.cambiar_estado(id, EstadoPedido::Pendiente).await,
        Err(ServiceError::Conflict(_))
    );
}

#[tokio::test]
async fn un_pedido_recibido_queda_cerrado() {
    let app = TestApp::new().await;
    let proveedor = app.seed_proveedor("Ferrimport").await;
    let producto = app.seed_producto_con_stock("FER-001", dec!(3.00), 0).await;

    let creado = app
        .state
        .services
        .pedidos
        .crear(pedido_basico(
            "P-0400",
            proveedor.id_proveedor,
            vec![linea(producto.id_producto, 6)],
        ))
        .await
        .unwrap();
    let id = creado.pedido.id_pedido;
    let pedidos = &app.state.services.pedidos;

    pedidos.cambiar_estado(id, EstadoPedido::Aprobado).await.unwrap();
    pedidos.cambiar_estado(id, EstadoPedido::Enviado).await.unwrap();
    pedidos.cambiar_estado(id, EstadoPedido::Recibido).await.unwrap();

    // Ni cancelarlo ni volver a recibirlo: el stock ya ingreso una vez.
    assert_matches!(
        pedidos.cambiar_estado(id, EstadoPedido::Cancelado).await,
        Err(ServiceError::Conflict(_))
    );
    assert_matches!(
        pedidos.cambiar_estado(id, EstadoPedido::Recibido).await,
        Err(ServiceError::Conflict(_))
    );

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    assert_eq!(fila.stock.cantidad, 6);
}

#[tokio::test]
async fn cancelar_un_pedido_no_toca_el_stock() {
    let app = TestApp::new().await;
    let proveedor = app.seed_proveedor("Bodega Central").await;
    let producto = app.seed_producto_con_stock("BOD-001", dec!(4.00), 7).await;

    let creado = app
        .state
        .services
        .pedidos
        .crear(pedido_basico(
            "P-0500",
            proveedor.id_proveedor,
            vec![linea(producto.id_producto, 30)],
        ))
        .await
        .unwrap();

    let cancelado = app
        .state
        .services
        .pedidos
        .cambiar_estado(creado.pedido.id_pedido, EstadoPedido::Cancelado)
        .await
        .unwrap();
    assert_eq!(cancelado.estado, EstadoPedido::Cancelado);

    let fila = app
        .state
        .services
        .stock
        .por_producto(producto.id_producto)
        .await
        .unwrap();
    assert_eq!(fila.stock.cantidad, 7);
}

#[tokio::test]
async fn un_pedido_no_se_crea_recibido() {
    let app = TestApp::new().await;
    let proveedor = app.seed_proveedor("Mayorista Andina").await;
    let producto = app.seed_producto_con_stock("AND-001", dec!(5.00), 0).await;

    let mut request = pedido_basico(
        "P-0600",
        proveedor.id_proveedor,
        vec![linea(producto.id_producto, 10)],
    );
    request.estado = Some(EstadoPedido::Recibido);

    let resultado = app.state.services.pedidos.crear(request).await;
    assert_matches!(resultado, Err(ServiceError::InvalidStatus(_)));
}
