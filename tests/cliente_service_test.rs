mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use ferreteria_api::{
    auth::roles,
    entities::cliente::TipoCliente,
    errors::ServiceError,
    services::{
        clientes::CrearClienteRequest,
        facturas::{CrearFacturaRequest, LineaFacturaRequest},
    },
};
use rust_decimal_macros::dec;
use serde_json::json;

fn cliente_completo(nombre: &str, email: &str, cedula: &str) -> CrearClienteRequest {
    CrearClienteRequest {
        nombre: nombre.to_string(),
        apellidos: "Gonzalez".to_string(),
        direccion: "Av. Central 10".to_string(),
        telefono: "02-111-2222".to_string(),
        email: Some(email.to_string()),
        cedula: Some(cedula.to_string()),
        tipo_cliente: None,
        limite_credito: None,
    }
}

#[tokio::test]
async fn el_email_y_la_cedula_no_se_repiten() {
    let app = TestApp::new().await;
    let clientes = &app.state.services.clientes;

    clientes
        .crear(cliente_completo("Pedro", "pedro@mail.com", "0912345678"))
        .await
        .expect("el primer cliente debia registrarse");

    let mismo_email = clientes
        .crear(cliente_completo("Pablo", "pedro@mail.com", "0987654321"))
        .await;
    assert_matches!(mismo_email, Err(ServiceError::Conflict(_)));

    let misma_cedula = clientes
        .crear(cliente_completo("Pablo", "pablo@mail.com", "0912345678"))
        .await;
    assert_matches!(misma_cedula, Err(ServiceError::Conflict(_)));

    assert!(!clientes.email_disponible("pedro@mail.com", None).await.unwrap());
    assert!(clientes.email_disponible("libre@mail.com", None).await.unwrap());
    assert!(!clientes.cedula_disponible("0912345678", None).await.unwrap());
}

#[tokio::test]
async fn el_telefono_solo_admite_digitos_y_guiones() {
    let app = TestApp::new().await;

    let mut request = cliente_completo("Carmen", "carmen@mail.com", "0955555555");
    request.telefono = "(02) 111 2222".to_string();

    let resultado = app.state.services.clientes.crear(request).await;
    assert_matches!(resultado, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn la_busqueda_ignora_mayusculas_y_el_filtro_respeta_el_tipo() {
    let app = TestApp::new().await;
    let clientes = &app.state.services.clientes;

    clientes
        .crear(cliente_completo("Margarita", "mar@mail.com", "0900000001"))
        .await
        .unwrap();
    let mut mayorista = cliente_completo("Constructora Pico", "pico@mail.com", "0900000002");
    mayorista.tipo_cliente = Some(TipoCliente::Mayorista);
    clientes.crear(mayorista).await.unwrap();

    let encontrados = clientes.buscar("margar").await.unwrap();
    assert_eq!(encontrados.len(), 1);
    assert_eq!(encontrados[0].nombre, "Margarita");

    let mayoristas = clientes.por_tipo(TipoCliente::Mayorista).await.unwrap();
    assert_eq!(mayoristas.len(), 1);
    assert_eq!(mayoristas[0].nombre, "Constructora Pico");

    let vip = clientes.por_tipo(TipoCliente::Vip).await.unwrap();
    assert!(vip.is_empty());
}

#[tokio::test]
async fn desactivar_no_borra_pero_lo_saca_del_padron_activo() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Esteban").await;

    let desactivado = app
        .state
        .services
        .clientes
        .cambiar_estado(cliente.id_cliente, false)
        .await
        .unwrap();
    assert!(!desactivado.activo);

    let activos = app.state.services.clientes.list_activos().await.unwrap();
    assert!(activos.iter().all(|c| c.id_cliente != cliente.id_cliente));

    // Sigue existiendo y puede consultarse por id.
    let recuperado = app
        .state
        .services
        .clientes
        .get(cliente.id_cliente)
        .await
        .unwrap();
    assert_eq!(recuperado.id_cliente, cliente.id_cliente);
}

#[tokio::test]
async fn no_se_elimina_un_cliente_con_facturas() {
    let app = TestApp::new().await;
    let cliente = app.seed_cliente("Victoria").await;
    let producto = app.seed_producto_con_stock("VIC-001", dec!(11.00), 5).await;

    app.state
        .services
        .facturas
        .crear(CrearFacturaRequest {
            numero_factura: "F-9000".to_string(),
            fecha: None,
            id_cliente: cliente.id_cliente,
            id_usuario: None,
            metodo_pago: None,
            estado: None,
            descuento: None,
            observaciones: None,
            detalles: vec![LineaFacturaRequest {
                id_producto: Some(producto.id_producto),
                cantidad: 1,
                precio_uni: None,
                descuento_item: None,
            }],
        })
        .await
        .unwrap();

    let bloqueado = app
        .state
        .services
        .clientes
        .eliminar(cliente.id_cliente)
        .await;
    assert_matches!(bloqueado, Err(ServiceError::Conflict(_)));

    // Sin facturas, el borrado procede.
    let libre = app.seed_cliente("Sofia").await;
    app.state
        .services
        .clientes
        .eliminar(libre.id_cliente)
        .await
        .expect("el cliente sin facturas debia eliminarse");
    assert_matches!(
        app.state.services.clientes.get(libre.id_cliente).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn las_estadisticas_cortan_el_padron_por_tipo() {
    let app = TestApp::new().await;
    let clientes = &app.state.services.clientes;

    clientes
        .crear(cliente_completo("Ana", "ana@mail.com", "0911111111"))
        .await
        .unwrap();
    let mut mayorista = cliente_completo("Ferreteria Sur", "sur@mail.com", "0922222222");
    mayorista.tipo_cliente = Some(TipoCliente::Mayorista);
    let mayorista = clientes.crear(mayorista).await.unwrap();
    let mut vip = cliente_completo("Hilda", "hilda@mail.com", "0933333333");
    vip.tipo_cliente = Some(TipoCliente::Vip);
    clientes.crear(vip).await.unwrap();

    clientes
        .cambiar_estado(mayorista.id_cliente, false)
        .await
        .unwrap();

    let stats = clientes.estadisticas().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.activos, 2);
    assert_eq!(stats.inactivos, 1);
    // Los cortes por tipo consideran solo cuentas activas.
    assert_eq!(stats.regulares, 1);
    assert_eq!(stats.mayoristas, 0);
    assert_eq!(stats.vip, 1);
}

#[tokio::test]
async fn el_vendedor_atiende_el_mostrador_pero_no_borra_clientes() {
    let app = TestApp::new().await;

    let alta = app
        .request_con_rol(
            Method::POST,
            "/api/clientes",
            Some(json!({
                "nombre": "Cliente",
                "apellidos": "De Mostrador",
                "direccion": "Calle 8",
                "telefono": "09-111-2233",
            })),
            roles::VENDEDOR,
        )
        .await;
    assert_eq!(alta.status(), StatusCode::CREATED);

    let (activos, id) = {
        let lista = app.state.services.clientes.list_activos().await.unwrap();
        (lista.len(), lista[0].id_cliente)
    };
    assert_eq!(activos, 1);

    let borrado = app
        .request_con_rol(
            Method::DELETE,
            &format!("/api/clientes/{}", id),
            None,
            roles::VENDEDOR,
        )
        .await;
    assert_eq!(borrado.status(), StatusCode::FORBIDDEN);

    let permitido = app
        .request_con_rol(
            Method::DELETE,
            &format!("/api/clientes/{}", id),
            None,
            roles::GERENTE,
        )
        .await;
    assert_eq!(permitido.status(), StatusCode::NO_CONTENT);
}
