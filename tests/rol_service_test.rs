mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use ferreteria_api::{
    auth::roles,
    errors::ServiceError,
    services::roles::{ActualizarRolRequest, CrearRolRequest},
};

#[tokio::test]
async fn los_nombres_de_rol_no_se_repiten() {
    let app = TestApp::new().await;

    app.seed_rol("SUPERVISOR").await;
    let repetido = app
        .state
        .services
        .roles
        .crear(CrearRolRequest {
            nombre: "SUPERVISOR".to_string(),
            descripcion: Some("duplicado".to_string()),
        })
        .await;

    assert_matches!(repetido, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn el_conteo_solo_considera_usuarios_activos() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::VENDEDOR).await;
    let activo = app.seed_usuario("mostrador1", "Secreta123*", rol.id_rol).await;
    let inactivo = app.seed_usuario("mostrador2", "Secreta123*", rol.id_rol).await;

    app.state
        .services
        .usuarios
        .cambiar_estado(inactivo.id_usuario, false)
        .await
        .unwrap();

    let detalle = app.state.services.roles.get(rol.id_rol).await.unwrap();
    assert_eq!(detalle.usuarios_count, 1);

    let cuentas = app
        .state
        .services
        .roles
        .usuarios_del_rol(rol.id_rol)
        .await
        .unwrap();
    // El listado nominal trae todas las cuentas, activas o no.
    assert_eq!(cuentas.len(), 2);
    assert!(cuentas.iter().any(|u| u.id_usuario == activo.id_usuario));
}

#[tokio::test]
async fn no_se_elimina_un_rol_mientras_tenga_usuarios() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::BODEGUERO).await;
    let usuario = app.seed_usuario("bodeguero1", "Secreta123*", rol.id_rol).await;

    let con_activos = app.state.services.roles.eliminar(rol.id_rol).await;
    assert_matches!(con_activos, Err(ServiceError::Conflict(_)));

    // Desactivar la cuenta no basta: sigue asociada al rol.
    app.state
        .services
        .usuarios
        .cambiar_estado(usuario.id_usuario, false)
        .await
        .unwrap();
    let con_asociados = app.state.services.roles.eliminar(rol.id_rol).await;
    assert_matches!(con_asociados, Err(ServiceError::Conflict(_)));

    // Sin cuentas, el rol por fin se borra.
    app.state
        .services
        .usuarios
        .eliminar(usuario.id_usuario)
        .await
        .unwrap();
    app.state
        .services
        .roles
        .eliminar(rol.id_rol)
        .await
        .expect("el rol sin usuarios debia eliminarse");

    assert_matches!(
        app.state.services.roles.get(rol.id_rol).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn actualizar_respeta_la_unicidad_del_nombre() {
    let app = TestApp::new().await;
    let cajas = app.seed_rol("CAJAS").await;
    app.seed_rol("DESPACHO").await;

    let choque = app
        .state
        .services
        .roles
        .actualizar(
            cajas.id_rol,
            ActualizarRolRequest {
                nombre: Some("DESPACHO".to_string()),
                descripcion: None,
                activo: None,
            },
        )
        .await;
    assert_matches!(choque, Err(ServiceError::Conflict(_)));

    let renombrado = app
        .state
        .services
        .roles
        .actualizar(
            cajas.id_rol,
            ActualizarRolRequest {
                nombre: Some("CAJA PRINCIPAL".to_string()),
                descripcion: Some("Atencion en ventanilla".to_string()),
                activo: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renombrado.nombre, "CAJA PRINCIPAL");
    assert_eq!(
        renombrado.descripcion.as_deref(),
        Some("Atencion en ventanilla")
    );
}

#[tokio::test]
async fn la_gestion_de_roles_es_exclusiva_del_administrador() {
    let app = TestApp::new().await;
    app.seed_rol("AUDITORIA").await;

    let negado = app
        .request_con_rol(Method::GET, "/api/roles", None, roles::GERENTE)
        .await;
    assert_eq!(negado.status(), StatusCode::FORBIDDEN);

    let admitido = app
        .request_con_rol(Method::GET, "/api/roles", None, roles::ADMINISTRADOR)
        .await;
    assert_eq!(admitido.status(), StatusCode::OK);
}
