mod common;

use assert_matches::assert_matches;
use axum::{
    body,
    http::{Method, StatusCode},
    response::Response,
};
use common::TestApp;
use ferreteria_api::{
    auth::roles,
    errors::ServiceError,
    services::usuarios::CambiarContrasenaRequest,
};
use serde_json::{json, Value};

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("cuerpo de la respuesta");
    serde_json::from_slice(&bytes).expect("respuesta JSON")
}

#[tokio::test]
async fn login_correcto_reinicia_el_contador_de_intentos() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::VENDEDOR).await;
    let usuario = app.seed_usuario("cajero1", "Secreta123*", rol.id_rol).await;

    // Un fallo deja rastro en el contador.
    let fallido = app
        .state
        .services
        .usuarios
        .login("cajero1", "equivocada")
        .await;
    assert_matches!(fallido, Err(ServiceError::AuthError(_)));

    let cuenta = app.state.services.usuarios.get(usuario.id_usuario).await.unwrap();
    assert_eq!(cuenta.usuario.intentos_fallidos, 1);

    // El acceso correcto lo limpia y registra el ultimo acceso.
    let (conectado, rol_activo) = app
        .state
        .services
        .usuarios
        .login("cajero1", "Secreta123*")
        .await
        .expect("las credenciales correctas debian funcionar");

    assert_eq!(conectado.intentos_fallidos, 0);
    assert!(conectado.ultimo_acceso.is_some());
    assert_eq!(rol_activo.nombre, roles::VENDEDOR);
}

#[tokio::test]
async fn cinco_fallos_seguidos_bloquean_la_cuenta() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::VENDEDOR).await;
    let usuario = app.seed_usuario("cajero2", "Secreta123*", rol.id_rol).await;

    for _ in 0..5 {
        let _ = app
            .state
            .services
            .usuarios
            .login("cajero2", "equivocada")
            .await;
    }

    // Ni siquiera la contrasena correcta abre la cuenta bloqueada.
    let bloqueado = app
        .state
        .services
        .usuarios
        .login("cajero2", "Secreta123*")
        .await;
    assert_matches!(bloqueado, Err(ServiceError::AuthError(ref m)) if m.contains("bloqueada"));

    // Reactivarla pone el contador en cero y restaura el acceso.
    app.state
        .services
        .usuarios
        .cambiar_estado(usuario.id_usuario, true)
        .await
        .unwrap();

    app.state
        .services
        .usuarios
        .login("cajero2", "Secreta123*")
        .await
        .expect("la cuenta reactivada debia iniciar sesion");
}

#[tokio::test]
async fn una_cuenta_desactivada_no_inicia_sesion() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::BODEGUERO).await;
    let usuario = app.seed_usuario("bodega1", "Secreta123*", rol.id_rol).await;

    app.state
        .services
        .usuarios
        .cambiar_estado(usuario.id_usuario, false)
        .await
        .unwrap();

    let resultado = app
        .state
        .services
        .usuarios
        .login("bodega1", "Secreta123*")
        .await;
    assert_matches!(resultado, Err(ServiceError::AuthError(ref m)) if m.contains("desactivada"));
}

#[tokio::test]
async fn cambiar_contrasena_exige_la_actual() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::GERENTE).await;
    let usuario = app.seed_usuario("gerente1", "Original123*", rol.id_rol).await;

    let rechazo = app
        .state
        .services
        .usuarios
        .cambiar_contrasena(
            usuario.id_usuario,
            CambiarContrasenaRequest {
                contrasena_actual: "equivocada".to_string(),
                contrasena_nueva: "Renovada456*".to_string(),
            },
        )
        .await;
    assert_matches!(rechazo, Err(ServiceError::ValidationError(_)));

    app.state
        .services
        .usuarios
        .cambiar_contrasena(
            usuario.id_usuario,
            CambiarContrasenaRequest {
                contrasena_actual: "Original123*".to_string(),
                contrasena_nueva: "Renovada456*".to_string(),
            },
        )
        .await
        .expect("el cambio con la contrasena correcta debia funcionar");

    // La vieja deja de servir, la nueva abre sesion.
    assert_matches!(
        app.state.services.usuarios.login("gerente1", "Original123*").await,
        Err(ServiceError::AuthError(_))
    );
    app.state
        .services
        .usuarios
        .login("gerente1", "Renovada456*")
        .await
        .expect("la contrasena nueva debia funcionar");
}

#[tokio::test]
async fn el_endpoint_de_login_entrega_tokens_utilizables() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::ADMINISTRADOR).await;
    app.seed_usuario("admin", "Admin123*", rol.id_rol).await;

    let respuesta = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "nombre_usuario": "admin", "contrasena": "Admin123*" })),
            None,
        )
        .await;
    assert_eq!(respuesta.status(), StatusCode::OK);

    let cuerpo = response_json(respuesta).await;
    assert_eq!(cuerpo["success"], true);
    let access_token = cuerpo["data"]["access_token"]
        .as_str()
        .expect("el login debia devolver access_token")
        .to_string();
    assert_eq!(cuerpo["data"]["token_type"], "Bearer");

    // El token emitido abre una ruta reservada al administrador.
    let protegida = app
        .request(Method::GET, "/api/usuarios", None, Some(&access_token))
        .await;
    assert_eq!(protegida.status(), StatusCode::OK);
}

#[tokio::test]
async fn el_refresco_rota_el_token() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::ADMINISTRADOR).await;
    app.seed_usuario("admin2", "Admin123*", rol.id_rol).await;

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "nombre_usuario": "admin2", "contrasena": "Admin123*" })),
            None,
        )
        .await;
    let cuerpo = response_json(login).await;
    let refresh_token = cuerpo["data"]["refresh_token"].as_str().unwrap().to_string();

    let canje = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(canje.status(), StatusCode::OK);
    let renovado = response_json(canje).await;
    assert!(renovado["data"]["access_token"].as_str().is_some());

    // El refresco ya canjeado no puede reutilizarse.
    let reuso = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(reuso.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn las_credenciales_invalidas_responden_401_por_http() {
    let app = TestApp::new().await;
    let rol = app.seed_rol(roles::VENDEDOR).await;
    app.seed_usuario("cajero3", "Secreta123*", rol.id_rol).await;

    let respuesta = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "nombre_usuario": "cajero3", "contrasena": "otra" })),
            None,
        )
        .await;
    assert_eq!(respuesta.status(), StatusCode::UNAUTHORIZED);

    let cuerpo = response_json(respuesta).await;
    assert_eq!(cuerpo["error"], "Unauthorized");
}

#[tokio::test]
async fn sin_token_las_rutas_protegidas_responden_401() {
    let app = TestApp::new().await;

    let sin_token = app.request(Method::GET, "/api/clientes", None, None).await;
    assert_eq!(sin_token.status(), StatusCode::UNAUTHORIZED);

    let token_invalido = app
        .request(Method::GET, "/api/clientes", None, Some("no-es-un-jwt"))
        .await;
    assert_eq!(token_invalido.status(), StatusCode::UNAUTHORIZED);

    // El estado del servicio, en cambio, es publico.
    let estado = app.request(Method::GET, "/api/status", None, None).await;
    assert_eq!(estado.status(), StatusCode::OK);
}
