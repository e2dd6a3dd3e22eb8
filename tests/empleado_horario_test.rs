mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use common::TestApp;
use ferreteria_api::{
    auth::roles,
    entities::empleado,
    errors::ServiceError,
    services::{
        empleados::CrearEmpleadoRequest,
        horarios::{ActualizarHorarioRequest, CrearHorarioRequest},
    },
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn empleado_basico(nombre: &str, cedula: &str) -> CrearEmpleadoRequest {
    CrearEmpleadoRequest {
        nombre: nombre.to_string(),
        apellidos: "Jimenez".to_string(),
        direccion: "Barrio La Floresta".to_string(),
        telefono: "02-333-4444".to_string(),
        email: None,
        cedula: cedula.to_string(),
        puesto: "Despachador".to_string(),
        salario: dec!(460.00),
        fecha_ingreso: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
    }
}

fn jornada(id_empleado: i64, fecha: NaiveDate, entrada: Decimal, salida: Decimal) -> CrearHorarioRequest {
    CrearHorarioRequest {
        fecha,
        hora_entrada: entrada,
        hora_salida: salida,
        observaciones: None,
        id_empleado,
    }
}

async fn seed_empleado(app: &TestApp, nombre: &str, cedula: &str) -> empleado::Model {
    app.state
        .services
        .empleados
        .crear(empleado_basico(nombre, cedula))
        .await
        .expect("no se pudo sembrar el empleado")
}

#[tokio::test]
async fn la_cedula_de_empleado_no_se_repite() {
    let app = TestApp::new().await;

    seed_empleado(&app, "Jorge", "1712345678").await;
    let repetido = app
        .state
        .services
        .empleados
        .crear(empleado_basico("Julia", "1712345678"))
        .await;

    assert_matches!(repetido, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn el_salario_debe_ser_positivo() {
    let app = TestApp::new().await;

    let mut request = empleado_basico("Raul", "1799999999");
    request.salario = dec!(0);

    let resultado = app.state.services.empleados.crear(request).await;
    assert_matches!(resultado, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn la_jornada_valida_su_rango_horario() {
    let app = TestApp::new().await;
    let empleado = seed_empleado(&app, "Lucia", "1711111111").await;
    let fecha = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

    // Entrada y salida iguales no forman jornada.
    let vacia = app
        .state
        .services
        .horarios
        .crear(jornada(empleado.id_empleado, fecha, dec!(8), dec!(8)))
        .await;
    assert_matches!(vacia, Err(ServiceError::ValidationError(_)));

    // Tampoco una salida fuera del dia.
    let desbordada = app
        .state
        .services
        .horarios
        .crear(jornada(empleado.id_empleado, fecha, dec!(8), dec!(25)))
        .await;
    assert_matches!(desbordada, Err(ServiceError::ValidationError(_)));

    let valida = app
        .state
        .services
        .horarios
        .crear(jornada(empleado.id_empleado, fecha, dec!(8), dec!(17.5)))
        .await
        .expect("la jornada valida debia registrarse");
    assert_eq!(valida.horas_trabajadas(), dec!(9.5));
    assert_eq!(valida.horas_extra(), dec!(1.5));
}

#[tokio::test]
async fn la_jornada_exige_un_empleado_existente() {
    let app = TestApp::new().await;
    let fecha = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

    let resultado = app
        .state
        .services
        .horarios
        .crear(jornada(999, fecha, dec!(8), dec!(16)))
        .await;
    assert_matches!(resultado, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn las_jornadas_se_listan_por_empleado_mas_recientes_primero() {
    let app = TestApp::new().await;
    let lucia = seed_empleado(&app, "Lucia", "1722222222").await;
    let mario = seed_empleado(&app, "Mario", "1733333333").await;
    let horarios = &app.state.services.horarios;

    let lunes = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    let martes = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

    horarios
        .crear(jornada(lucia.id_empleado, lunes, dec!(8), dec!(16)))
        .await
        .unwrap();
    horarios
        .crear(jornada(lucia.id_empleado, martes, dec!(9), dec!(17)))
        .await
        .unwrap();
    horarios
        .crear(jornada(mario.id_empleado, lunes, dec!(14), dec!(22)))
        .await
        .unwrap();

    let de_lucia = horarios.por_empleado(lucia.id_empleado).await.unwrap();
    assert_eq!(de_lucia.len(), 2);
    assert_eq!(de_lucia[0].fecha, martes);
    assert_eq!(de_lucia[1].fecha, lunes);

    let inexistente = horarios.por_empleado(999).await;
    assert_matches!(inexistente, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn actualizar_valida_el_rango_combinado() {
    let app = TestApp::new().await;
    let empleado = seed_empleado(&app, "Elsa", "1744444444").await;
    let fecha = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();

    let registrada = app
        .state
        .services
        .horarios
        .crear(jornada(empleado.id_empleado, fecha, dec!(10), dec!(18)))
        .await
        .unwrap();

    // Cambiar solo la salida se valida contra la entrada vigente.
    let invertida = app
        .state
        .services
        .horarios
        .actualizar(
            registrada.id_horario,
            ActualizarHorarioRequest {
                fecha: None,
                hora_entrada: None,
                hora_salida: Some(dec!(9)),
                observaciones: None,
                id_empleado: None,
            },
        )
        .await;
    assert_matches!(invertida, Err(ServiceError::ValidationError(_)));

    let extendida = app
        .state
        .services
        .horarios
        .actualizar(
            registrada.id_horario,
            ActualizarHorarioRequest {
                fecha: None,
                hora_entrada: None,
                hora_salida: Some(dec!(19)),
                observaciones: Some("Inventario anual".to_string()),
                id_empleado: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(extendida.hora_salida, dec!(19));
    assert_eq!(extendida.observaciones.as_deref(), Some("Inventario anual"));
}

#[tokio::test]
async fn no_se_elimina_un_empleado_con_jornadas() {
    let app = TestApp::new().await;
    let empleado = seed_empleado(&app, "Hugo", "1755555555").await;
    let fecha = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();

    let registrada = app
        .state
        .services
        .horarios
        .crear(jornada(empleado.id_empleado, fecha, dec!(8), dec!(16)))
        .await
        .unwrap();

    let bloqueado = app
        .state
        .services
        .empleados
        .eliminar(empleado.id_empleado)
        .await;
    assert_matches!(bloqueado, Err(ServiceError::Conflict(_)));

    app.state
        .services
        .horarios
        .eliminar(registrada.id_horario)
        .await
        .unwrap();
    app.state
        .services
        .empleados
        .eliminar(empleado.id_empleado)
        .await
        .expect("sin jornadas el empleado debia eliminarse");
}

#[tokio::test]
async fn el_personal_es_asunto_de_gerencia() {
    let app = TestApp::new().await;

    let negado = app
        .request_con_rol(Method::GET, "/api/empleados", None, roles::VENDEDOR)
        .await;
    assert_eq!(negado.status(), StatusCode::FORBIDDEN);

    let horarios_negado = app
        .request_con_rol(Method::GET, "/api/horarios", None, roles::BODEGUERO)
        .await;
    assert_eq!(horarios_negado.status(), StatusCode::FORBIDDEN);

    let admitido = app
        .request_con_rol(Method::GET, "/api/empleados", None, roles::GERENTE)
        .await;
    assert_eq!(admitido.status(), StatusCode::OK);
}
