//! Pruebas de propiedades sobre los invariantes puros del dominio:
//! ciclo de vida del pedido, calculo de paginacion y horas de jornada.

use chrono::NaiveDate;
use ferreteria_api::entities::horario;
use ferreteria_api::entities::pedido::EstadoPedido;
use ferreteria_api::PaginatedResponse;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::Iterable;

fn estado_strategy() -> impl Strategy<Value = EstadoPedido> {
    prop::sample::select(EstadoPedido::iter().collect::<Vec<_>>())
}

// Horas en centesimas dentro del dia: 0.00 a 24.00.
fn hora_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=2400).prop_map(|centesimas| Decimal::new(centesimas, 2))
}

fn jornada(entrada: Decimal, salida: Decimal) -> horario::Model {
    horario::Model {
        id_horario: 1,
        fecha: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
        hora_entrada: entrada,
        hora_salida: salida,
        observaciones: None,
        id_empleado: 1,
        fecha_registro: NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn los_estados_finales_no_admiten_transiciones(hacia in estado_strategy()) {
        prop_assert!(!EstadoPedido::Recibido.puede_transicionar_a(hacia));
        prop_assert!(!EstadoPedido::Cancelado.puede_transicionar_a(hacia));
    }

    #[test]
    fn ningun_estado_transiciona_a_si_mismo(estado in estado_strategy()) {
        prop_assert!(!estado.puede_transicionar_a(estado));
    }

    #[test]
    fn el_nombre_del_estado_va_y_vuelve(estado in estado_strategy()) {
        let escrito = estado.to_string();
        let leido: EstadoPedido = escrito.parse().unwrap();
        prop_assert_eq!(leido, estado);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn la_paginacion_cubre_todos_los_elementos(
        total in 0u64..100_000,
        per_page in 1u64..500,
    ) {
        let pagina = PaginatedResponse::<u64>::new(vec![], 1, per_page, total);

        // Las paginas alcanzan para todos los elementos y la ultima no sobra.
        prop_assert!(pagina.total_pages * per_page >= total);
        if total > 0 {
            prop_assert!((pagina.total_pages - 1) * per_page < total);
        } else {
            prop_assert_eq!(pagina.total_pages, 0);
        }
    }

    #[test]
    fn con_per_page_cero_no_hay_paginas(total in 0u64..100_000) {
        let pagina = PaginatedResponse::<u64>::new(vec![], 1, 0, total);
        prop_assert_eq!(pagina.total_pages, 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn las_horas_extra_nunca_superan_las_trabajadas(
        entrada in hora_strategy(),
        salida in hora_strategy(),
    ) {
        prop_assume!(entrada < salida);
        let registro = jornada(entrada, salida);

        let trabajadas = registro.horas_trabajadas();
        let extra = registro.horas_extra();

        prop_assert!(extra >= Decimal::ZERO);
        prop_assert!(extra <= trabajadas);
        // La parte ordinaria queda topada en la jornada de 8 horas.
        prop_assert!(trabajadas - extra <= dec!(8));
        prop_assert_eq!(extra > Decimal::ZERO, trabajadas > dec!(8));
    }
}
