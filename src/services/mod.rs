// Catalogo y terceros
pub mod clientes;
pub mod empleados;
pub mod productos;
pub mod proveedores;

// Ventas y compras
pub mod facturas;
pub mod pedidos;

// Inventario
pub mod stock;

// Personal y jornadas
pub mod horarios;

// Seguridad y cuentas
pub mod roles;
pub mod usuarios;

pub(crate) mod validacion {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        static ref TELEFONO_RE: Regex = Regex::new(r"^[0-9-]+$").unwrap();
    }

    /// Telefonos locales: solo digitos y guiones (ej. 02-234-5678).
    pub fn telefono_valido(telefono: &str) -> bool {
        TELEFONO_RE.is_match(telefono)
    }
}

#[cfg(test)]
mod validacion_tests {
    use super::validacion::telefono_valido;
    use rstest::rstest;

    #[rstest]
    #[case("02-234-5678", true)]
    #[case("0998765432", true)]
    #[case("099-876-5432", true)]
    #[case("(02) 234 5678", false)]
    #[case("+593998765432", false)]
    #[case("sin numero", false)]
    #[case("", false)]
    fn telefono_solo_admite_digitos_y_guiones(#[case] telefono: &str, #[case] valido: bool) {
        assert_eq!(telefono_valido(telefono), valido);
    }
}
