//! Carga datos de demostracion en la base de la ferreteria.
//!
//! Ejecutar con: cargo run --bin seed-data
//!
//! Crea:
//! - Los cinco roles del sistema y un usuario administrador (admin / Admin123*)
//! - 3 proveedores y 10 productos de ferreteria con su stock inicial
//! - 4 clientes y 2 empleados de mostrador

use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter, Set,
};
use std::time::Duration;
use tracing::info;

use ferreteria_api::auth::roles::{ADMINISTRADOR, DEFAULT_ROLES};
use ferreteria_api::entities::{cliente, empleado, producto, proveedor, rol, stock, usuario};
use ferreteria_api::services::usuarios::hash_contrasena;
use migrations::{Migrator, MigratorTrait};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Datos de demostracion de ferreteria-api ===");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://ferreteria.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10));

    info!("Conectando a la base de datos: {}", database_url);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    info!("Sembrando roles...");
    let id_rol_admin = seed_roles(&db).await?;

    info!("Creando usuario administrador...");
    seed_admin(&db, id_rol_admin).await?;

    info!("Creando proveedores...");
    let proveedores = seed_proveedores(&db).await?;
    info!("  {} proveedores", proveedores.len());

    info!("Creando productos con stock inicial...");
    let productos = seed_productos(&db, &proveedores).await?;
    info!("  {} productos", productos);

    info!("Creando clientes...");
    let clientes = seed_clientes(&db).await?;
    info!("  {} clientes", clientes);

    info!("Creando empleados...");
    let empleados = seed_empleados(&db).await?;
    info!("  {} empleados", empleados);

    info!("=== Carga completada ===");
    info!("Inicie sesion con:");
    info!("  curl -X POST http://localhost:8080/api/auth/login \\");
    info!("    -H 'Content-Type: application/json' \\");
    info!("    -d '{{\"nombre_usuario\":\"admin\",\"contrasena\":\"Admin123*\"}}'");
    info!("");
    info!("Documentacion interactiva en: http://localhost:8080/docs");

    Ok(())
}

/// Inserta los roles que falten y devuelve el id del rol ADMINISTRADOR.
async fn seed_roles(db: &sea_orm::DatabaseConnection) -> anyhow::Result<i64> {
    let ahora = Utc::now().naive_utc();

    for (nombre, descripcion) in DEFAULT_ROLES {
        let existente = rol::Entity::find()
            .filter(rol::Column::Nombre.eq(*nombre))
            .one(db)
            .await?;
        if existente.is_none() {
            rol::ActiveModel {
                nombre: Set((*nombre).to_string()),
                descripcion: Set(Some((*descripcion).to_string())),
                activo: Set(true),
                fecha_creacion: Set(ahora),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    let admin = rol::Entity::find()
        .filter(rol::Column::Nombre.eq(ADMINISTRADOR))
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("el rol ADMINISTRADOR no quedo sembrado"))?;

    Ok(admin.id_rol)
}

async fn seed_admin(db: &sea_orm::DatabaseConnection, id_rol_admin: i64) -> anyhow::Result<()> {
    let existente = usuario::Entity::find()
        .filter(usuario::Column::NombreUsuario.eq("admin"))
        .one(db)
        .await?;
    if existente.is_some() {
        info!("  el usuario admin ya existe; se conserva");
        return Ok(());
    }

    let ahora = Utc::now().naive_utc();
    usuario::ActiveModel {
        nombre_usuario: Set("admin".to_string()),
        contrasena: Set(hash_contrasena("Admin123*")?),
        email: Set(Some("admin@ferreteria.local".to_string())),
        nombre: Set(Some("Administrador".to_string())),
        apellidos: Set(Some("del Sistema".to_string())),
        telefono: Set(None),
        activo: Set(true),
        ultimo_acceso: Set(None),
        intentos_fallidos: Set(0),
        id_rol: Set(id_rol_admin),
        fecha_creacion: Set(ahora),
        fecha_modificacion: Set(ahora),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}

async fn seed_proveedores(
    db: &sea_orm::DatabaseConnection,
) -> anyhow::Result<Vec<proveedor::Model>> {
    let datos = vec![
        (
            "Aceros del Norte S.A.",
            "Av. Industrial 452, Zona Norte",
            "02-2456-789",
            "ventas@acerosdelnorte.com",
            "Maria Fernandez",
            "1790012345001",
            "Credito 30 dias",
            dec!(4.5),
        ),
        (
            "Distribuidora El Tornillo",
            "Calle Comercio 88",
            "02-2890-123",
            "pedidos@eltornillo.com",
            "Jorge Paredes",
            "1791234567001",
            "Contado",
            dec!(4.0),
        ),
        (
            "Pinturas y Acabados Cia. Ltda.",
            "Panamericana Sur Km 12",
            "03-2744-560",
            "contacto@pinturasyacabados.com",
            "Lucia Andrade",
            "0992345678001",
            "Credito 15 dias",
            dec!(3.5),
        ),
    ];

    let ahora = Utc::now().naive_utc();
    let mut creados = Vec::new();

    for (nombre, direccion, telefono, email, contacto, ruc, condiciones, calificacion) in datos {
        let modelo = proveedor::ActiveModel {
            nombre_proveedor: Set(nombre.to_string()),
            direccion: Set(direccion.to_string()),
            telefono: Set(telefono.to_string()),
            email: Set(Some(email.to_string())),
            contacto_principal: Set(Some(contacto.to_string())),
            ruc: Set(Some(ruc.to_string())),
            condiciones_pago: Set(condiciones.to_string()),
            calificacion: Set(calificacion),
            activo: Set(true),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        }
        .insert(db)
        .await?;
        creados.push(modelo);
    }

    Ok(creados)
}

async fn seed_productos(
    db: &sea_orm::DatabaseConnection,
    proveedores: &[proveedor::Model],
) -> anyhow::Result<usize> {
    // (nombre, codigo, categoria, marca, precio, precio_compra, unidad, stock_minimo, cantidad inicial)
    let datos = vec![
        ("Martillo de una 16oz", "HER-001", "Herramientas", "Stanley", dec!(12.50), dec!(8.00), "unidad", 5, 40),
        ("Taladro percutor 650W", "HER-002", "Herramientas", "Bosch", dec!(89.90), dec!(62.00), "unidad", 2, 12),
        ("Juego de destornilladores x6", "HER-003", "Herramientas", "Truper", dec!(15.75), dec!(10.50), "juego", 4, 25),
        ("Clavos 2\" caja 1kg", "FIJ-001", "Fijaciones", "Nacional", dec!(3.20), dec!(2.10), "caja", 20, 150),
        ("Tornillo autorroscante 1\" x100", "FIJ-002", "Fijaciones", "Hilti", dec!(5.80), dec!(3.90), "caja", 15, 90),
        ("Pintura latex blanca galon", "PIN-001", "Pinturas", "Condor", dec!(18.90), dec!(13.20), "galon", 8, 60),
        ("Thinner laca litro", "PIN-002", "Pinturas", "Condor", dec!(4.50), dec!(3.00), "litro", 10, 45),
        ("Tubo PVC 1/2\" x 3m", "PLO-001", "Plomeria", "Plastigama", dec!(6.40), dec!(4.30), "unidad", 12, 80),
        ("Llave de paso 1/2\"", "PLO-002", "Plomeria", "FV", dec!(9.75), dec!(6.80), "unidad", 6, 30),
        ("Cable gemelo #14 metro", "ELE-001", "Electricidad", "Electrocable", dec!(1.10), dec!(0.72), "metro", 50, 300),
    ];

    let ahora = Utc::now().naive_utc();
    let mut count = 0;

    for (i, (nombre, codigo, categoria, marca, precio, compra, unidad, minimo, inicial)) in
        datos.into_iter().enumerate()
    {
        let proveedor = &proveedores[i % proveedores.len()];
        let modelo = producto::ActiveModel {
            nombre_producto: Set(nombre.to_string()),
            descripcion: Set(None),
            codigo_producto: Set(codigo.to_string()),
            categoria: Set(categoria.to_string()),
            marca: Set(Some(marca.to_string())),
            precio: Set(precio),
            precio_compra: Set(Some(compra)),
            unidad_medida: Set(unidad.to_string()),
            stock_minimo: Set(minimo),
            activo: Set(true),
            id_proveedor: Set(Some(proveedor.id_proveedor)),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        }
        .insert(db)
        .await?;

        stock::ActiveModel {
            id_producto: Set(modelo.id_producto),
            cantidad: Set(inicial),
            ubicacion: Set("ALMACEN PRINCIPAL".to_string()),
            fecha_ultimo_movimiento: Set(ahora),
            ..Default::default()
        }
        .insert(db)
        .await?;

        count += 1;
    }

    Ok(count)
}

async fn seed_clientes(db: &sea_orm::DatabaseConnection) -> anyhow::Result<usize> {
    let datos = vec![
        (
            "Carlos",
            "Mendoza Rios",
            "Av. Los Pinos 123",
            "099-123-4567",
            "carlos.mendoza@example.com",
            "1712345678",
            cliente::TipoCliente::Regular,
            dec!(0),
        ),
        (
            "Ana",
            "Torres Vega",
            "Calle Bolivar 45",
            "098-765-4321",
            "ana.torres@example.com",
            "1723456789",
            cliente::TipoCliente::Mayorista,
            dec!(1500),
        ),
        (
            "Constructora Pichincha",
            "S.A.",
            "Av. Republica 900",
            "02-2334-455",
            "compras@cpichincha.com",
            "1790456789",
            cliente::TipoCliente::Vip,
            dec!(5000),
        ),
        (
            "Luis",
            "Caiza Pumasunta",
            "Barrio La Florida, pasaje 4",
            "096-555-0110",
            "luis.caiza@example.com",
            "1734567890",
            cliente::TipoCliente::Regular,
            dec!(0),
        ),
    ];

    let ahora = Utc::now().naive_utc();
    let mut count = 0;

    for (nombre, apellidos, direccion, telefono, email, cedula, tipo, limite) in datos {
        cliente::ActiveModel {
            nombre: Set(nombre.to_string()),
            apellidos: Set(apellidos.to_string()),
            direccion: Set(direccion.to_string()),
            telefono: Set(telefono.to_string()),
            email: Set(Some(email.to_string())),
            cedula: Set(Some(cedula.to_string())),
            tipo_cliente: Set(tipo),
            limite_credito: Set(limite),
            activo: Set(true),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        }
        .insert(db)
        .await?;
        count += 1;
    }

    Ok(count)
}

async fn seed_empleados(db: &sea_orm::DatabaseConnection) -> anyhow::Result<usize> {
    let datos = vec![
        (
            "Rosa",
            "Quishpe Lema",
            "Av. Occidental 210",
            "097-222-3344",
            "rosa.quishpe@ferreteria.local",
            "1745678901",
            "Vendedora",
            dec!(520.00),
        ),
        (
            "Miguel",
            "Sandoval Cruz",
            "Calle Cuenca 77",
            "098-111-2233",
            "miguel.sandoval@ferreteria.local",
            "1756789012",
            "Bodeguero",
            dec!(540.00),
        ),
    ];

    let ahora = Utc::now().naive_utc();
    let hoy = Utc::now().date_naive();
    let mut count = 0;

    for (nombre, apellidos, direccion, telefono, email, cedula, puesto, salario) in datos {
        empleado::ActiveModel {
            nombre: Set(nombre.to_string()),
            apellidos: Set(apellidos.to_string()),
            direccion: Set(direccion.to_string()),
            telefono: Set(telefono.to_string()),
            email: Set(Some(email.to_string())),
            cedula: Set(cedula.to_string()),
            puesto: Set(puesto.to_string()),
            salario: Set(salario),
            fecha_ingreso: Set(hoy),
            activo: Set(true),
            fecha_registro: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        }
        .insert(db)
        .await?;
        count += 1;
    }

    Ok(count)
}
