pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_roles_table;
mod m20250301_000002_create_usuarios_table;
mod m20250301_000003_create_clientes_table;
mod m20250301_000004_create_empleados_table;
mod m20250301_000005_create_proveedores_table;
mod m20250301_000006_create_productos_table;
mod m20250301_000007_create_stock_table;
mod m20250301_000008_create_facturas_table;
mod m20250301_000009_create_detalle_facturas_table;
mod m20250301_000010_create_pedidos_table;
mod m20250301_000011_create_detalle_pedidos_table;
mod m20250301_000012_create_horarios_table;
mod m20250315_000013_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_roles_table::Migration),
            Box::new(m20250301_000002_create_usuarios_table::Migration),
            Box::new(m20250301_000003_create_clientes_table::Migration),
            Box::new(m20250301_000004_create_empleados_table::Migration),
            Box::new(m20250301_000005_create_proveedores_table::Migration),
            Box::new(m20250301_000006_create_productos_table::Migration),
            Box::new(m20250301_000007_create_stock_table::Migration),
            Box::new(m20250301_000008_create_facturas_table::Migration),
            Box::new(m20250301_000009_create_detalle_facturas_table::Migration),
            Box::new(m20250301_000010_create_pedidos_table::Migration),
            Box::new(m20250301_000011_create_detalle_pedidos_table::Migration),
            Box::new(m20250301_000012_create_horarios_table::Migration),
            Box::new(m20250315_000013_add_lookup_indexes::Migration),
        ]
    }
}
