use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

/// Administra el esquema de la base de datos de la ferreteria.
#[derive(Parser)]
#[command(name = "migration", version, about)]
struct Cli {
    /// URL de la base de datos; si falta se usa DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aplica las migraciones pendientes (accion por defecto)
    Up,
    /// Revierte las ultimas `steps` migraciones
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Revierte todo y vuelve a aplicar desde cero
    Fresh,
    /// Muestra el estado de cada migracion
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://ferreteria.db?mode=rwc".to_string());

    info!("Conectando a la base de datos: {}", database_url);
    let db = connect(&database_url).await?;

    match cli.command.unwrap_or(Commands::Up) {
        Commands::Up => {
            info!("Aplicando migraciones pendientes");
            Migrator::up(&db, None)
                .await
                .context("fallo aplicando las migraciones")?;
            info!("Migraciones aplicadas");
        }
        Commands::Down { steps } => {
            info!("Revirtiendo {} migraciones", steps);
            Migrator::down(&db, Some(steps))
                .await
                .context("fallo revirtiendo las migraciones")?;
            info!("Migraciones revertidas");
        }
        Commands::Fresh => {
            info!("Recreando el esquema desde cero");
            Migrator::fresh(&db)
                .await
                .context("fallo recreando el esquema")?;
            info!("Esquema recreado");
        }
        Commands::Status => {
            Migrator::status(&db)
                .await
                .context("fallo consultando el estado de las migraciones")?;
        }
    }

    Ok(())
}

async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    Database::connect(options)
        .await
        .context("no se pudo conectar a la base de datos")
}
