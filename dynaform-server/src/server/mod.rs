pub mod app;
pub mod error;
pub mod handlers;

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

use anyhow::Result;
use dynaform::database::{connection::*, migrations::Migrator};
use sea_orm_migration::prelude::*;
use tracing::{info, warn};

use app::AppConfig;

pub async fn start_server(port: u16, database_path: &str, config: AppConfig) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    if config.payment_key_id.is_none() {
        info!("No payment key configured; paid forms cannot open orders");
    }
    if config.payment.key_secret.is_empty() {
        warn!("No payment secret configured; paid submissions will be refused");
    }
    if config.messaging.is_none() {
        info!("No messaging relay configured; passcodes will not be delivered");
    }

    let app = app::create_app(db, &config).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    info!("  /uploads/*                  - Uploaded files");
    info!("  /api/forms, /api/columns    - Form definitions (owner token)");
    info!("  /api/forms/:id/schema       - Assembled form schema");
    info!("  /api/forms/:id/submissions  - Submissions (userid header)");
    info!("  /api/payments/*             - Orders and paid submissions");
    info!("  /api/submitters/*           - Registration and passcodes");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::fresh(&db).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}
