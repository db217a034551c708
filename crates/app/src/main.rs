use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, DatabaseConnection};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "depot={level},server={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect_database(&settings.server.database, &settings.pool).await?;
    let engine = engine::Engine::builder().database(db.clone()).build().await?;

    let bind = settings
        .server
        .bind
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tokio::select! {
        result = server::run_with_listener(engine, listener) => {
            if let Err(err) = result {
                tracing::error!("server failed: {err}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    db.close().await?;
    Ok(())
}

async fn connect_database(
    database: &settings::Database,
    pool: &settings::Pool,
) -> Result<DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = ConnectOptions::new(database.url());
    options
        .max_connections(if database.is_memory() {
            1
        } else {
            pool.max_connections
        })
        .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
        .sqlx_logging(false);

    let db = sea_orm::Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    tracing::info!("database ready");
    Ok(db)
}
