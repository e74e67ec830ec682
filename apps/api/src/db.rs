use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::persistence::postgres::PgStore;
use crate::persistence::{NoopStore, Store};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Picks the store for this process. A missing URL, an unreachable database, or a
/// failed migration all leave the service running without persistence.
pub async fn connect_store(database_url: Option<&str>) -> Arc<dyn Store> {
    let Some(url) = database_url else {
        warn!("DATABASE_URL not set; running without persistence");
        return Arc::new(NoopStore);
    };

    let pool = match create_pool(url).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Database unavailable ({e}); running without persistence");
            return Arc::new(NoopStore);
        }
    };

    let store = PgStore::new(pool);
    if let Err(e) = store.migrate().await {
        warn!("Schema setup failed ({e}); running without persistence");
        return Arc::new(NoopStore);
    }
    Arc::new(store)
}
