use anyhow::Result;
use common::config::DbConfig;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};

pub async fn create_pool(config: &DbConfig) -> Result<Pool<MySql>> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}
