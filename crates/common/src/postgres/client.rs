use crate::postgres::PostgresConfig;
use anyhow::Result;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::debug;

/// Pooled connections to the devices database
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    /// Builds the pool without connecting; connections open on first use.
    pub fn new(config: &PostgresConfig) -> Result<Self> {
        let pool_config = Config {
            host: Some(config.host.clone()),
            port: Some(config.port),
            dbname: Some(config.database.clone()),
            user: Some(config.username.clone()),
            password: Some(config.password.clone()),
            manager: Some(ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            }),
            pool: Some(PoolConfig::new(config.max_pool_size)),
            ..Config::default()
        };

        let pool = pool_config.create_pool(Some(Runtime::Tokio1), NoTls)?;
        debug!(
            host = %config.host,
            database = %config.database,
            max_pool_size = config.max_pool_size,
            "postgres pool created"
        );

        Ok(Self { pool })
    }

    pub fn max_pool_size(&self) -> usize {
        self.pool.status().max_size
    }

    /// Round-trips `SELECT 1` to confirm the database is reachable
    pub async fn ping(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.execute("SELECT 1", &[]).await?;
        debug!("postgres connection successful");
        Ok(())
    }

    pub async fn get_connection(&self) -> Result<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_sized_from_config() {
        let config = PostgresConfig {
            max_pool_size: 3,
            ..Default::default()
        };

        let client = PostgresClient::new(&config).unwrap();
        assert_eq!(client.max_pool_size(), 3);
    }
}
