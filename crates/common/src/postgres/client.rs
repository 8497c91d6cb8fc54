use anyhow::Result;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio::sync::OnceCell;
use tokio_postgres::NoTls;
use tracing::debug;

use super::PostgresConfig;

/// PostgreSQL client wrapper with connection pooling
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    /// Creates a new PostgreSQL client with connection pooling.
    ///
    /// No connection is opened until the first query.
    pub fn new(config: &PostgresConfig) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.host = Some(config.host.clone());
        cfg.port = Some(config.port);
        cfg.dbname = Some(config.database.clone());
        cfg.user = Some(config.username.clone());
        cfg.password = Some(config.password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        pool.resize(config.max_pool_size);

        Ok(Self { pool })
    }

    /// Pings the database to verify connectivity
    pub async fn ping(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.execute("SELECT 1", &[]).await?;
        debug!("postgreSQL connection successful");
        Ok(())
    }

    /// Gets a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }
}

/// Process-wide PostgreSQL client created on first use.
///
/// Concurrent first callers share a single initialization; a failed
/// initialization leaves the cell empty so the next caller retries.
pub struct SharedPostgresClient {
    config: PostgresConfig,
    client: OnceCell<PostgresClient>,
}

impl SharedPostgresClient {
    pub fn new(config: PostgresConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Returns the shared client, creating and pinging it on first use
    pub async fn get(&self) -> Result<&PostgresClient> {
        self.client
            .get_or_try_init(|| async {
                debug!(host = %self.config.host, database = %self.config.database, "initializing shared postgres client");
                let client = PostgresClient::new(&self.config)?;
                client.ping().await?;
                Ok::<_, anyhow::Error>(client)
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }
}
