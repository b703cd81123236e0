//! Store selection from the environment: `STORE_BACKEND`, `DATABASE_URL`,
//! `DATABASE_MAX_CONNECTIONS`, `SUPABASE_URL` and `SUPABASE_KEY`.

use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::store::{MemoryStore, PgStore, PostgresConfig, PostgrestConfig, PostgrestStore, RemoteStore};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Postgrest,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "postgrest" | "supabase" => Ok(StoreBackend::Postgrest),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown STORE_BACKEND '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Postgrest => "postgrest",
            StoreBackend::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub backend: StoreBackend,
    pub postgres: Option<PostgresConfig>,
    pub postgrest: Option<PostgrestConfig>,
}

impl RegistryConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let supabase_url = var("SUPABASE_URL");
        let database_url = var("DATABASE_URL");

        let backend = match var("STORE_BACKEND") {
            Some(name) => name.parse()?,
            None if supabase_url.is_some() => StoreBackend::Postgrest,
            None if database_url.is_some() => StoreBackend::Postgres,
            None => bail!("no store configured: set SUPABASE_URL, DATABASE_URL or STORE_BACKEND"),
        };

        let postgres = match (&database_url, backend) {
            (Some(url), _) => Some(PostgresConfig {
                connection_string: url.clone(),
                max_connections: match var("DATABASE_MAX_CONNECTIONS") {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS '{}'", raw))?,
                    None => DEFAULT_MAX_CONNECTIONS,
                },
            }),
            (None, StoreBackend::Postgres) => bail!("DATABASE_URL is required for the postgres backend"),
            (None, _) => None,
        };

        let postgrest = match (supabase_url, backend) {
            (Some(url), _) => Some(PostgrestConfig {
                url,
                api_key: var("SUPABASE_KEY").ok_or_else(|| anyhow!("SUPABASE_KEY is not set"))?,
            }),
            (None, StoreBackend::Postgrest) => bail!("SUPABASE_URL is required for the postgrest backend"),
            (None, _) => None,
        };

        Ok(Self {
            backend,
            postgres,
            postgrest,
        })
    }
}

/// Builds the one store shared by every repository.
pub async fn build_store(config: &RegistryConfig) -> Result<Arc<dyn RemoteStore>> {
    info!(backend = %config.backend, "building store");
    let store: Arc<dyn RemoteStore> = match config.backend {
        StoreBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .ok_or_else(|| anyhow!("postgres backend selected without DATABASE_URL"))?;
            Arc::new(
                PgStore::connect(pg)
                    .await
                    .context("failed to connect to Postgres")?,
            )
        }
        StoreBackend::Postgrest => {
            let rest = config
                .postgrest
                .as_ref()
                .ok_or_else(|| anyhow!("postgrest backend selected without SUPABASE_URL"))?;
            Arc::new(PostgrestStore::new(rest).context("failed to build REST client")?)
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
