use business_registry::{
    build_store, models::Record, RegistryConfig, RemoteStore, TableRepository,
};
use std::sync::Arc;

/// Store handle shared by every table the CLI touches
pub struct RegistryApi {
    store: Arc<dyn RemoteStore>,
}

impl RegistryApi {
    /// Connect using `STORE_BACKEND`, `DATABASE_URL`, `SUPABASE_URL` and `SUPABASE_KEY`
    pub async fn connect() -> anyhow::Result<Self> {
        let config = RegistryConfig::from_env()?;
        let store = build_store(&config).await?;
        Ok(Self { store })
    }

    pub fn table(&self, name: &str) -> TableRepository<Record> {
        TableRepository::new(Arc::clone(&self.store), name)
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}
