#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a store feature: `memory` or `sqlite`.");

use fulfillment_types::domain::order::{Order, OrderStatus};
use fulfillment_types::ports::status_store::{StatusStore, StoreError};
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://orders.db";

/// The status store selected by the enabled features.
pub enum Store {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteStore),
}

pub async fn build_store(url: Option<&str>) -> anyhow::Result<Store> {
    Store::build(url).await
}

impl Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::Memory(memory::InMemoryStore::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        Ok(Self::Sqlite(sqlite::SqliteStore::new(url).await?))
    }

    // With both features on, an explicit URL selects SQLite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Self::Sqlite(sqlite::SqliteStore::new(url).await?)),
            None => Ok(Self::Memory(memory::InMemoryStore::new())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Store::Sqlite(_) => "sqlite",
        }
    }

    pub async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(s) => {
                s.insert(order.clone());
                Ok(())
            }
            #[cfg(feature = "sqlite")]
            Store::Sqlite(s) => s.insert(order).await,
        }
    }
}

#[async_trait::async_trait]
impl StatusStore for Store {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(s) => s.get(order_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(s) => s.get(order_id).await,
        }
    }

    async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(s) => s.set_status(order_id, status).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(s) => s.set_status(order_id, status).await,
        }
    }
}
