use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fulfillment_types::domain::order::{Order, OrderStatus};
use fulfillment_types::ports::status_store::{StatusStore, StoreError};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbOrder {
    order_id: String,
    customer_name: String,
    product_name: String,
    quantity: i64,
    status: String,
    created_at: String,
    updated_at: String,
}

fn db_err(e: impl ToString) -> StoreError {
    StoreError::DbError(e.to_string())
}

impl DbOrder {
    fn into_order(self) -> Result<Order, StoreError> {
        let status = OrderStatus::from_str(&self.status).map_err(db_err)?;
        let quantity = u32::try_from(self.quantity).map_err(db_err)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(db_err)?
            .with_timezone(&Utc);
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(db_err)?
            .with_timezone(&Utc);
        let order_id = Uuid::parse_str(&self.order_id).map_err(db_err)?;
        Ok(Order {
            order_id,
            customer_name: self.customer_name,
            product_name: self.product_name,
            quantity,
            status,
            created_at,
            updated_at,
        })
    }
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_orders.sql");
        sqlx::query(ddl).execute(&pool).await?;
        tracing::debug!(database_url, "sqlite status store ready");

        Ok(Self { pool })
    }

    /// Seeds a record, as the creation endpoint would.
    pub async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (order_id, customer_name, product_name, quantity, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.order_id.to_string())
        .bind(&order.customer_name)
        .bind(&order.product_name)
        .bind(i64::from(order.quantity))
        .bind(order.status.as_str())
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl StatusStore for SqliteStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        let row: Option<DbOrder> = sqlx::query_as(
            "SELECT order_id, customer_name, product_name, quantity, status, created_at, updated_at FROM orders WHERE order_id = ?",
        )
        .bind(order_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        let updated = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(order_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(updated.rows_affected() > 0)
    }
}
