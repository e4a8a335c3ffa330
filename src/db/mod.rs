//! Database module providing connection management and the record store boundary.

pub mod wastages;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::entity::wastage;
use crate::error::{AppError, AppResult};
use crate::models::{NewWastage, WastageUpdate};

/// Database connection wrapper shared across handlers.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to PostgreSQL using the configured URL.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.max_connections(10).sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(DbPool { conn })
    }

    /// Access the underlying connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// Durable, uniqueness-enforcing store for wastage records.
///
/// The workflow depends on this boundary instead of the concrete engine;
/// `insert` must surface a unique-key violation on challan_id as
/// [`AppError::Conflict`] so a create race never silently overwrites.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WastageStore: Send + Sync {
    async fn find_by_challan_id(&self, challan_id: &str) -> AppResult<Option<wastage::Model>>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<wastage::Model>>;

    /// All records, most recently created first.
    async fn list_all(&self) -> AppResult<Vec<wastage::Model>>;

    async fn insert(&self, record: NewWastage) -> AppResult<wastage::Model>;

    async fn update(&self, record: WastageUpdate) -> AppResult<wastage::Model>;

    /// Returns true when a row was deleted.
    async fn delete(&self, id: i32) -> AppResult<bool>;
}
