/// SQLite persistence layer for resource storage
///
/// Resources are stored with their route (appid, method, uri) as indexed
/// columns and the metadata sections as a JSON column.

use crate::resource::types::{Resource, ResourceMeta};
use anyhow::Result;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ResourceStorage {
    pool: SqlitePool,
}

impl ResourceStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database file and initialise the schema
    pub async fn connect(path: &str) -> Result<Self> {
        tracing::info!("🗄️ Opening resource database: {}", path);
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Single-connection in-memory database (tests and throwaway instances)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Safe to call multiple times (uses IF NOT EXISTS)
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resources (
                id TEXT PRIMARY KEY,
                appid TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                method TEXT NOT NULL,
                uri TEXT NOT NULL,
                ttl INTEGER NOT NULL DEFAULT 0,
                meta JSON NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_resources_route
            ON resources(appid, method, uri)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or update a resource (keyed by id)
    pub async fn save_resource(&self, resource: &Resource) -> Result<()> {
        let meta_json = serde_json::to_string(&resource.meta.to_value())?;

        sqlx::query(
            r#"
            INSERT INTO resources (id, appid, name, description, method, uri, ttl, meta, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                appid = excluded.appid,
                name = excluded.name,
                description = excluded.description,
                method = excluded.method,
                uri = excluded.uri,
                ttl = excluded.ttl,
                meta = excluded.meta,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&resource.id)
        .bind(&resource.appid)
        .bind(&resource.name)
        .bind(&resource.description)
        .bind(&resource.method)
        .bind(&resource.uri)
        .bind(resource.ttl as i64)
        .bind(&meta_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_resource(&self, id: &str) -> Result<Option<Resource>> {
        let row = sqlx::query(
            "SELECT id, appid, name, description, method, uri, ttl, meta FROM resources WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| resource_from_row(&row)).transpose()
    }

    /// Id of the resource already serving this route, if any
    pub async fn find_route(&self, appid: &str, method: &str, uri: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT id FROM resources WHERE appid = ? AND method = ? AND uri = ?")
            .bind(appid)
            .bind(method)
            .bind(uri)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("id")))
    }

    pub async fn list_resources(&self) -> Result<Vec<ResourceSummary>> {
        let rows = sqlx::query(
            "SELECT id, appid, name, method, uri, ttl, created_at, updated_at FROM resources ORDER BY appid, uri",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut resources = Vec::new();
        for row in rows {
            let ttl: i64 = row.get("ttl");
            resources.push(ResourceSummary {
                id: row.get("id"),
                appid: row.get("appid"),
                name: row.get("name"),
                method: row.get("method"),
                uri: row.get("uri"),
                ttl: ttl.max(0) as u64,
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(resources)
    }

    /// Every resource keyed by id, for registry initialisation
    pub async fn load_all_resources(&self) -> Result<HashMap<String, Resource>> {
        let rows = sqlx::query("SELECT id, appid, name, description, method, uri, ttl, meta FROM resources")
            .fetch_all(&self.pool)
            .await?;

        let mut resources = HashMap::new();
        for row in rows {
            let resource = resource_from_row(&row)?;
            resources.insert(resource.id.clone(), resource);
        }

        Ok(resources)
    }

    pub async fn delete_resource(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn resource_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Resource> {
    let meta_json: String = row.get("meta");
    let meta_value: Value = serde_json::from_str(&meta_json)?;
    let ttl: i64 = row.get("ttl");

    Ok(Resource {
        id: row.get("id"),
        appid: row.get("appid"),
        name: row.get("name"),
        description: row.get("description"),
        method: row.get("method"),
        uri: row.get("uri"),
        ttl: ttl.max(0) as u64,
        meta: ResourceMeta::from_value(&meta_value)?,
    })
}

/// Resource listing entry (metadata sections omitted)
#[derive(Debug, serde::Serialize)]
pub struct ResourceSummary {
    pub id: String,
    pub appid: String,
    pub name: String,
    pub method: String,
    pub uri: String,
    pub ttl: u64,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
