//! Concrete `IdentityLookup` + `AnchorRefetch` adapters (§1, §4.5, §4.6) —
//! the gateway is where named collaborators the core crates only define as
//! traits get wired to an actual store. Backed by the same sqlite file the
//! session/state tables live in, under two generic tables a business's own
//! provisioning owns: `customers` and `orders`.

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use turngate_identity::{AnchorRefetch, CustomerMatch, IdentityLookup, OrderMatch};

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS customers (
            id         TEXT PRIMARY KEY,
            name       TEXT,
            phone      TEXT,
            email      TEXT
        );
        CREATE TABLE IF NOT EXISTS orders (
            id          TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            phone       TEXT,
            status      TEXT
        );",
    )
}

pub struct SqliteIdentityStore {
    db: Mutex<Connection>,
}

impl SqliteIdentityStore {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }
}

#[async_trait]
impl IdentityLookup for SqliteIdentityStore {
    async fn customers_by_phone(&self, variants: &[String]) -> Result<Vec<CustomerMatch>, String> {
        let db = self.db.lock().map_err(|e| e.to_string())?;
        let placeholders: Vec<String> = variants.iter().map(|_| "?".to_string()).collect();
        let sql = format!("SELECT DISTINCT id FROM customers WHERE phone IN ({})", placeholders.join(","));
        let mut stmt = db.prepare(&sql).map_err(|e| e.to_string())?;
        let params: Vec<&dyn rusqlite::ToSql> = variants.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
        let rows = stmt
            .query_map(params.as_slice(), |r| r.get::<_, String>(0))
            .map_err(|e| e.to_string())?;
        rows.map(|r| r.map(|customer_id| CustomerMatch { customer_id }).map_err(|e| e.to_string()))
            .collect()
    }

    async fn orders_by_phone(&self, variants: &[String]) -> Result<Vec<OrderMatch>, String> {
        let db = self.db.lock().map_err(|e| e.to_string())?;
        let placeholders: Vec<String> = variants.iter().map(|_| "?".to_string()).collect();
        let sql = format!("SELECT DISTINCT id, customer_id FROM orders WHERE phone IN ({})", placeholders.join(","));
        let mut stmt = db.prepare(&sql).map_err(|e| e.to_string())?;
        let params: Vec<&dyn rusqlite::ToSql> = variants.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
        let rows = stmt
            .query_map(params.as_slice(), |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
            .map_err(|e| e.to_string())?;
        rows.map(|r| r.map(|(order_id, customer_id)| OrderMatch { order_id, customer_id }).map_err(|e| e.to_string()))
            .collect()
    }

    async fn customers_by_email(&self, email: &str) -> Result<Vec<CustomerMatch>, String> {
        let db = self.db.lock().map_err(|e| e.to_string())?;
        let mut stmt = db
            .prepare("SELECT id FROM customers WHERE lower(email) = ?1")
            .map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map(rusqlite::params![email], |r| r.get::<_, String>(0))
            .map_err(|e| e.to_string())?;
        rows.map(|r| r.map(|customer_id| CustomerMatch { customer_id }).map_err(|e| e.to_string()))
            .collect()
    }

    async fn customer_table_is_empty(&self) -> Result<bool, String> {
        let db = self.db.lock().map_err(|e| e.to_string())?;
        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM customers", [], |r| r.get(0))
            .map_err(|e| e.to_string())?;
        Ok(count == 0)
    }
}

#[async_trait]
impl AnchorRefetch for SqliteIdentityStore {
    async fn refetch(&self, source_table: &str, anchor_id: &str) -> Result<serde_json::Value, String> {
        let table = match source_table {
            "customers" => "customers",
            "orders" => "orders",
            other => return Err(format!("unknown source table: {other}")),
        };
        self.read_record(table, anchor_id)
    }
}

impl SqliteIdentityStore {
    fn read_record(&self, table: &str, id: &str) -> Result<serde_json::Value, String> {
        let db = self.db.lock().map_err(|e| e.to_string())?;
        if table == "customers" {
            db.query_row(
                "SELECT id, name, phone, email FROM customers WHERE id = ?1",
                rusqlite::params![id],
                |r| {
                    Ok(serde_json::json!({
                        "id": r.get::<_, String>(0)?,
                        "name": r.get::<_, Option<String>>(1)?,
                        "phone": r.get::<_, Option<String>>(2)?,
                        "email": r.get::<_, Option<String>>(3)?,
                    }))
                },
            )
            .map_err(|e| e.to_string())
        } else {
            db.query_row(
                "SELECT o.id, o.customer_id, o.phone, o.status, c.name FROM orders o
                 LEFT JOIN customers c ON c.id = o.customer_id WHERE o.id = ?1",
                rusqlite::params![id],
                |r| {
                    Ok(serde_json::json!({
                        "id": r.get::<_, String>(0)?,
                        "customer_id": r.get::<_, String>(1)?,
                        "phone": r.get::<_, Option<String>>(2)?,
                        "status": r.get::<_, Option<String>>(3)?,
                        "name": r.get::<_, Option<String>>(4)?,
                    }))
                },
            )
            .map_err(|e| e.to_string())
        }
    }
}
