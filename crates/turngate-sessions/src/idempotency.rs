use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use turngate_core::{SessionId, ToolResult, TurnId};

use crate::error::Result;

/// Persistent replay cache for tool executions, keyed by
/// `(sessionId, turnId, toolName, argsHash)` (§4.2, §4.8). Replaying the same
/// key within the same session+turn window returns the cached result instead
/// of re-executing a possibly side-effectful tool.
pub struct IdempotencyCache {
    db: Mutex<Connection>,
}

/// Hash a tool's JSON-encoded arguments into the idempotency key's final
/// component. Deterministic: identical args always hash identically.
pub fn hash_args(args: &serde_json::Value) -> String {
    let canonical = canonicalize(args);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable JSON serialization — object keys sorted — so semantically
/// identical args always hash the same regardless of field order.
fn canonicalize(value: &serde_json::Value) -> String {
    fn sort(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serde_json::Map::new();
                for (k, v) in entries {
                    out.insert(k.clone(), sort(v));
                }
                serde_json::Value::Object(out)
            }
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(sort).collect())
            }
            other => other.clone(),
        }
    }
    sort(value).to_string()
}

fn idem_key(session_id: &SessionId, turn_id: &TurnId, tool_name: &str, args_hash: &str) -> String {
    format!("{}:{}:{}:{}", session_id.as_str(), turn_id.as_str(), tool_name, args_hash)
}

impl IdempotencyCache {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    pub fn get(
        &self,
        session_id: &SessionId,
        turn_id: &TurnId,
        tool_name: &str,
        args_hash: &str,
    ) -> Result<Option<ToolResult>> {
        let key = idem_key(session_id, turn_id, tool_name, args_hash);
        let db = self.db.lock().unwrap();
        let row: Option<String> = db
            .query_row(
                "SELECT result_json FROM tool_idempotency WHERE idem_key = ?1",
                rusqlite::params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(match row {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        })
    }

    pub fn put(
        &self,
        session_id: &SessionId,
        turn_id: &TurnId,
        tool_name: &str,
        args_hash: &str,
        result: &ToolResult,
    ) -> Result<()> {
        let key = idem_key(session_id, turn_id, tool_name, args_hash);
        let json = serde_json::to_string(result)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR REPLACE INTO tool_idempotency (idem_key, result_json, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![key, json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
