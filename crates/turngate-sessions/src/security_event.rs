use std::sync::Mutex;

use rusqlite::Connection;
use tracing::warn;
use turngate_core::SessionId;

use crate::error::Result;

/// Append-only log of security-relevant events: PII block, SSRF block,
/// enumeration lock (§6 persisted artifacts).
pub struct SecurityEventLog {
    db: Mutex<Connection>,
}

impl SecurityEventLog {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    pub fn record(&self, session_id: Option<&SessionId>, event_type: &str, detail: &str) -> Result<()> {
        warn!(event_type, detail, "security event");
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO security_event (session_id, event_type, detail, ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                session_id.map(|s| s.as_str()),
                event_type,
                detail,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
