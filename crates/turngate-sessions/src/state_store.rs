use std::sync::Mutex;

use dashmap::DashMap;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, instrument};
use turngate_core::{SessionId, TurnState};

use crate::error::Result;

/// A single logged conversation turn message (§6 persisted artifacts).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatLogEntry {
    pub role: String,
    pub text: String,
    pub message_type: Option<String>,
    pub guardrail_action: Option<String>,
    pub response_grounding: Option<String>,
}

/// Read/write access to per-session turn state (§4.2). Reads are cached;
/// writes invalidate the cache entry they touch. A single `persist` call at
/// turn end writes state, appends the turn's messages to the conversation
/// log, and bumps the TTL.
pub struct StateStore {
    db: Mutex<Connection>,
    cache: DashMap<String, TurnState>,
    ttl_secs: i64,
}

impl StateStore {
    pub fn new(conn: Connection, ttl_secs: i64) -> Self {
        Self {
            db: Mutex::new(conn),
            cache: DashMap::new(),
            ttl_secs,
        }
    }

    /// Returns a typed state with defaults filled — a session with no row
    /// yet, or whose TTL has expired, behaves identically to a fresh one.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn get_state(&self, session_id: &SessionId) -> Result<TurnState> {
        if let Some(hit) = self.cache.get(session_id.as_str()) {
            debug!("state cache hit");
            return Ok(hit.clone());
        }

        let db = self.db.lock().unwrap();
        let row: Option<(String, String)> = db
            .query_row(
                "SELECT state_json, expires_at FROM turn_state WHERE session_id = ?1",
                rusqlite::params![session_id.as_str()],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        drop(db);

        let Some((state_json, expires_at)) = row else {
            return Ok(TurnState::default());
        };

        let expired = chrono::DateTime::parse_from_rfc3339(&expires_at)
            .map(|d| chrono::Utc::now() >= d.with_timezone(&chrono::Utc))
            .unwrap_or(true);
        if expired {
            return Ok(TurnState::default());
        }

        let state: TurnState = serde_json::from_str(&state_json)?;
        self.cache.insert(session_id.as_str().to_string(), state.clone());
        Ok(state)
    }

    /// Persist state, bump the TTL, and append the turn's conversation-log
    /// entries (§4.2, §6). Runs as one write so a crash never leaves state
    /// and log out of sync within the same turn.
    #[instrument(skip(self, state, entries), fields(session_id = %session_id))]
    pub fn persist(&self, session_id: &SessionId, mut state: TurnState, entries: &[ChatLogEntry]) -> Result<()> {
        state.version += 1;
        let state_json = serde_json::to_string(&state)?;
        let now = chrono::Utc::now();
        let expires_at = now + chrono::Duration::seconds(self.ttl_secs);

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "INSERT INTO turn_state (session_id, state_json, updated_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at,
                expires_at = excluded.expires_at",
            rusqlite::params![session_id.as_str(), state_json, now.to_rfc3339(), expires_at.to_rfc3339()],
        )?;

        for e in entries {
            tx.execute(
                "INSERT INTO chat_log (session_id, role, text, message_type, guardrail_action, response_grounding, ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    session_id.as_str(),
                    e.role,
                    e.text,
                    e.message_type,
                    e.guardrail_action,
                    e.response_grounding,
                    now.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        drop(db);

        self.cache.insert(session_id.as_str().to_string(), state);
        Ok(())
    }

    /// Trivial liveness check for a readiness probe — the sqlite connection
    /// actually answers a query.
    pub fn ping(&self) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Fetch the most recent N conversation-log entries, oldest first.
    pub fn recent_log(&self, session_id: &SessionId, limit: usize) -> Result<Vec<ChatLogEntry>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT role, text, message_type, guardrail_action, response_grounding
             FROM chat_log WHERE session_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![session_id.as_str(), limit as i64], |r| {
            Ok(ChatLogEntry {
                role: r.get(0)?,
                text: r.get(1)?,
                message_type: r.get(2)?,
                guardrail_action: r.get(3)?,
                response_grounding: r.get(4)?,
            })
        })?;
        let mut out: Vec<ChatLogEntry> = rows.filter_map(|r| r.ok()).collect();
        out.reverse();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngate_core::FlowStatus;

    fn store() -> StateStore {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        StateStore::new(conn, 3600)
    }

    #[test]
    fn missing_session_returns_defaults() {
        let s = store();
        let sid = SessionId::new();
        let state = s.get_state(&sid).unwrap();
        assert!(matches!(state.flow_status, FlowStatus::Idle));
    }

    #[test]
    fn persisted_state_round_trips() {
        let s = store();
        let sid = SessionId::new();
        let mut state = TurnState::default();
        state.active_flow = Some("ORDER_STATUS".to_string());
        s.persist(&sid, state, &[]).unwrap();

        let reloaded = s.get_state(&sid).unwrap();
        assert_eq!(reloaded.active_flow.as_deref(), Some("ORDER_STATUS"));
        assert_eq!(reloaded.version, 1);
    }

    #[test]
    fn chat_log_entries_are_appended_in_order() {
        let s = store();
        let sid = SessionId::new();
        s.persist(
            &sid,
            TurnState::default(),
            &[
                ChatLogEntry {
                    role: "user".into(),
                    text: "hello".into(),
                    message_type: None,
                    guardrail_action: None,
                    response_grounding: None,
                },
                ChatLogEntry {
                    role: "assistant".into(),
                    text: "hi".into(),
                    message_type: None,
                    guardrail_action: Some("PASS".into()),
                    response_grounding: None,
                },
            ],
        )
        .unwrap();

        let log = s.recent_log(&sid, 10).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, "user");
        assert_eq!(log[1].role, "assistant");
    }
}
