use rusqlite::Connection;

use crate::error::Result;

/// Initialise every table this crate owns. Safe to call on every startup —
/// uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS session_map (
            session_id      TEXT PRIMARY KEY,
            business_id     TEXT NOT NULL,
            channel         TEXT NOT NULL,
            channel_user_id TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            UNIQUE(business_id, channel, channel_user_id)
        );

        CREATE TABLE IF NOT EXISTS turn_state (
            session_id  TEXT PRIMARY KEY,
            state_json  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            expires_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS session_lock (
            session_id TEXT PRIMARY KEY,
            reason     TEXT NOT NULL,
            until      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chat_log (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id       TEXT NOT NULL,
            role             TEXT NOT NULL,
            text             TEXT NOT NULL,
            message_type     TEXT,
            guardrail_action TEXT,
            response_grounding TEXT,
            ts               TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chat_log_session
            ON chat_log(session_id, id);

        CREATE TABLE IF NOT EXISTS tool_idempotency (
            idem_key   TEXT PRIMARY KEY,
            result_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS security_event (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT,
            event_type TEXT NOT NULL,
            detail     TEXT,
            ts         TEXT NOT NULL
        );",
    )?;
    Ok(())
}
