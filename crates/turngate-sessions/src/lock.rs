use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tracing::{info, instrument};
use turngate_core::{LockReason, SessionId};

use crate::error::Result;

/// Stores `(sessionId -> {reason, until})` (§4.3). The sole mechanism that
/// forbids further turns on a session; consulted by the orchestrator before
/// any other step.
pub struct SessionLock {
    db: Mutex<Connection>,
}

/// An active lock and when it expires.
#[derive(Debug, Clone)]
pub struct LockStatus {
    pub reason: LockReason,
    pub until: chrono::DateTime<chrono::Utc>,
}

impl SessionLock {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    /// Lock a session for `ttl_ms` milliseconds starting now. Overwrites any
    /// prior lock on the same session (last writer wins — a second,
    /// stronger lock reason should not be blocked by a weaker expired one).
    #[instrument(skip(self), fields(session_id = %session_id, reason = %reason, ttl_ms))]
    pub fn lock_session(&self, session_id: &SessionId, reason: LockReason, ttl_ms: i64) -> Result<()> {
        let until = chrono::Utc::now() + chrono::Duration::milliseconds(ttl_ms);
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO session_lock (session_id, reason, until) VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET reason = excluded.reason, until = excluded.until",
            rusqlite::params![session_id.as_str(), reason.as_str(), until.to_rfc3339()],
        )?;
        info!(session_id = %session_id, reason = %reason, until = %until, "session locked");
        Ok(())
    }

    /// Returns the current lock reason iff `now < until`; a stale (expired)
    /// lock row is treated as unlocked.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn is_locked(&self, session_id: &SessionId) -> Result<Option<LockStatus>> {
        let db = self.db.lock().unwrap();
        let row: Option<(String, String)> = db
            .query_row(
                "SELECT reason, until FROM session_lock WHERE session_id = ?1",
                rusqlite::params![session_id.as_str()],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let Some((reason_str, until_str)) = row else {
            return Ok(None);
        };
        let until = chrono::DateTime::parse_from_rfc3339(&until_str)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now());

        if chrono::Utc::now() >= until {
            return Ok(None);
        }

        let reason = parse_reason(&reason_str);
        Ok(reason.map(|reason| LockStatus { reason, until }))
    }

    pub fn unlock(&self, session_id: &SessionId) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "DELETE FROM session_lock WHERE session_id = ?1",
            rusqlite::params![session_id.as_str()],
        )?;
        Ok(())
    }
}

fn parse_reason(s: &str) -> Option<LockReason> {
    match s {
        "PII_RISK" => Some(LockReason::PiiRisk),
        "ENUMERATION" => Some(LockReason::Enumeration),
        "ABUSE" => Some(LockReason::Abuse),
        "CONTENT_SAFETY" => Some(LockReason::ContentSafety),
        _ => None,
    }
}

/// Localized, user-visible lock message (§4.3, §6 message catalog).
pub fn lock_message(reason: LockReason, language: &str) -> String {
    let tr = language.eq_ignore_ascii_case("tr");
    match (reason, tr) {
        (LockReason::PiiRisk, true) => {
            "Güvenlik nedeniyle bu görüşme geçici olarak kısıtlandı. Lütfen daha sonra tekrar deneyin veya müşteri temsilcimizle iletişime geçin.".to_string()
        }
        (LockReason::PiiRisk, false) => {
            "This conversation has been temporarily restricted for security reasons. Please try again later or contact a representative.".to_string()
        }
        (LockReason::Enumeration, true) => {
            "Çok sayıda hatalı doğrulama denemesi nedeniyle bu görüşme kilitlendi. Lütfen müşteri hizmetlerini arayın.".to_string()
        }
        (LockReason::Enumeration, false) => {
            "This conversation has been locked after repeated failed verification attempts. Please contact customer support.".to_string()
        }
        (LockReason::Abuse, true) => {
            "Bu görüşme kısıtlandı. Lütfen müşteri hizmetlerimizle iletişime geçin.".to_string()
        }
        (LockReason::Abuse, false) => {
            "This conversation has been restricted. Please contact customer support.".to_string()
        }
        (LockReason::ContentSafety, true) => {
            "Bu istek işlenemiyor. Lütfen müşteri hizmetlerimizle iletişime geçin.".to_string()
        }
        (LockReason::ContentSafety, false) => {
            "This request cannot be processed. Please contact customer support.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock() -> SessionLock {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        SessionLock::new(conn)
    }

    #[test]
    fn fresh_session_is_not_locked() {
        let l = lock();
        let sid = SessionId::new();
        assert!(l.is_locked(&sid).unwrap().is_none());
    }

    #[test]
    fn locked_session_reports_reason_until_expiry() {
        let l = lock();
        let sid = SessionId::new();
        l.lock_session(&sid, LockReason::PiiRisk, 60_000).unwrap();
        let status = l.is_locked(&sid).unwrap().expect("should be locked");
        assert_eq!(status.reason.as_str(), "PII_RISK");
    }

    #[test]
    fn expired_lock_is_treated_as_unlocked() {
        let l = lock();
        let sid = SessionId::new();
        l.lock_session(&sid, LockReason::Enumeration, -1).unwrap();
        assert!(l.is_locked(&sid).unwrap().is_none());
    }
}
