use std::sync::Mutex;

use dashmap::DashMap;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, instrument};
use turngate_core::{BusinessId, Channel, SessionId};

use crate::error::{Result, SessionsError};

/// `(businessId, channel, channelUserId) -> sessionId`, cached, race-safe
/// (§4.1). Creating a session never requires the caller to have one already
/// — this is the only place a `SessionId` is minted.
pub struct SessionMapper {
    db: Mutex<Connection>,
    cache: DashMap<(String, &'static str, String), SessionId>,
}

impl SessionMapper {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
            cache: DashMap::new(),
        }
    }

    /// Return the existing mapping or create one. If the orchestrator
    /// already holds an explicit `sessionId` it MUST call `resolve`
    /// instead — this method only ever follows the
    /// `(business, channel, channel_user_id)` keying path, so a caller can
    /// never be handed a brand-new id when one was already pinned (§4.1).
    #[instrument(skip(self), fields(business = %business, channel = %channel, channel_user_id))]
    pub fn get_or_create(
        &self,
        business: &BusinessId,
        channel: Channel,
        channel_user_id: &str,
    ) -> Result<SessionId> {
        let cache_key = (business.as_str().to_string(), channel.as_str(), channel_user_id.to_string());
        if let Some(hit) = self.cache.get(&cache_key) {
            return Ok(hit.clone());
        }

        let db = self.db.lock().unwrap();
        if let Some(id) = lookup(&db, business, channel, channel_user_id)? {
            drop(db);
            self.cache.insert(cache_key, id.clone());
            return Ok(id);
        }

        let new_id = SessionId::new();
        let now = chrono::Utc::now().to_rfc3339();
        let inserted = db.execute(
            "INSERT OR IGNORE INTO session_map (session_id, business_id, channel, channel_user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![new_id.as_str(), business.as_str(), channel.as_str(), channel_user_id, now],
        )?;

        let winner = if inserted == 1 {
            debug!(session_id = %new_id, "created new session mapping");
            new_id
        } else {
            // Lost the race to a concurrent insert — re-read the winner.
            lookup(&db, business, channel, channel_user_id)?
                .ok_or_else(|| SessionsError::NotFound(channel_user_id.to_string()))?
        };

        drop(db);
        self.cache.insert(cache_key, winner.clone());
        Ok(winner)
    }

    /// Resolve an explicit session id supplied by the caller, WITHOUT ever
    /// minting a new one — prevents a locked session from being bypassed by
    /// simply dropping the sessionId from the request (§4.1).
    pub fn resolve(&self, session_id: &str) -> Result<Option<SessionId>> {
        let db = self.db.lock().unwrap();
        let exists: Option<String> = db
            .query_row(
                "SELECT session_id FROM session_map WHERE session_id = ?1",
                rusqlite::params![session_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(exists.map(SessionId::from))
    }
}

fn lookup(
    db: &Connection,
    business: &BusinessId,
    channel: Channel,
    channel_user_id: &str,
) -> Result<Option<SessionId>> {
    let id: Option<String> = db
        .query_row(
            "SELECT session_id FROM session_map
             WHERE business_id = ?1 AND channel = ?2 AND channel_user_id = ?3",
            rusqlite::params![business.as_str(), channel.as_str(), channel_user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id.map(SessionId::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> SessionMapper {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        SessionMapper::new(conn)
    }

    #[test]
    fn get_or_create_is_stable_across_calls() {
        let m = mapper();
        let biz = BusinessId::from("biz-1");
        let a = m.get_or_create(&biz, Channel::Whatsapp, "+15551234567").unwrap();
        let b = m.get_or_create(&biz, Channel::Whatsapp, "+15551234567").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_channel_users_get_different_sessions() {
        let m = mapper();
        let biz = BusinessId::from("biz-1");
        let a = m.get_or_create(&biz, Channel::Chat, "user-a").unwrap();
        let b = m.get_or_create(&biz, Channel::Chat, "user-b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_never_mints_a_new_session() {
        let m = mapper();
        assert!(m.resolve("conv_does_not_exist").unwrap().is_none());
    }
}
