use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use shared::{Session, TelegramId};
use tracing::info;

use crate::{JsonStore, LockManager};

const DOCUMENT: &str = "sessions";

pub(crate) type SessionsDoc = BTreeMap<String, Session>;

/// Short-lived web session tokens, TTL-bound.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    store: JsonStore,
    locks: Arc<LockManager>,
}

impl SessionRepository {
    pub(crate) fn new(store: JsonStore, locks: Arc<LockManager>) -> Self {
        Self { store, locks }
    }

    /// Stores the token with `expires_at = now + days`. Days may be negative,
    /// which creates an already-expired session (used by expiry tests).
    pub async fn create(
        &self,
        token: &str,
        telegram_id: Option<TelegramId>,
        username: Option<String>,
        expires_in_days: i64,
    ) -> anyhow::Result<()> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut sessions: SessionsDoc = self.store.read(DOCUMENT).await?;
                let now = Utc::now();

                sessions.insert(
                    token.to_owned(),
                    Session {
                        token: token.to_owned(),
                        telegram_id,
                        username,
                        created_at: now,
                        expires_at: now + Duration::days(expires_in_days),
                        last_used: now,
                    },
                );

                self.store.write(DOCUMENT, &sessions).await?;
                Ok(())
            })
            .await
    }

    /// Re-checks expiry on every call: an expired token is deleted on sight
    /// and reported as absent. A live one gets its `last_used` refreshed.
    ///
    /// The check and the refresh are two separate lock acquisitions; in the
    /// window between them the session could be deleted concurrently, which
    /// at worst costs one extra no-op delete.
    pub async fn validate(&self, token: &str) -> anyhow::Result<Option<Session>> {
        let sessions: SessionsDoc = self.store.read(DOCUMENT).await?;
        let Some(session) = sessions.get(token).cloned() else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            self.delete(token).await?;
            return Ok(None);
        }

        let refreshed = self
            .locks
            .with_lock(DOCUMENT, async {
                let mut sessions: SessionsDoc = self.store.read(DOCUMENT).await?;
                let refreshed = sessions.get_mut(token).map(|live| {
                    live.last_used = Utc::now();
                    live.clone()
                });
                if refreshed.is_some() {
                    self.store.write(DOCUMENT, &sessions).await?;
                }
                anyhow::Ok(refreshed)
            })
            .await?;

        Ok(Some(refreshed.unwrap_or(session)))
    }

    /// Idempotent removal.
    pub async fn delete(&self, token: &str) -> anyhow::Result<()> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut sessions: SessionsDoc = self.store.read(DOCUMENT).await?;
                sessions.remove(token);
                self.store.write(DOCUMENT, &sessions).await?;
                Ok(())
            })
            .await
    }

    /// Drops every expired session; returns how many went. Meant to run on a
    /// daily schedule owned by the service layer.
    pub async fn cleanup(&self) -> anyhow::Result<usize> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut sessions: SessionsDoc = self.store.read(DOCUMENT).await?;
                let now = Utc::now();

                let before = sessions.len();
                sessions.retain(|_, session| !session.is_expired(now));
                let cleaned = before - sessions.len();

                self.store.write(DOCUMENT, &sessions).await?;
                info!(cleaned, "expired sessions removed");
                Ok(cleaned)
            })
            .await
    }
}
