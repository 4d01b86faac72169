use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TelegramId;

/// Bearer credential for a browser client, keyed by its opaque token in the
/// `sessions` document. Validity is re-checked against `expires_at` on every
/// use, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub telegram_id: Option<TelegramId>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl Session {
    /// Valid strictly before `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
