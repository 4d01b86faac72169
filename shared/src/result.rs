use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Official final score for a post. At most one per post; an admin correction
/// overwrites it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub home_score: u32,
    pub away_score: u32,
    pub announced_at: DateTime<Utc>,
}
