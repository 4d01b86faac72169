use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MatchResult, TelegramId};

/// One user's score guess for a post. Stored in a newest-first list under the
/// post's id in the `predictions` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: String,
    /// Present when the submission came through the bot; web-only guesses
    /// carry only a `user_token`.
    pub telegram_id: Option<TelegramId>,
    pub username: Option<String>,
    /// User-chosen display handle, independent of the telegram identity.
    pub rumuz: String,
    pub home_score: u32,
    pub away_score: u32,
    /// Anonymous cookie identity, used for duplicate detection on the web path.
    pub user_token: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prediction {
    pub fn matches(&self, result: &MatchResult) -> bool {
        self.home_score == result.home_score && self.away_score == result.away_score
    }
}

/// Payload for [`Prediction`] creation; id and timestamps are stamped by the
/// repository. The repository stores whatever it is given: score-range and
/// rumuz validation belong to the submission layer.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub telegram_id: Option<TelegramId>,
    pub username: Option<String>,
    pub rumuz: String,
    pub home_score: u32,
    pub away_score: u32,
    pub user_token: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_hidden: bool,
}

/// A prediction joined with the post it belongs to, for per-user history views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPrediction {
    pub post_id: String,
    #[serde(flatten)]
    pub prediction: Prediction,
}

/// Aggregates over the non-hidden predictions of one post.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionStats {
    pub total: usize,
    pub avg_home: f64,
    pub avg_away: f64,
    pub min_home: u32,
    pub max_home: u32,
    pub min_away: u32,
    pub max_away: u32,
}

/// How often one exact score line was guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCount {
    pub home_score: u32,
    pub away_score: u32,
    pub count: usize,
}
