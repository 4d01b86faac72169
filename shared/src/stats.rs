use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};

use crate::TelegramId;

/// Points credited for one correct prediction.
pub const POINTS_PER_WIN: u32 = 10;

/// Running scoreboard for one telegram identity. Web-only predictors never
/// get a record, so nothing here can ever refer to an anonymous guess.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub rumuz: String,
    pub total_points: u32,
    pub correct_predictions: u32,
    pub total_predictions: u32,
    /// correct / total × 100, recomputed whenever either counter moves.
    pub accuracy: f64,
    /// Consecutive calendar days (UTC) with at least one correct prediction.
    pub streak: u32,
    pub best_streak: u32,
    pub last_prediction_date: Option<DateTime<Utc>>,
    pub last_correct_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    pub fn new(
        telegram_id: TelegramId,
        username: Option<String>,
        rumuz: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            telegram_id,
            username,
            rumuz,
            total_points: 0,
            correct_predictions: 0,
            total_predictions: 0,
            accuracy: 0.0,
            streak: 0,
            best_streak: 0,
            last_prediction_date: None,
            last_correct_date: None,
            updated_at: now,
        }
    }

    /// One accepted prediction: refresh the identity fields and bump the
    /// attempt counter. `total_predictions` never decreases.
    pub fn record_prediction(
        &mut self,
        username: Option<String>,
        rumuz: String,
        now: DateTime<Utc>,
    ) {
        self.username = username;
        self.rumuz = rumuz;
        self.total_predictions += 1;
        self.recompute_accuracy();
        self.last_prediction_date = Some(now);
        self.updated_at = now;
    }

    /// One win: credit points and advance the streak. A second win on the
    /// same calendar day leaves the streak untouched.
    pub fn record_correct(&mut self, now: DateTime<Utc>) {
        self.correct_predictions += 1;
        self.total_points += POINTS_PER_WIN;
        self.recompute_accuracy();

        let today = now.date_naive();
        let yesterday = today - Days::new(1);
        let last_correct = self.last_correct_date.map(|at| at.date_naive());

        if last_correct == Some(yesterday) {
            self.streak += 1;
        } else if last_correct != Some(today) {
            self.streak = 1;
        }

        self.best_streak = self.best_streak.max(self.streak);
        self.last_correct_date = Some(now);
        self.updated_at = now;
    }

    /// Undo the credit of one win after a result correction. Counters floor
    /// at zero; the streak is left alone, only points and accuracy move.
    pub fn reverse_correct(&mut self, now: DateTime<Utc>) {
        self.total_points = self.total_points.saturating_sub(POINTS_PER_WIN);
        self.correct_predictions = self.correct_predictions.saturating_sub(1);
        self.recompute_accuracy();
        self.updated_at = now;
    }

    fn recompute_accuracy(&mut self) {
        self.accuracy = if self.total_predictions == 0 {
            0.0
        } else {
            f64::from(self.correct_predictions) / f64::from(self.total_predictions) * 100.0
        };
    }
}
