use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use itertools::Itertools;
use shared::{NewPrediction, Prediction, PredictionStats, ScoreCount, TelegramId, UserPrediction};
use uuid::Uuid;

use crate::{JsonStore, LockManager};

const DOCUMENT: &str = "predictions";

/// Per-post lists of guesses, newest first.
pub(crate) type PredictionsDoc = BTreeMap<String, Vec<Prediction>>;

/// Per-event list of user guesses: duplicate detection, aggregation, lookup.
#[derive(Debug, Clone)]
pub struct PredictionRepository {
    store: JsonStore,
    locks: Arc<LockManager>,
}

impl PredictionRepository {
    pub(crate) fn new(store: JsonStore, locks: Arc<LockManager>) -> Self {
        Self { store, locks }
    }

    /// Prepends the guess to the post's list, so the stored order is always
    /// newest first.
    pub async fn create(&self, post_id: &str, guess: NewPrediction) -> anyhow::Result<String> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut predictions: PredictionsDoc = self.store.read(DOCUMENT).await?;
                let now = Utc::now();
                let id = Uuid::new_v4().to_string();

                predictions.entry(post_id.to_owned()).or_default().insert(
                    0,
                    Prediction {
                        id: id.clone(),
                        telegram_id: guess.telegram_id,
                        username: guess.username,
                        rumuz: guess.rumuz,
                        home_score: guess.home_score,
                        away_score: guess.away_score,
                        user_token: guess.user_token,
                        ip_address: guess.ip_address,
                        user_agent: guess.user_agent,
                        is_hidden: guess.is_hidden,
                        created_at: now,
                        updated_at: now,
                    },
                );

                self.store.write(DOCUMENT, &predictions).await?;
                Ok(id)
            })
            .await
    }

    /// True when any existing guess for the post carries the same telegram id
    /// or the same user token; either signal alone establishes identity.
    ///
    /// This read and a following `create` are not one atomic unit: two
    /// near-simultaneous submissions from the same identity can both pass the
    /// check. The submission layer lives with that window.
    pub async fn check_duplicate(
        &self,
        post_id: &str,
        telegram_id: Option<TelegramId>,
        user_token: Option<&str>,
    ) -> anyhow::Result<bool> {
        let predictions: PredictionsDoc = self.store.read(DOCUMENT).await?;
        let Some(list) = predictions.get(post_id) else {
            return Ok(false);
        };

        Ok(list.iter().any(|p| {
            if telegram_id.is_some() && p.telegram_id == telegram_id {
                return true;
            }
            user_token.is_some() && p.user_token.as_deref() == user_token
        }))
    }

    pub async fn get_by_post(
        &self,
        post_id: &str,
        include_hidden: bool,
    ) -> anyhow::Result<Vec<Prediction>> {
        let predictions: PredictionsDoc = self.store.read(DOCUMENT).await?;
        let list = predictions.get(post_id).cloned().unwrap_or_default();

        if include_hidden {
            Ok(list)
        } else {
            Ok(list.into_iter().filter(|p| !p.is_hidden).collect())
        }
    }

    /// Unfiltered length: hidden guesses count too.
    pub async fn count(&self, post_id: &str) -> anyhow::Result<usize> {
        let predictions: PredictionsDoc = self.store.read(DOCUMENT).await?;
        Ok(predictions.get(post_id).map_or(0, Vec::len))
    }

    /// Aggregates over the visible guesses; all zeroes when there are none.
    pub async fn stats(&self, post_id: &str) -> anyhow::Result<PredictionStats> {
        let visible = self.get_by_post(post_id, false).await?;
        if visible.is_empty() {
            return Ok(PredictionStats::default());
        }

        let total = visible.len();
        let sum_home: u32 = visible.iter().map(|p| p.home_score).sum();
        let sum_away: u32 = visible.iter().map(|p| p.away_score).sum();

        Ok(PredictionStats {
            total,
            avg_home: f64::from(sum_home) / total as f64,
            avg_away: f64::from(sum_away) / total as f64,
            min_home: visible.iter().map(|p| p.home_score).min().unwrap_or(0),
            max_home: visible.iter().map(|p| p.home_score).max().unwrap_or(0),
            min_away: visible.iter().map(|p| p.away_score).min().unwrap_or(0),
            max_away: visible.iter().map(|p| p.away_score).max().unwrap_or(0),
        })
    }

    /// Visible guesses grouped by exact score line, most guessed first.
    /// The sort is stable, so tied counts keep the order in which each
    /// distinct line was first met while scanning the newest-first list.
    pub async fn popular_scores(
        &self,
        post_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<ScoreCount>> {
        let visible = self.get_by_post(post_id, false).await?;

        let mut counts: Vec<ScoreCount> = Vec::new();
        for p in &visible {
            match counts
                .iter_mut()
                .find(|c| c.home_score == p.home_score && c.away_score == p.away_score)
            {
                Some(entry) => entry.count += 1,
                None => counts.push(ScoreCount {
                    home_score: p.home_score,
                    away_score: p.away_score,
                    count: 1,
                }),
            }
        }

        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(limit);
        Ok(counts)
    }

    /// Everything one telegram identity has guessed, across all posts,
    /// newest first.
    pub async fn get_by_user(
        &self,
        telegram_id: TelegramId,
    ) -> anyhow::Result<Vec<UserPrediction>> {
        let predictions: PredictionsDoc = self.store.read(DOCUMENT).await?;

        Ok(predictions
            .into_iter()
            .flat_map(|(post_id, list)| {
                list.into_iter()
                    .filter(|p| p.telegram_id == Some(telegram_id))
                    .map(move |prediction| UserPrediction {
                        post_id: post_id.clone(),
                        prediction,
                    })
            })
            .sorted_by(|a, b| b.prediction.created_at.cmp(&a.prediction.created_at))
            .collect())
    }

    pub async fn get_all(&self) -> anyhow::Result<PredictionsDoc> {
        Ok(self.store.read(DOCUMENT).await?)
    }
}
