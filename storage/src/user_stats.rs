use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use itertools::Itertools;
use shared::{TelegramId, UserStats};

use crate::{JsonStore, LockManager};

const DOCUMENT: &str = "user-stats";

pub(crate) type UserStatsDoc = BTreeMap<TelegramId, UserStats>;

/// Running per-user scoreboard. Only telegram identities are tracked here;
/// anonymous web guesses never create a record.
#[derive(Debug, Clone)]
pub struct UserStatsRepository {
    store: JsonStore,
    locks: Arc<LockManager>,
}

impl UserStatsRepository {
    pub(crate) fn new(store: JsonStore, locks: Arc<LockManager>) -> Self {
        Self { store, locks }
    }

    /// Called once per accepted prediction from an identified user: creates a
    /// zeroed record on first sight, always refreshes the identity fields,
    /// and bumps the attempt counter.
    pub async fn upsert(
        &self,
        telegram_id: TelegramId,
        username: Option<String>,
        rumuz: String,
    ) -> anyhow::Result<()> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut stats: UserStatsDoc = self.store.read(DOCUMENT).await?;
                let now = Utc::now();

                stats
                    .entry(telegram_id)
                    .or_insert_with(|| {
                        UserStats::new(telegram_id, username.clone(), rumuz.clone(), now)
                    })
                    .record_prediction(username.clone(), rumuz.clone(), now);

                self.store.write(DOCUMENT, &stats).await?;
                Ok(())
            })
            .await
    }

    /// Credits one win. Returns `false` when the identity has no record,
    /// which can only mean the winner never predicted through the bot.
    pub async fn update_correct(&self, telegram_id: TelegramId) -> anyhow::Result<bool> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut stats: UserStatsDoc = self.store.read(DOCUMENT).await?;
                let Some(user) = stats.get_mut(&telegram_id) else {
                    return Ok(false);
                };

                user.record_correct(Utc::now());
                self.store.write(DOCUMENT, &stats).await?;
                Ok(true)
            })
            .await
    }

    /// Takes back the credit of one win after a result correction. Counters
    /// floor at zero; streaks are not rewound.
    pub async fn reverse_correct(&self, telegram_id: TelegramId) -> anyhow::Result<bool> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut stats: UserStatsDoc = self.store.read(DOCUMENT).await?;
                let Some(user) = stats.get_mut(&telegram_id) else {
                    return Ok(false);
                };

                user.reverse_correct(Utc::now());
                self.store.write(DOCUMENT, &stats).await?;
                Ok(true)
            })
            .await
    }

    pub async fn get(&self, telegram_id: TelegramId) -> anyhow::Result<Option<UserStats>> {
        let stats: UserStatsDoc = self.store.read(DOCUMENT).await?;
        Ok(stats.get(&telegram_id).cloned())
    }

    pub async fn get_all(&self) -> anyhow::Result<UserStatsDoc> {
        Ok(self.store.read(DOCUMENT).await?)
    }

    /// Points descending, ties broken by accuracy descending.
    pub async fn leaderboard(&self, limit: usize) -> anyhow::Result<Vec<UserStats>> {
        let stats: UserStatsDoc = self.store.read(DOCUMENT).await?;
        Ok(stats
            .into_values()
            .sorted_by(|a, b| {
                b.total_points.cmp(&a.total_points).then(
                    b.accuracy
                        .partial_cmp(&a.accuracy)
                        .unwrap_or(Ordering::Equal),
                )
            })
            .take(limit)
            .collect())
    }
}
