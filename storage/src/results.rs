use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use itertools::Itertools;
use shared::{MatchResult, Prediction};

use crate::predictions::PredictionsDoc;
use crate::{JsonStore, LockManager};

const DOCUMENT: &str = "results";

pub(crate) type ResultsDoc = BTreeMap<String, MatchResult>;

/// One official result per post, and winner computation against it.
#[derive(Debug, Clone)]
pub struct ResultRepository {
    store: JsonStore,
    locks: Arc<LockManager>,
}

impl ResultRepository {
    pub(crate) fn new(store: JsonStore, locks: Arc<LockManager>) -> Self {
        Self { store, locks }
    }

    /// Sets or overwrites the result. Reconciling user stats across an
    /// overwrite is the announcement saga's job, not this repository's.
    pub async fn create(
        &self,
        post_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> anyhow::Result<()> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut results: ResultsDoc = self.store.read(DOCUMENT).await?;
                results.insert(
                    post_id.to_owned(),
                    MatchResult {
                        home_score,
                        away_score,
                        announced_at: Utc::now(),
                    },
                );
                self.store.write(DOCUMENT, &results).await?;
                Ok(())
            })
            .await
    }

    pub async fn get(&self, post_id: &str) -> anyhow::Result<Option<MatchResult>> {
        let results: ResultsDoc = self.store.read(DOCUMENT).await?;
        Ok(results.get(post_id).cloned())
    }

    pub async fn get_all(&self) -> anyhow::Result<ResultsDoc> {
        Ok(self.store.read(DOCUMENT).await?)
    }

    /// Guesses whose score line exactly equals the stored result, earliest
    /// first. Hidden guesses win like any other; hiding only affects display.
    /// Empty when the post has no result yet.
    pub async fn get_winners(&self, post_id: &str) -> anyhow::Result<Vec<Prediction>> {
        let results: ResultsDoc = self.store.read(DOCUMENT).await?;
        let Some(result) = results.get(post_id) else {
            return Ok(vec![]);
        };

        let predictions: PredictionsDoc = self.store.read("predictions").await?;
        Ok(predictions
            .get(post_id)
            .map(|list| {
                list.iter()
                    .filter(|p| p.matches(result))
                    .cloned()
                    .sorted_by(|a, b| a.created_at.cmp(&b.created_at))
                    .collect()
            })
            .unwrap_or_default())
    }
}
