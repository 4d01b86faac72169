use serde::{Deserialize, Serialize};
use shared::{Prediction, TelegramId};
use tracing::{info, warn};

use crate::Storage;

/// Journal document for the announcement saga. Lives next to the five data
/// documents but is not part of backups: it describes an operation, not data.
const JOURNAL: &str = "reconcile";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Journal {
    pub(crate) pending: Option<PendingAnnouncement>,
}

/// Everything needed to replay an interrupted announcement: who still has to
/// be debited, whether the new result itself landed, who still has to be
/// credited. Progress is checkpointed after every step, so replay skips what
/// already happened instead of double-charging anyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PendingAnnouncement {
    pub(crate) post_id: String,
    pub(crate) home_score: u32,
    pub(crate) away_score: u32,
    pub(crate) reversals: Vec<TelegramId>,
    pub(crate) reversed: Vec<TelegramId>,
    pub(crate) result_stored: bool,
    pub(crate) credits: Option<Vec<TelegramId>>,
    pub(crate) credited: Vec<TelegramId>,
}

impl Storage {
    /// Announces (or corrects) the official result of a post and reconciles
    /// the user scoreboard: winners of a previous result lose their credit,
    /// winners of the new one gain it. Returns the new winners, earliest
    /// correct guess first, for the caller to notify.
    ///
    /// Prior winners without a telegram identity have no scoreboard record,
    /// so there is nothing to reverse for them; their earlier win simply
    /// stands nowhere. That asymmetry is inherited and intentional.
    ///
    /// The steps touch three documents under three separate locks, never two
    /// at once. A crash between steps leaves the journal behind, and
    /// [`Storage::resume_announcement`] finishes the job on the next start.
    pub async fn announce_result(
        &self,
        post_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> anyhow::Result<Vec<Prediction>> {
        let prior_winners = self.results.get_winners(post_id).await?;
        let reversals: Vec<TelegramId> = prior_winners
            .iter()
            .filter_map(|p| p.telegram_id)
            .collect();

        let pending = PendingAnnouncement {
            post_id: post_id.to_owned(),
            home_score,
            away_score,
            reversals,
            reversed: Vec::new(),
            result_stored: false,
            credits: None,
            credited: Vec::new(),
        };
        self.checkpoint(&pending).await?;

        self.run_announcement(pending).await
    }

    /// Finishes an announcement a crash left half-applied. Returns whether
    /// there was one. Call this once at startup, before serving anything.
    pub async fn resume_announcement(&self) -> anyhow::Result<bool> {
        let journal: Journal = self.store.read(JOURNAL).await?;
        let Some(pending) = journal.pending else {
            return Ok(false);
        };

        warn!(
            post_id = %pending.post_id,
            "found an interrupted result announcement, replaying it"
        );
        self.run_announcement(pending).await?;
        Ok(true)
    }

    async fn run_announcement(
        &self,
        mut pending: PendingAnnouncement,
    ) -> anyhow::Result<Vec<Prediction>> {
        for telegram_id in pending.reversals.clone() {
            if pending.reversed.contains(&telegram_id) {
                continue;
            }
            self.user_stats.reverse_correct(telegram_id).await?;
            pending.reversed.push(telegram_id);
            self.checkpoint(&pending).await?;
        }

        if !pending.result_stored {
            self.results
                .create(&pending.post_id, pending.home_score, pending.away_score)
                .await?;
            pending.result_stored = true;
            self.checkpoint(&pending).await?;
        }

        // Deterministic given the stored result, so recomputing on replay is
        // safe; the credited list is what guards against double payment.
        let winners = self.results.get_winners(&pending.post_id).await?;
        if pending.credits.is_none() {
            pending.credits = Some(winners.iter().filter_map(|p| p.telegram_id).collect());
            self.checkpoint(&pending).await?;
        }

        for telegram_id in pending.credits.clone().unwrap_or_default() {
            if pending.credited.contains(&telegram_id) {
                continue;
            }
            self.user_stats.update_correct(telegram_id).await?;
            pending.credited.push(telegram_id);
            self.checkpoint(&pending).await?;
        }

        self.store.write(JOURNAL, &Journal::default()).await?;
        info!(
            post_id = %pending.post_id,
            winners = winners.len(),
            reversed = pending.reversed.len(),
            "result announced"
        );
        Ok(winners)
    }

    async fn checkpoint(&self, pending: &PendingAnnouncement) -> anyhow::Result<()> {
        let journal = Journal {
            pending: Some(pending.clone()),
        };
        Ok(self.store.write(JOURNAL, &journal).await?)
    }

    #[cfg(test)]
    pub(crate) async fn write_journal(&self, pending: PendingAnnouncement) -> anyhow::Result<()> {
        self.checkpoint(&pending).await
    }
}
