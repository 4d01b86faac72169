use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostKind {
    Text,
    Photo,
    Video,
}

/// One published contest event. Keyed by its id in the `posts` document,
/// with the id repeated inside the record so query results are self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub text: String,
    /// Bot-side reference to the attached media, when the post is not text-only.
    pub file_id: Option<String>,
    pub channel_id: Option<i64>,
    pub message_id: Option<i64>,
    pub title: Option<String>,
    /// Submissions close at this instant. `None` means the post never closes.
    pub deadline: Option<DateTime<Utc>>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// A post with a deadline exactly at `now` is already closed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => deadline > now,
            None => true,
        }
    }
}

/// Payload for [`Post`] creation; ids and timestamps are stamped by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub text: String,
    pub file_id: Option<String>,
    pub channel_id: Option<i64>,
    pub message_id: Option<i64>,
    pub title: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
}

/// Partial update for admin edits. `None` leaves the field untouched;
/// the double option on `deadline` lets an edit clear it explicitly.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub text: Option<String>,
    pub title: Option<String>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deadline_exactly_now_is_closed() {
        let now = Utc.with_ymd_and_hms(2024, 9, 21, 20, 0, 0).unwrap();
        let mut post = Post {
            id: "p1".to_owned(),
            kind: PostKind::Text,
            text: String::new(),
            file_id: None,
            channel_id: None,
            message_id: None,
            title: None,
            deadline: Some(now),
            home_team: None,
            away_team: None,
            created_at: now,
            updated_at: now,
        };

        assert!(!post.is_active(now));
        assert!(post.is_active(now - chrono::Duration::seconds(1)));

        post.deadline = None;
        assert!(post.is_active(now));
    }
}
