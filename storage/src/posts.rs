use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use itertools::Itertools;
use shared::{NewPost, Post, PostUpdate};
use uuid::Uuid;

use crate::{JsonStore, LockManager};

const DOCUMENT: &str = "posts";

pub(crate) type PostsDoc = BTreeMap<String, Post>;

/// Lifecycle of published contest events.
#[derive(Debug, Clone)]
pub struct PostRepository {
    store: JsonStore,
    locks: Arc<LockManager>,
}

impl PostRepository {
    pub(crate) fn new(store: JsonStore, locks: Arc<LockManager>) -> Self {
        Self { store, locks }
    }

    pub async fn create(&self, new_post: NewPost) -> anyhow::Result<String> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut posts: PostsDoc = self.store.read(DOCUMENT).await?;
                let now = Utc::now();
                let id = Uuid::new_v4().to_string();

                posts.insert(
                    id.clone(),
                    Post {
                        id: id.clone(),
                        kind: new_post.kind,
                        text: new_post.text,
                        file_id: new_post.file_id,
                        channel_id: new_post.channel_id,
                        message_id: new_post.message_id,
                        title: new_post.title,
                        deadline: new_post.deadline,
                        home_team: new_post.home_team,
                        away_team: new_post.away_team,
                        created_at: now,
                        updated_at: now,
                    },
                );

                self.store.write(DOCUMENT, &posts).await?;
                Ok(id)
            })
            .await
    }

    /// Shallow merge of the admin-editable fields. Returns `false` when the
    /// id is unknown.
    pub async fn update(&self, id: &str, update: PostUpdate) -> anyhow::Result<bool> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut posts: PostsDoc = self.store.read(DOCUMENT).await?;
                let Some(post) = posts.get_mut(id) else {
                    return Ok(false);
                };

                if let Some(text) = update.text {
                    post.text = text;
                }
                if let Some(title) = update.title {
                    post.title = Some(title);
                }
                if let Some(deadline) = update.deadline {
                    post.deadline = deadline;
                }
                if let Some(home_team) = update.home_team {
                    post.home_team = Some(home_team);
                }
                if let Some(away_team) = update.away_team {
                    post.away_team = Some(away_team);
                }
                post.updated_at = Utc::now();

                self.store.write(DOCUMENT, &posts).await?;
                Ok(true)
            })
            .await
    }

    /// Idempotent: removing an absent id still succeeds.
    pub async fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.locks
            .with_lock(DOCUMENT, async {
                let mut posts: PostsDoc = self.store.read(DOCUMENT).await?;
                posts.remove(id);
                self.store.write(DOCUMENT, &posts).await?;
                Ok(())
            })
            .await
    }

    pub async fn get(&self, id: &str) -> anyhow::Result<Option<Post>> {
        let posts: PostsDoc = self.store.read(DOCUMENT).await?;
        Ok(posts.get(id).cloned())
    }

    pub async fn get_all(&self) -> anyhow::Result<PostsDoc> {
        Ok(self.store.read(DOCUMENT).await?)
    }

    /// Posts still open for submissions: no deadline, or one strictly in the
    /// future. Newest first.
    pub async fn get_active(&self) -> anyhow::Result<Vec<Post>> {
        let posts: PostsDoc = self.store.read(DOCUMENT).await?;
        let now = Utc::now();
        Ok(posts
            .into_values()
            .filter(|post| post.is_active(now))
            .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
            .collect())
    }

    /// Newest first, truncated to `limit`.
    pub async fn get_all_sorted(&self, limit: usize) -> anyhow::Result<Vec<Post>> {
        let posts: PostsDoc = self.store.read(DOCUMENT).await?;
        Ok(posts
            .into_values()
            .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
            .take(limit)
            .collect())
    }
}
