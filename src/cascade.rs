//! Post deletion cascade and comment-like counter reconciliation.
//!
//! Neither operation takes a lock. DeletePost is safe to repeat because it
//! checks `is_deleted` before writing, and every cascade step is a filter-based
//! write that can be re-applied. The unlike path never trusts a delta: it
//! clamps on write, re-reads the stored counter and repairs a negative value.
//!
//! Cascade steps are best effort. A failed step is logged and reported in the
//! [`CascadeReport`], the remaining steps still run, and the delete itself is
//! not rolled back.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{COMMENTS, COMMENT_LIKES, POSTS, POST_LIKES};
use crate::core::errors::ApiError;
use crate::core::helpers::{now_iso, require_id};
use crate::models::{Comment, LikeState, Post};
use crate::store::{fields, DocumentStore, DocumentStoreExt, Filter};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed { affected: usize },
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub post_likes: StepOutcome,
    pub comment_likes: StepOutcome,
    pub comments: StepOutcome,
}

impl CascadeReport {
    pub fn fully_applied(&self) -> bool {
        self.post_likes.is_completed() && self.comment_likes.is_completed() && self.comments.is_completed()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub post_id: String,
    pub already_deleted: bool,
    /// Absent when the post was already deleted and nothing was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade: Option<CascadeReport>,
}

pub struct CascadeManager<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> CascadeManager<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Soft-deletes a post owned by `acting_user_id` and cleans up its likes
    /// and comments.
    pub fn delete_post(&self, post_id: &str, acting_user_id: Option<&str>) -> Result<DeleteOutcome, ApiError> {
        require_id(post_id, "Post")?;
        let user_id = acting_user_id.ok_or(ApiError::Unauthenticated)?;

        let post: Post = self
            .store
            .get_as(POSTS, post_id)?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
        if post.user_id != user_id {
            return Err(ApiError::PermissionDenied);
        }

        if post.is_deleted {
            debug!(post_id, "post already deleted");
            return Ok(DeleteOutcome {
                post_id: post_id.to_string(),
                already_deleted: true,
                cascade: None,
            });
        }

        let now = now_iso();
        let updated = self.store.update(POSTS, post_id, fields(json!({
            "is_deleted": true,
            "deleted_at": now,
            "content": "",
            "images": [],
            "tags": [],
        })))?;
        // removed between the read and the write
        if !updated {
            return Err(ApiError::NotFound("Post not found".to_string()));
        }

        let by_post = Filter::all().eq("post_id", post_id);
        let cascade = CascadeReport {
            post_likes: run_step(post_id, "post_likes", || {
                self.store.remove_where(POST_LIKES, &by_post)
            }),
            comment_likes: run_step(post_id, "comment_likes", || {
                self.store.remove_where(COMMENT_LIKES, &by_post)
            }),
            comments: run_step(post_id, "comments", || {
                self.store.update_where(COMMENTS, &by_post, fields(json!({
                    "is_deleted": true,
                    "deleted_at": now,
                    "content": "",
                })))
            }),
        };

        if cascade.fully_applied() {
            info!(post_id, "post deleted");
        } else {
            warn!(post_id, "post deleted with partial cascade");
        }

        Ok(DeleteOutcome {
            post_id: post_id.to_string(),
            already_deleted: false,
            cascade: Some(cascade),
        })
    }

    /// Removes the actor's likes on a comment and returns the reconciled
    /// counter. Safe to call when no like exists.
    pub fn unlike_comment(&self, comment_id: &str, acting_user_id: Option<&str>) -> Result<LikeState, ApiError> {
        let user_id = acting_user_id.ok_or(ApiError::Unauthenticated)?;
        require_id(comment_id, "Comment")?;

        let mine = Filter::all().eq("comment_id", comment_id).eq("user_id", user_id);
        let existing = self.store.query(COMMENT_LIKES, &mine)?;

        if !existing.is_empty() {
            if existing.len() > 1 {
                warn!(comment_id, user_id, duplicates = existing.len(), "duplicate comment likes");
            }
            self.store.remove_where(COMMENT_LIKES, &mine)?;

            if let Some(comment) = self.store.get_as::<Comment>(COMMENTS, comment_id)? {
                let next = (comment.like_count - 1).max(0);
                self.store.update(COMMENTS, comment_id, fields(json!({ "like_count": next })))?;
            }
        }

        let comment: Comment = self
            .store
            .get_as(COMMENTS, comment_id)?
            .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

        let mut like_count = comment.like_count;
        if like_count < 0 {
            warn!(comment_id, like_count, "negative like count repaired");
            self.store.update(COMMENTS, comment_id, fields(json!({ "like_count": 0 })))?;
            like_count = 0;
        }

        Ok(LikeState { is_liked: false, like_count })
    }
}

fn run_step(post_id: &str, step: &'static str, op: impl FnOnce() -> anyhow::Result<usize>) -> StepOutcome {
    match op() {
        Ok(affected) => {
            debug!(post_id, step, affected, "cascade step completed");
            StepOutcome::Completed { affected }
        }
        Err(err) => {
            warn!(post_id, step, error = %err, "cascade step failed");
            StepOutcome::Failed { error: err.to_string() }
        }
    }
}
