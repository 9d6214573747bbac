use serde_json::json;
use spin_sdk::http::{Request, Response};
use tracing::debug;

use crate::cascade::CascadeManager;
use crate::config::{COMMENTS, COMMENT_LIKES, POSTS, POST_LIKES};
use crate::core::errors::ApiError;
use crate::core::helpers::{new_id, now_iso, require_id};
use crate::core::response::json_response;
use crate::handlers::AppContext;
use crate::models::{Comment, CommentLike, LikeState, Post, PostLike};
use crate::store::{fields, DocumentStore, DocumentStoreExt, Filter};

pub struct LikeService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> LikeService<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn live_post(&self, post_id: &str) -> Result<Post, ApiError> {
        match self.store.get_as::<Post>(POSTS, post_id)? {
            Some(post) if !post.is_deleted => Ok(post),
            _ => Err(ApiError::NotFound("Post not found".to_string())),
        }
    }

    fn post_like_count(&self, post_id: &str) -> Result<i64, ApiError> {
        let likes = self.store.query(POST_LIKES, &Filter::all().eq("post_id", post_id))?;
        Ok(likes.len() as i64)
    }

    pub fn like_post(&self, post_id: &str, acting_user_id: Option<&str>) -> Result<LikeState, ApiError> {
        let user_id = acting_user_id.ok_or(ApiError::Unauthenticated)?;
        require_id(post_id, "Post")?;
        self.live_post(post_id)?;

        let mine = Filter::all().eq("post_id", post_id).eq("user_id", user_id);
        if self.store.query(POST_LIKES, &mine)?.is_empty() {
            let like = PostLike {
                id: new_id(),
                post_id: post_id.to_string(),
                user_id: user_id.to_string(),
                created_at: now_iso(),
            };
            self.store.insert_as(POST_LIKES, &like)?;
            debug!(post_id, user_id, "post liked");
        }

        Ok(LikeState { is_liked: true, like_count: self.post_like_count(post_id)? })
    }

    pub fn unlike_post(&self, post_id: &str, acting_user_id: Option<&str>) -> Result<LikeState, ApiError> {
        let user_id = acting_user_id.ok_or(ApiError::Unauthenticated)?;
        require_id(post_id, "Post")?;
        if self.store.get(POSTS, post_id)?.is_none() {
            return Err(ApiError::NotFound("Post not found".to_string()));
        }

        let mine = Filter::all().eq("post_id", post_id).eq("user_id", user_id);
        let removed = self.store.remove_where(POST_LIKES, &mine)?;
        debug!(post_id, user_id, removed, "post unliked");

        Ok(LikeState { is_liked: false, like_count: self.post_like_count(post_id)? })
    }

    /// Records a like once per user and bumps the comment's counter.
    pub fn like_comment(&self, comment_id: &str, acting_user_id: Option<&str>) -> Result<LikeState, ApiError> {
        let user_id = acting_user_id.ok_or(ApiError::Unauthenticated)?;
        require_id(comment_id, "Comment")?;

        let comment = match self.store.get_as::<Comment>(COMMENTS, comment_id)? {
            Some(c) if !c.is_deleted => c,
            _ => return Err(ApiError::NotFound("Comment not found".to_string())),
        };

        let mine = Filter::all().eq("comment_id", comment_id).eq("user_id", user_id);
        if self.store.query(COMMENT_LIKES, &mine)?.is_empty() {
            let like = CommentLike {
                id: new_id(),
                comment_id: comment_id.to_string(),
                post_id: comment.post_id.clone(),
                user_id: user_id.to_string(),
                created_at: now_iso(),
            };
            self.store.insert_as(COMMENT_LIKES, &like)?;

            let next = comment.like_count.max(0) + 1;
            self.store.update(COMMENTS, comment_id, fields(json!({ "like_count": next })))?;
            debug!(comment_id, user_id, "comment liked");
        }

        let like_count = self
            .store
            .get_as::<Comment>(COMMENTS, comment_id)?
            .map_or(0, |c| c.like_count.max(0));

        Ok(LikeState { is_liked: true, like_count })
    }
}

fn respond(result: Result<LikeState, ApiError>) -> anyhow::Result<Response> {
    match result {
        Ok(state) => json_response(200, state),
        Err(e) => Ok(e.into()),
    }
}

pub fn like_post(req: &Request, ctx: &AppContext, post_id: &str) -> anyhow::Result<Response> {
    let user_id = ctx.identity.resolve(req);
    respond(LikeService::new(ctx.store).like_post(post_id, user_id.as_deref()))
}

pub fn unlike_post(req: &Request, ctx: &AppContext, post_id: &str) -> anyhow::Result<Response> {
    let user_id = ctx.identity.resolve(req);
    respond(LikeService::new(ctx.store).unlike_post(post_id, user_id.as_deref()))
}

pub fn like_comment(req: &Request, ctx: &AppContext, comment_id: &str) -> anyhow::Result<Response> {
    let user_id = ctx.identity.resolve(req);
    respond(LikeService::new(ctx.store).like_comment(comment_id, user_id.as_deref()))
}

pub fn unlike_comment(req: &Request, ctx: &AppContext, comment_id: &str) -> anyhow::Result<Response> {
    let user_id = ctx.identity.resolve(req);
    respond(CascadeManager::new(ctx.store).unlike_comment(comment_id, user_id.as_deref()))
}
