use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::cascade::CascadeManager;
use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{filter_content, new_id, now_iso, read_json, require_id, visible_len};
use crate::core::response::json_response;
use crate::handlers::AppContext;
use crate::models::Post;
use crate::store::{DocumentStore, DocumentStoreExt, Filter};

#[derive(Deserialize, Default)]
pub struct NewPost {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub like_count: i64,
}

/// Trims tags, drops blanks and keeps the first occurrence of each.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

pub fn publish(store: &dyn DocumentStore, acting_user_id: Option<&str>, input: NewPost) -> Result<Post, ApiError> {
    let user_id = acting_user_id.ok_or(ApiError::Unauthenticated)?;

    let raw = input.content.trim();
    if raw.chars().count() > MAX_POST_LENGTH {
        return Err(ApiError::InvalidArgument("Invalid content".to_string()));
    }
    let content = filter_content(raw);
    if visible_len(&content) == 0 {
        return Err(ApiError::InvalidArgument("Invalid content".to_string()));
    }
    if input.images.len() > MAX_IMAGES {
        return Err(ApiError::InvalidArgument(format!("At most {} images", MAX_IMAGES)));
    }
    let tags = normalize_tags(input.tags);
    if tags.len() > MAX_TAGS {
        return Err(ApiError::InvalidArgument(format!("At most {} tags", MAX_TAGS)));
    }

    let post = Post {
        id: new_id(),
        user_id: user_id.to_string(),
        content,
        images: input.images,
        tags,
        is_deleted: false,
        deleted_at: None,
        created_at: now_iso(),
        updated_at: None,
    };
    store.insert_as(POSTS, &post)?;
    info!(post_id = %post.id, user_id, "post created");

    Ok(post)
}

pub fn fetch(store: &dyn DocumentStore, post_id: &str) -> Result<PostView, ApiError> {
    require_id(post_id, "Post")?;
    let post: Post = store
        .get_as(POSTS, post_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    let like_count = store.query(POST_LIKES, &Filter::all().eq("post_id", post_id))?.len() as i64;

    Ok(PostView { post, like_count })
}

pub fn create_post(req: &Request, ctx: &AppContext) -> anyhow::Result<Response> {
    let user_id = match ctx.identity.resolve(req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthenticated.into()),
    };
    let input: NewPost = match read_json(req) {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };

    match publish(ctx.store, Some(user_id.as_str()), input) {
        Ok(post) => json_response(201, post),
        Err(e) => Ok(e.into()),
    }
}

pub fn get_post(_req: &Request, ctx: &AppContext, post_id: &str) -> anyhow::Result<Response> {
    match fetch(ctx.store, post_id) {
        Ok(view) => json_response(200, view),
        Err(e) => Ok(e.into()),
    }
}

pub fn delete_post(req: &Request, ctx: &AppContext, post_id: &str) -> anyhow::Result<Response> {
    let user_id = ctx.identity.resolve(req);

    match CascadeManager::new(ctx.store).delete_post(post_id, user_id.as_deref()) {
        Ok(outcome) => json_response(200, outcome),
        Err(e) => Ok(e.into()),
    }
}
