use serde::Deserialize;
use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{filter_content, new_id, now_iso, read_json, require_id, visible_len};
use crate::core::response::json_response;
use crate::handlers::AppContext;
use crate::models::{Comment, Post};
use crate::store::{DocumentStore, DocumentStoreExt};

#[derive(Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub content: String,
}

pub fn add_comment(
    store: &dyn DocumentStore,
    acting_user_id: Option<&str>,
    post_id: &str,
    input: NewComment,
) -> Result<Comment, ApiError> {
    let user_id = acting_user_id.ok_or(ApiError::Unauthenticated)?;
    require_id(post_id, "Post")?;

    let raw = input.content.trim();
    if raw.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ApiError::InvalidArgument("Invalid content".to_string()));
    }
    let content = filter_content(raw);
    if visible_len(&content) == 0 {
        return Err(ApiError::InvalidArgument("Invalid content".to_string()));
    }

    match store.get_as::<Post>(POSTS, post_id)? {
        Some(post) if !post.is_deleted => {}
        _ => return Err(ApiError::NotFound("Post not found".to_string())),
    }

    let comment = Comment {
        id: new_id(),
        post_id: post_id.to_string(),
        user_id: user_id.to_string(),
        content,
        like_count: 0,
        is_deleted: false,
        deleted_at: None,
        created_at: now_iso(),
    };
    store.insert_as(COMMENTS, &comment)?;
    info!(comment_id = %comment.id, post_id, "comment created");

    Ok(comment)
}

pub fn create_comment(req: &Request, ctx: &AppContext, post_id: &str) -> anyhow::Result<Response> {
    let user_id = match ctx.identity.resolve(req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthenticated.into()),
    };
    let input: NewComment = match read_json(req) {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };

    match add_comment(ctx.store, Some(user_id.as_str()), post_id, input) {
        Ok(comment) => json_response(201, comment),
        Err(e) => Ok(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::{publish, NewPost};
    use crate::store::MemoryDocumentStore;

    fn comment(content: &str) -> NewComment {
        NewComment { content: content.to_string() }
    }

    #[test]
    fn comments_attach_to_live_posts_only() {
        let store = MemoryDocumentStore::new();
        let post = publish(&store, Some("author"), NewPost { content: "hi".to_string(), ..NewPost::default() }).unwrap();

        let c = add_comment(&store, Some("reader"), &post.id, comment("nice <b>post</b>")).unwrap();
        assert_eq!(c.like_count, 0);
        assert_eq!(c.post_id, post.id);

        assert!(matches!(
            add_comment(&store, Some("reader"), &new_id(), comment("lost")),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            add_comment(&store, Some("reader"), &post.id, comment("")),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            add_comment(&store, None, &post.id, comment("anon")),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn markup_only_comment_is_rejected() {
        let store = MemoryDocumentStore::new();
        let post = publish(&store, Some("author"), NewPost { content: "hi".to_string(), ..NewPost::default() }).unwrap();

        for content in ["<script>alert(1)</script>", "<b> </b>", "<img src=x>"] {
            assert!(matches!(
                add_comment(&store, Some("reader"), &post.id, comment(content)),
                Err(ApiError::InvalidArgument(_))
            ));
        }
        assert!(store.is_empty(COMMENTS));

        let long = "é".repeat(MAX_COMMENT_LENGTH);
        assert!(add_comment(&store, Some("reader"), &post.id, comment(&long)).is_ok());
    }
}
