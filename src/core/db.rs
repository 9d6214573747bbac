use tracing::info;

use crate::config::{COMMENTS, COMMENT_LIKES, POSTS, USERS};
use crate::core::helpers::{hash_password, new_id, now_iso};
use crate::models::{Comment, CommentLike, Post, User};
use crate::store::{DocumentStore, DocumentStoreExt, Filter};

const SEED_USERS: [(&str, &str); 3] = [
    ("test", "This is my first post!"),
    ("alice", "Welcome to my board! Excited to share thoughts here."),
    ("bob", "Hey everyone! Just joined, looking forward to connecting with you all."),
];

/// Creates the demo users with one post each. Existing users are left alone.
pub fn init_test_data(store: &dyn DocumentStore) -> anyhow::Result<()> {
    let mut created = Vec::new();

    for (username, content) in SEED_USERS {
        let existing = store.query(USERS, &Filter::all().eq("username", username))?;
        if !existing.is_empty() {
            continue;
        }

        let user = User {
            id: new_id(),
            username: username.to_string(),
            password: hash_password(username)?,
        };
        store.insert_as(USERS, &user)?;

        let post = Post {
            id: new_id(),
            user_id: user.id.clone(),
            content: content.to_string(),
            images: Vec::new(),
            tags: vec!["hello".to_string()],
            is_deleted: false,
            deleted_at: None,
            created_at: now_iso(),
            updated_at: None,
        };
        store.insert_as(POSTS, &post)?;
        created.push((user, post));
    }

    // alice comments on bob's post and test likes the comment
    if let [_, (alice, _), (_, bob_post)] = created.as_slice() {
        let tester = store.query_as::<User>(USERS, &Filter::all().eq("username", "test"))?;
        let comment = Comment {
            id: new_id(),
            post_id: bob_post.id.clone(),
            user_id: alice.id.clone(),
            content: "Welcome aboard, Bob!".to_string(),
            like_count: tester.len() as i64,
            is_deleted: false,
            deleted_at: None,
            created_at: now_iso(),
        };
        store.insert_as(COMMENTS, &comment)?;

        for user in tester {
            let like = CommentLike {
                id: new_id(),
                comment_id: comment.id.clone(),
                post_id: bob_post.id.clone(),
                user_id: user.id,
                created_at: now_iso(),
            };
            store.insert_as(COMMENT_LIKES, &like)?;
        }
    }

    if !created.is_empty() {
        info!(users = created.len(), "seeded demo data");
    }
    Ok(())
}
