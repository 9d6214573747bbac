// === Collections ===
pub const USERS: &str = "users";
pub const TOKENS: &str = "tokens";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";
pub const POST_LIKES: &str = "post_likes";
pub const COMMENT_LIKES: &str = "comment_likes";

// === Content limits ===
pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_COMMENT_LENGTH: usize = 1000;
pub const MAX_IMAGES: usize = 9;
pub const MAX_TAGS: usize = 10;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 3;

/// Key of a single document in the key-value store.
pub fn document_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}

/// Key of the id list that indexes a collection.
pub fn index_key(collection: &str) -> String {
    format!("{}_list", collection)
}

pub fn token_expiration_hours() -> i64 {
    std::env::var("POSTLINE_TOKEN_EXPIRATION_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(24)
}

pub fn bind_addr() -> String {
    std::env::var("POSTLINE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

pub fn seed_data_enabled() -> bool {
    std::env::var("POSTLINE_SEED_DATA")
        .map(|v| !matches!(v.as_str(), "0" | "false" | "off"))
        .unwrap_or(true)
}

pub fn log_filter() -> String {
    std::env::var("POSTLINE_LOG").unwrap_or_else(|_| "info".to_string())
}
