use serde::Deserialize;
use spin_sdk::http::{Request, Response};
use tracing::{debug, info};

use crate::config::{token_expiration_hours, TOKENS, USERS};
use crate::core::errors::ApiError;
use crate::core::helpers::{bearer_token, new_id, now_iso, read_json, verify_password};
use crate::core::response::{json_response, message_response};
use crate::handlers::AppContext;
use crate::models::{TokenData, User};
use crate::store::{DocumentStore, DocumentStoreExt, Filter};

/// Maps an incoming request to the id of the user making it.
pub trait IdentityResolver {
    fn resolve(&self, req: &Request) -> Option<String>;
}

/// Resolves `Authorization: Bearer <token>` against stored session tokens.
pub struct TokenIdentityResolver<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> TokenIdentityResolver<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// The user owning `token`, if the token is live and the user still exists.
    pub fn resolve_token(&self, token: &str) -> Option<String> {
        let data = self.store.get_as::<TokenData>(TOKENS, token).ok()??;

        if let Ok(created) = chrono::DateTime::parse_from_rfc3339(&data.created_at) {
            let age_hours = (chrono::Utc::now() - created.with_timezone(&chrono::Utc)).num_hours();
            if age_hours > token_expiration_hours() {
                debug!(user_id = %data.user_id, "token expired");
                return None;
            }
        }

        self.store.get_as::<User>(USERS, &data.user_id).ok()??;
        Some(data.user_id)
    }
}

impl IdentityResolver for TokenIdentityResolver<'_> {
    fn resolve(&self, req: &Request) -> Option<String> {
        self.resolve_token(bearer_token(req)?)
    }
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub fn login(store: &dyn DocumentStore, username: &str, password: &str) -> Result<TokenData, ApiError> {
    let users: Vec<User> = store.query_as(USERS, &Filter::all().eq("username", username))?;

    let user = users
        .into_iter()
        .find(|u| verify_password(password, &u.password))
        .ok_or(ApiError::Unauthenticated)?;

    let token = TokenData {
        id: new_id(),
        user_id: user.id,
        created_at: now_iso(),
    };
    store.insert_as(TOKENS, &token)?;
    info!(user_id = %token.user_id, "user logged in");
    Ok(token)
}

pub fn login_user(req: &Request, ctx: &AppContext) -> anyhow::Result<Response> {
    let creds: Credentials = match read_json(req) {
        Ok(c) => c,
        Err(e) => return Ok(e.into()),
    };

    match login(ctx.store, &creds.username, &creds.password) {
        Ok(token) => json_response(200, serde_json::json!({
            "token": token.id,
            "user_id": token.user_id
        })),
        Err(e) => Ok(e.into()),
    }
}

pub fn logout_user(req: &Request, ctx: &AppContext) -> anyhow::Result<Response> {
    let token = match bearer_token(req) {
        Some(t) => t,
        None => return Ok(ApiError::Unauthenticated.into()),
    };

    ctx.store.remove_where(TOKENS, &Filter::all().eq("id", token))?;

    message_response(200, "Logged out successfully")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::helpers::hash_password;
    use crate::store::MemoryDocumentStore;
    use spin_sdk::http::Method;

    fn store_with_user() -> (MemoryDocumentStore, User) {
        let store = MemoryDocumentStore::new();
        let user = User {
            id: new_id(),
            username: "carol".to_string(),
            password: hash_password("secret").unwrap(),
        };
        store.insert_as(USERS, &user).unwrap();
        (store, user)
    }

    fn request_with(auth: &str) -> Request {
        Request::builder()
            .method(Method::Get)
            .uri("/posts")
            .header("Authorization", auth)
            .body(Vec::new())
            .build()
    }

    #[test]
    fn login_then_resolve() {
        let (store, user) = store_with_user();
        let token = login(&store, "carol", "secret").unwrap();

        let resolver = TokenIdentityResolver::new(&store);
        let req = request_with(&format!("Bearer {}", token.id));
        assert_eq!(resolver.resolve(&req), Some(user.id));
    }

    #[test]
    fn wrong_password_is_unauthenticated() {
        let (store, _) = store_with_user();
        assert!(matches!(login(&store, "carol", "nope"), Err(ApiError::Unauthenticated)));
        assert!(matches!(login(&store, "dave", "secret"), Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn rejects_malformed_and_unknown_tokens() {
        let (store, _) = store_with_user();
        let resolver = TokenIdentityResolver::new(&store);

        assert_eq!(resolver.resolve(&request_with("Basic abc")), None);
        assert_eq!(resolver.resolve(&request_with("Bearer ")), None);
        assert_eq!(resolver.resolve(&request_with("Bearer unknown")), None);
    }

    #[test]
    fn rejects_expired_token() {
        let (store, user) = store_with_user();
        let stale = TokenData {
            id: "stale".to_string(),
            user_id: user.id,
            created_at: (chrono::Utc::now() - chrono::Duration::days(30)).to_rfc3339(),
        };
        store.insert_as(TOKENS, &stale).unwrap();

        assert_eq!(TokenIdentityResolver::new(&store).resolve_token("stale"), None);
    }

    #[test]
    fn rejects_token_of_removed_user() {
        let (store, user) = store_with_user();
        let token = login(&store, "carol", "secret").unwrap();
        store.remove_where(USERS, &Filter::all().eq("id", user.id.as_str())).unwrap();

        assert_eq!(TokenIdentityResolver::new(&store).resolve_token(&token.id), None);
    }
}
