use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{hash_password, new_id, read_json, sanitize_text};
use crate::core::response::json_response;
use crate::handlers::AppContext;
use crate::models::User;
use crate::store::{DocumentStore, DocumentStoreExt, Filter};

#[derive(Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user; never carries the password hash.
#[derive(Serialize, Debug)]
pub struct UserView {
    pub id: String,
    pub username: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self { id: user.id.clone(), username: user.username.clone() }
    }
}

pub fn register(store: &dyn DocumentStore, input: NewUser) -> Result<UserView, ApiError> {
    // length limits apply to the name as stored
    let username = sanitize_text(input.username.trim());
    if username.is_empty() {
        return Err(ApiError::InvalidArgument("Username is required".to_string()));
    }
    let name_len = username.chars().count();
    if name_len < MIN_USERNAME_LENGTH || name_len > MAX_USERNAME_LENGTH {
        return Err(ApiError::InvalidArgument("Username must be 3-50 characters".to_string()));
    }
    if input.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::InvalidArgument("Password must be at least 3 characters".to_string()));
    }

    let existing = store.query(USERS, &Filter::all().eq("username", username.as_str()))?;
    if !existing.is_empty() {
        return Err(ApiError::Conflict("Username exists".to_string()));
    }

    let user = User {
        id: new_id(),
        username,
        password: hash_password(&input.password)?,
    };
    store.insert_as(USERS, &user)?;
    info!(user_id = %user.id, "user created");

    Ok(UserView::from(&user))
}

pub fn create_user(req: &Request, ctx: &AppContext) -> anyhow::Result<Response> {
    let input: NewUser = match read_json(req) {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };

    match register(ctx.store, input) {
        Ok(user) => json_response(201, user),
        Err(e) => Ok(e.into()),
    }
}
