use spin_sdk::http::{Method, Request, Response};
use tracing::debug;

use crate::auth::IdentityResolver;
use crate::core::errors::ApiError;
use crate::store::DocumentStore;
use crate::{auth, comments, likes, posts, users};

/// Collaborators every handler needs, injected by the entry point.
pub struct AppContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub identity: &'a dyn IdentityResolver,
}

impl<'a> AppContext<'a> {
    pub fn new(store: &'a dyn DocumentStore, identity: &'a dyn IdentityResolver) -> Self {
        Self { store, identity }
    }
}

fn method_name(method: &Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Put => "PUT",
        Method::Delete => "DELETE",
        Method::Patch => "PATCH",
        _ => "OTHER",
    }
}

fn dispatch(req: &Request, ctx: &AppContext) -> anyhow::Result<Response> {
    let method = method_name(req.method());
    let path = req.path();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    debug!(method, path, "dispatch");

    match (method, segments.as_slice()) {
        ("POST", ["users"]) => users::create_user(req, ctx),
        ("POST", ["login"]) => auth::login_user(req, ctx),
        ("POST", ["logout"]) => auth::logout_user(req, ctx),
        ("POST", ["posts"]) => posts::create_post(req, ctx),
        ("GET", ["posts", id]) => posts::get_post(req, ctx, id),
        ("DELETE", ["posts", id]) => posts::delete_post(req, ctx, id),
        ("POST", ["posts", id, "comments"]) => comments::create_comment(req, ctx, id),
        ("POST", ["posts", id, "like"]) => likes::like_post(req, ctx, id),
        ("DELETE", ["posts", id, "like"]) => likes::unlike_post(req, ctx, id),
        ("POST", ["comments", id, "like"]) => likes::like_comment(req, ctx, id),
        ("DELETE", ["comments", id, "like"]) => likes::unlike_comment(req, ctx, id),
        _ => Ok(ApiError::NotFound("No route found".to_string()).into()),
    }
}

/// Routes a request; errors that escape a handler become a 500 envelope.
pub fn route(req: &Request, ctx: &AppContext) -> Response {
    match dispatch(req, ctx) {
        Ok(resp) => resp,
        Err(err) => ApiError::Internal(format!("{:#}", err)).into(),
    }
}
