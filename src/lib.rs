pub mod auth;
pub mod cascade;
pub mod comments;
pub mod config;
pub mod core;
pub mod handlers;
pub mod likes;
pub mod models;
pub mod posts;
pub mod store;
pub mod telemetry;
pub mod users;

#[cfg(target_arch = "wasm32")]
use spin_sdk::{
    http::{IntoResponse, Request},
    http_component,
};

// === Component entrypoint ===
#[cfg(target_arch = "wasm32")]
#[http_component]
fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
    telemetry::init_tracing();

    let store = store::KvDocumentStore::open_default()?;
    if config::seed_data_enabled() {
        if let Err(err) = crate::core::db::init_test_data(&store) {
            tracing::warn!(error = %err, "seeding demo data failed");
        }
    }

    let identity = auth::TokenIdentityResolver::new(&store);
    let ctx = handlers::AppContext::new(&store, &identity);
    Ok(handlers::route(&req, &ctx))
}
