#[cfg(not(target_arch = "wasm32"))]
mod native {
    extern crate postline;

    use actix_web::{web, App, HttpServer, HttpRequest, HttpResponse};
    use postline::auth::TokenIdentityResolver;
    use postline::handlers::{route, AppContext};
    use postline::store::MemoryDocumentStore;

    mod adapter {
        use actix_web::HttpRequest;
        use spin_sdk::http::{Request, Method};

        pub fn actix_to_spin_request(req: &HttpRequest, body: actix_web::web::Bytes) -> Request {
            let method = match req.method().as_str() {
                "GET" => Method::Get,
                "POST" => Method::Post,
                "PUT" => Method::Put,
                "DELETE" => Method::Delete,
                "HEAD" => Method::Head,
                "OPTIONS" => Method::Options,
                "PATCH" => Method::Patch,
                _ => Method::Get,
            };

            let mut builder = Request::builder();
            builder.method(method).uri(req.uri().to_string());

            for (name, value) in req.headers() {
                if let Ok(val_str) = value.to_str() {
                    builder.header(name.as_str(), val_str);
                }
            }

            builder.body(body.to_vec()).build()
        }

        pub fn spin_to_actix_response(spin_resp: spin_sdk::http::Response) -> actix_web::HttpResponse {
            let status = *spin_resp.status();
            let body = spin_resp.body().to_vec();

            actix_web::HttpResponse::build(
                actix_web::http::StatusCode::from_u16(status)
                    .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
            )
            .content_type("application/json")
            .body(body)
        }
    }

    pub async fn run() -> std::io::Result<()> {
        postline::telemetry::init_tracing();

        let store = web::Data::new(MemoryDocumentStore::new());
        if postline::config::seed_data_enabled() {
            if let Err(err) = postline::core::db::init_test_data(store.get_ref()) {
                tracing::warn!(error = %err, "seeding demo data failed");
            }
        }

        let addr = postline::config::bind_addr();
        tracing::info!(%addr, "server listening");

        HttpServer::new(move || {
            App::new()
                .app_data(store.clone())
                .default_service(web::route().to(handle_all))
        })
        .bind(addr)?
        .run()
        .await
    }

    async fn handle_all(
        req: HttpRequest,
        body: web::Bytes,
        store: web::Data<MemoryDocumentStore>,
    ) -> HttpResponse {
        let spin_req = adapter::actix_to_spin_request(&req, body);

        let store = store.get_ref();
        let identity = TokenIdentityResolver::new(store);
        let resp = route(&spin_req, &AppContext::new(store, &identity));

        adapter::spin_to_actix_response(resp)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    native::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
