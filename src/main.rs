use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use protek_cms::config::{self, Environment};
use protek_cms::handlers::{protected, public};
use protek_cms::{database, graphql, middleware};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting ProtekCMS API in {:?} mode", config.environment);

    if let Err(e) = database::run_migrations().await {
        tracing::warn!("migrations not applied at startup: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("PROTEK_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("ProtekCMS API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Playground HTML is browser-facing; the handler 404s outside development
        .route("/api/graphql", get(graphql::graphql_playground))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    let config = config::config();
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
}

fn protected_routes() -> Router {
    Router::new()
        .merge(page_routes())
        .merge(media_routes())
        .merge(client_routes())
        .merge(catalog_routes())
        .merge(admin_routes())
        .route_layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

fn page_routes() -> Router {
    use protected::{pages, sections};

    Router::new()
        .route("/api/pages", get(pages::list).post(pages::create))
        .route(
            "/api/pages/:id",
            get(pages::get).put(pages::update).delete(pages::delete),
        )
        .route("/api/pages/:id/restore", post(pages::restore))
        // Section collection lives under its page
        .route(
            "/api/pages/:id/sections",
            get(sections::list).post(sections::create),
        )
        .route("/api/pages/:id/sections/order", put(sections::reorder))
        .route(
            "/api/sections/:id",
            get(sections::get)
                .patch(sections::patch)
                .delete(sections::delete),
        )
}

fn media_routes() -> Router {
    use protected::media;

    // Body limit must exceed the upload handler's byte cap so that check runs;
    // the slack covers multipart framing and the alt field.
    Router::new()
        .route("/api/media", get(media::list).post(media::upload))
        .route("/api/media/:id", get(media::get).delete(media::delete))
        .route("/api/media/:id/raw", get(media::raw))
        .layer(DefaultBodyLimit::max(
            config::config().media.max_upload_bytes + 64 * 1024,
        ))
}

fn client_routes() -> Router {
    use protected::clients;

    Router::new()
        .route("/api/clients", get(clients::list).post(clients::create))
        .route(
            "/api/clients/:id",
            get(clients::get)
                .put(clients::update)
                .delete(clients::delete),
        )
        .route(
            "/api/clients/:id/legal-entities",
            get(clients::list_legal_entities).post(clients::create_legal_entity),
        )
        .route(
            "/api/clients/:id/legal-entities/:child_id",
            delete(clients::delete_legal_entity),
        )
        .route(
            "/api/clients/:id/contracts",
            get(clients::list_contracts).post(clients::create_contract),
        )
        .route(
            "/api/clients/:id/contracts/:child_id",
            delete(clients::delete_contract),
        )
        .route(
            "/api/clients/:id/contacts",
            get(clients::list_contacts).post(clients::create_contact),
        )
        .route(
            "/api/clients/:id/contacts/:child_id",
            delete(clients::delete_contact),
        )
        .route(
            "/api/clients/:id/garage",
            get(clients::list_vehicles).post(clients::create_vehicle),
        )
        .route(
            "/api/clients/:id/garage/:child_id",
            delete(clients::delete_vehicle),
        )
}

fn catalog_routes() -> Router {
    Router::new().route("/api/graphql", post(graphql::graphql_handler))
}

fn admin_routes() -> Router {
    use protected::{account, audit, find};

    Router::new()
        .route("/api/audit", get(audit::list))
        .route(
            "/api/account",
            get(account::get).put(account::update),
        )
        .route("/api/account/password", put(account::change_password))
        .route("/api/find/:entity", post(find::find))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "ProtekCMS API",
            "version": version,
            "description": "Content management and admin backend for the Protek auto-parts business",
            "endpoints": {
                "home": "/ (public)",
                "public_auth": "/auth/login, /auth/refresh (public - token acquisition)",
                "pages": "/api/pages[/:id] (protected)",
                "sections": "/api/pages/:id/sections, /api/sections/:id (protected)",
                "media": "/api/media[/:id] (protected)",
                "clients": "/api/clients[/:id] plus child collections (protected)",
                "catalog": "/api/graphql (protected)",
                "audit": "/api/audit (protected)",
                "account": "/api/account (protected)",
                "find": "/api/find/:entity (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
