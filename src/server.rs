use crate::config::{RelayConfig, ServerConfig};
use crate::graphql::{
    create_cookbook_schema, create_ingredients_schema, CookbookSchema, IngredientsSchema,
};
use crate::observability::metrics;
use crate::storage::Storage;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

const COOKBOOK_ENDPOINT: &str = "/graphql";
const INGREDIENTS_ENDPOINT: &str = "/ingredients/graphql";

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "cookbook-graphql",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus scrape endpoint
async fn metrics_endpoint() -> impl IntoResponse {
    match metrics::render() {
        Some(body) => (StatusCode::OK, body),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Cookbook GraphQL handler (supports GET and POST)
async fn cookbook_handler(
    Extension(schema): Extension<CookbookSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let started = Instant::now();
    let response = schema.execute(req.into_inner()).await;
    metrics::graphql::record_request("cookbook", started.elapsed(), response.errors.len());
    response.into()
}

/// Relay GraphQL handler (supports GET and POST)
async fn ingredients_handler(
    Extension(schema): Extension<IngredientsSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let started = Instant::now();
    let response = schema.execute(req.into_inner()).await;
    metrics::graphql::record_request("ingredients", started.elapsed(), response.errors.len());
    response.into()
}

fn graphiql_page(endpoint: &str) -> Html<String> {
    Html(GraphiQLSource::build().endpoint(endpoint).finish())
}

/// Create the HTTP server with all routes
pub fn create_server(storage: Arc<dyn Storage>, server: &ServerConfig, relay: &RelayConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let cookbook_schema = create_cookbook_schema(storage.clone(), relay);
    let ingredients_schema = create_ingredients_schema(storage, relay);

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route(COOKBOOK_ENDPOINT, get(cookbook_handler).post(cookbook_handler))
        .route(
            INGREDIENTS_ENDPOINT,
            get(ingredients_handler).post(ingredients_handler),
        );

    if server.graphiql {
        router = router
            .route("/graphiql", get(|| async { graphiql_page(COOKBOOK_ENDPOINT) }))
            .route(
                "/ingredients/graphiql",
                get(|| async { graphiql_page(INGREDIENTS_ENDPOINT) }),
            );
    }

    router
        .layer(Extension(cookbook_schema))
        .layer(Extension(ingredients_schema))
        .layer(ServiceBuilder::new().layer(cors))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Start the HTTP server and serve until Ctrl-C
pub async fn start_server(
    storage: Arc<dyn Storage>,
    server: &ServerConfig,
    relay: &RelayConfig,
) -> anyhow::Result<()> {
    let app = create_server(storage, server, relay);
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;

    info!("HTTP server listening on {}", addr);
    println!("🚀 HTTP server running on http://{addr}");
    println!("💚 Health check:     http://{addr}/health");
    println!("🔎 Cookbook GraphQL: http://{addr}{COOKBOOK_ENDPOINT}");
    println!("🔎 Relay GraphQL:    http://{addr}{INGREDIENTS_ENDPOINT}");
    if server.graphiql {
        println!("🧪 GraphiQL UI:      http://{addr}/graphiql");
    }

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
