use crate::agent::ChatAgent;
use crate::cli::Args;
use crate::error::ChatError;
use crate::models::chat::{ ChatRequest, ChatResponse };
use crate::server::shutdown::shutdown_signal;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::{
    routing::{ get, post },
    Router,
    extract::{ rejection::JsonRejection, State },
    Json,
};
use serde::Serialize;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn };

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: String,
    model: String,
}

#[derive(Clone)]
struct AppState {
    agent: Arc<ChatAgent>,
}

pub fn router(agent: Arc<ChatAgent>, max_concurrent_requests: usize) -> Router {
    let app_state = AppState { agent };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", post(chat_handler))
        .route("/chat", post(chat_handler))
        // One permit pool shared by both chat routes; /health stays outside it.
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(app_state)
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<ChatAgent>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(agent, args.max_concurrent_requests);

    if args.enable_tls {
        let (Some(cert_path), Some(key_path)) = (&args.tls_cert_path, &args.tls_key_path) else {
            return Err("TLS enabled but --tls-cert-path or --tls-key-path is missing".into());
        };

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(30)));
        });

        info!("Starting HTTPS chat server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(app.into_make_service()).await?;
    } else {
        let listener = tokio::net::TcpListener
            ::bind(addr).await
            .map_err(|e| format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e))?;

        info!("Starting HTTP chat server on: http://{}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal()).await?;
    }

    info!("Chat server stopped");
    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(request) = payload.map_err(|e| ChatError::InvalidBody(e.body_text()))?;

    match state.agent.process_request(request).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            warn!("Chat request rejected: {}", e);
            Err(e)
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.agent.llm_type().to_string(),
        model: state.agent.model(),
    })
}
