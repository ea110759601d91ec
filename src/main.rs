//! HTTP shell around the clustering pipeline.
//!
//! Two routes: `POST /clusters` runs the pipeline over a batch of named
//! embeddings, `GET /health` answers 204 with no body. The pipeline itself
//! is synchronous CPU work, so each request runs on a blocking thread; the
//! only shared state is the immutable configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{MatchedPath, State};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use huddle::{ClusterGroups, ClusteringRequest, Error, Pipeline, PipelineConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "huddle-server", about = "Clustering service for named embeddings")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "[::]:8000")]
    listen: SocketAddr,

    /// Optional JSON file overriding the default pipeline configuration.
    /// Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone)]
struct ApiState {
    pipeline: Arc<Pipeline>,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_invalid_input() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::PAYLOAD_TOO_LARGE
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

async fn clusters(
    State(state): State<ApiState>,
    Json(request): Json<ClusteringRequest>,
) -> Result<Json<ClusterGroups>, ApiError> {
    let pipeline = state.pipeline.clone();
    let groups: ClusterGroups = tokio::task::spawn_blocking(move || pipeline.cluster(request))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        })??;

    tracing::info!(groups = groups.len(), "clustered batch");
    Ok(Json(groups))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig, anyhow::Error> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install shutdown handler: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let state = ApiState {
        pipeline: Arc::new(Pipeline::new(config)),
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(tower_http::cors::Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let matched_path = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str);

            tracing::info_span!("request", uri = matched_path)
        })
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let app = Router::new()
        .route("/clusters", post(clusters))
        .route("/health", get(health))
        .layer(cors)
        .layer(trace_layer)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!("starting clustering server on {}", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
