//! chagok-api - HTTP API server for the CHAGOK legal evidence hub.
//!
//! Serves case management, presigned upload credentials, evidence listing,
//! and draft previews, and hosts the upload-event pipeline behind an
//! internal intake route. State is wired once at startup: Postgres (or the
//! in-memory repositories when no `DATABASE_URL` is set), the blob store,
//! the per-case vector index, and the OpenAI-compatible model backends.

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use chagok_core::defaults::{API_BODY_LIMIT_BYTES, DEFAULT_BIND_ADDR, ENV_BIND_ADDR, ENV_DATABASE_URL};
use chagok_core::{CaseRepository, EvidenceRepository};
use chagok_db::Database;
use chagok_index::{CaseVectorIndex, InMemoryVectorIndex, QdrantConfig, QdrantVectorIndex};
use chagok_inference::{
    EmbeddingBackend, GenerationBackend, OpenAiEmbeddingBackend, OpenAiGenerationBackend,
    OpenAiTranscriptionBackend, OpenAiVisionBackend, TranscriptionBackend, VisionBackend,
};
use chagok_storage::{BlobStore, FilesystemBlobStore, PresignConfig, Presigner};
use chagok_worker::{EvidenceAnalyzer, ParserRegistry, ResultWriter, UploadHandler};

mod auth;
mod draft;
mod error;
mod handlers;

use auth::AuthConfig;
use draft::DraftComposer;

/// Generates time-ordered UUIDv7 request correlation ids.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub cases: Arc<dyn CaseRepository>,
    pub evidence: Arc<dyn EvidenceRepository>,
    pub index: Arc<dyn CaseVectorIndex>,
    pub presigner: Arc<Presigner>,
    pub auth: Arc<AuthConfig>,
    pub composer: Arc<DraftComposer>,
    pub upload_handler: Arc<UploadHandler>,
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG controls the filter; LOG_FORMAT=json switches to structured
    // output for log shipping.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chagok_api=debug,chagok_worker=debug,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let db = match std::env::var(ENV_DATABASE_URL) {
        Ok(url) => Database::connect(&url).await?,
        Err(_) => {
            warn!("{} is not set; using in-memory repositories", ENV_DATABASE_URL);
            Database::in_memory()
        }
    };

    let presigner = Arc::new(Presigner::new(PresignConfig::from_env()?));
    let blobs: Arc<dyn BlobStore> = Arc::new(FilesystemBlobStore::from_env()?);

    let index: Arc<dyn CaseVectorIndex> = match QdrantConfig::from_env() {
        Some(config) => Arc::new(QdrantVectorIndex::new(config)),
        None => {
            warn!("No index endpoint configured; using in-memory vector index");
            Arc::new(InMemoryVectorIndex::new())
        }
    };

    let transcription: Arc<dyn TranscriptionBackend> = Arc::new(
        OpenAiTranscriptionBackend::from_env()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?,
    );
    let vision: Arc<dyn VisionBackend> = Arc::new(
        OpenAiVisionBackend::from_env()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?,
    );
    let embedding: Arc<dyn EmbeddingBackend> = Arc::new(
        OpenAiEmbeddingBackend::from_env()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?,
    );
    let generation: Arc<dyn GenerationBackend> = Arc::new(
        OpenAiGenerationBackend::from_env()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?,
    );

    let registry = ParserRegistry::with_backends(transcription, vision);
    let analyzer = EvidenceAnalyzer::new(generation.clone(), embedding.clone());
    let writer = ResultWriter::new(db.cases.clone(), db.evidence.clone(), index.clone());
    let upload_handler = Arc::new(UploadHandler::new(
        blobs,
        db.evidence.clone(),
        registry,
        analyzer,
        writer,
    ));

    let composer = Arc::new(DraftComposer::new(
        db.evidence.clone(),
        index.clone(),
        embedding,
        generation,
    ));

    let state = AppState {
        cases: db.cases,
        evidence: db.evidence,
        index,
        presigner,
        auth: Arc::new(AuthConfig::from_env()?),
        composer,
        upload_handler,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/cases", post(handlers::cases::create_case))
        .route("/cases/:case_id/close", post(handlers::cases::close_case))
        .route("/cases/:case_id/members", post(handlers::cases::add_member))
        .route(
            "/cases/:case_id/evidence",
            get(handlers::evidence::list_evidence),
        )
        .route(
            "/cases/:case_id/draft-preview",
            post(handlers::drafts::draft_preview),
        )
        .route(
            "/evidence/presigned-url",
            get(handlers::evidence::presigned_url),
        )
        .route(
            "/evidence/download-url",
            get(handlers::evidence::download_url),
        )
        .route(
            "/internal/storage-events",
            post(handlers::events::storage_events),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::any())
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        .layer(RequestBodyLimitLayer::new(API_BODY_LIMIT_BYTES))
        .with_state(state);

    let addr = std::env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
