//! HTTP API gateway for Lectern.
//!
//! Exposes the chat endpoint and a health check. The gateway owns the
//! boundary concerns the QA core stays out of: question pre-sanitization,
//! the per-user quota consultation, per-session orchestrator instances, and
//! the mapping from the core's error taxonomy to HTTP statuses.
//!
//! Built on Axum for high performance async HTTP.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use lectern_chain::{
    NamespaceBudgetedRetriever, PromptAssembler, QaOrchestrator, RateLimiter, RetrieverConfig,
    RetryExecutor, RetryPolicy,
};
use lectern_core::{
    CourseCatalog, EmbeddingService, Error, GenerativeModel, InMemoryQuotaStore, QuotaDecision,
    QuotaGate, RetrievedDocument, VectorIndex,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: lectern_config::AppConfig,
    pub catalog: CourseCatalog,
    pub quota: Arc<dyn QuotaGate>,
    embeddings: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn GenerativeModel>,
    /// Shared retry executor — all sessions share one process-wide rate window.
    retry: RetryExecutor,
    /// One orchestrator per session key; each owns its history buffer.
    sessions: RwLock<HashMap<String, Arc<QaOrchestrator>>>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(
        config: lectern_config::AppConfig,
        catalog: CourseCatalog,
        quota: Arc<dyn QuotaGate>,
        embeddings: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.max_requests_per_minute));
        let retry = RetryExecutor::new(
            limiter,
            RetryPolicy::new(
                config.retry.max_retries,
                std::time::Duration::from_millis(config.retry.base_delay_ms),
                std::time::Duration::from_millis(config.retry.max_delay_ms),
            ),
        );
        Self {
            config,
            catalog,
            quota,
            embeddings,
            index,
            model,
            retry,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The orchestrator for one session, created on first use with the
    /// course's catalog namespaces.
    async fn orchestrator_for(
        &self,
        session_key: &str,
        course: &str,
    ) -> Option<Arc<QaOrchestrator>> {
        if let Some(existing) = self.sessions.read().await.get(session_key) {
            return Some(existing.clone());
        }

        let namespaces = self.catalog.namespaces_for(course)?.to_vec();

        let mut sessions = self.sessions.write().await;
        // A concurrent request may have created it between the locks.
        if let Some(existing) = sessions.get(session_key) {
            return Some(existing.clone());
        }

        let retriever = NamespaceBudgetedRetriever::new(
            self.embeddings.clone(),
            self.index.clone(),
            self.retry.clone(),
            RetrieverConfig {
                document_budget: self.config.retrieval.document_budget,
                per_namespace_top_k: self.config.retrieval.per_namespace_top_k,
                max_namespaces: self.config.retrieval.max_namespaces,
            },
        );
        let orchestrator = Arc::new(QaOrchestrator::new(
            retriever,
            PromptAssembler::new(self.config.prompt.character_budget),
            self.model.clone(),
            self.retry.clone(),
            namespaces,
            self.config.history.buffer_max_size,
        ));
        sessions.insert(session_key.to_string(), orchestrator.clone());
        Some(orchestrator)
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: lectern_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let catalog = CourseCatalog::from_json_file(&config.catalog_path)?;
    info!(courses = catalog.len(), "Course catalog loaded");

    let embeddings = Arc::new(
        lectern_providers::OpenAiCompatClient::new(
            &config.embedding.api_url,
            config.embedding.api_key.clone().unwrap_or_default(),
        )
        .with_embedding_model(&config.embedding.model),
    );
    let model = Arc::new(
        lectern_providers::OpenAiCompatClient::new(
            &config.generation.api_url,
            config.generation.api_key.clone().unwrap_or_default(),
        )
        .with_chat_model(&config.generation.model)
        .with_temperature(config.generation.temperature),
    );
    let index = Arc::new(lectern_providers::PineconeIndexClient::new(
        &config.index.api_url,
        config.index.api_key.clone().unwrap_or_default(),
    ));
    let quota = Arc::new(InMemoryQuotaStore::new());

    let state = Arc::new(GatewayState::new(
        config, catalog, quota, embeddings, index, model,
    ));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub history: String,
    /// Course label, also the namespace filter (e.g. "INFO 2950").
    pub course: String,
    pub user: String,
    /// Chat session identifier; one history buffer per session.
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub source_documents: Vec<RetrievedDocument>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let question = sanitize_question(&payload.question);
    if question.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No question in the request",
        ));
    }

    // Quota first: a user with no messages left never reaches the pipeline.
    if state.quota.try_consume(&payload.user).await == QuotaDecision::Exhausted {
        warn!(user = %payload.user, "message quota exhausted");
        return Err(error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "User has exceeded their limit for messages",
        ));
    }

    let session_key = session_key(&payload.user, payload.session.as_deref(), &payload.course);
    let Some(orchestrator) = state.orchestrator_for(&session_key, &payload.course).await else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            &format!("Unknown course: {}", payload.course),
        ));
    };

    match orchestrator
        .call(&question, &payload.history, &payload.course)
        .await
    {
        Ok(result) => Ok(Json(ChatResponse {
            answer: result.answer,
            source_documents: result.source_documents.into_documents(),
        })),
        Err(e) => {
            error!(error = %e, course = %payload.course, "qa call failed");
            Err(error_response(status_for(&e), &e.to_string()))
        }
    }
}

/// Map the core error taxonomy to HTTP statuses.
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        Error::EmbeddingFailure
        | Error::GenerationFailure
        | Error::UpstreamRejected(_)
        | Error::UpstreamExhausted { .. } => StatusCode::BAD_GATEWAY,
        Error::Config { .. } | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Trim the question and replace newlines with spaces — embedding models
/// behave best without raw line breaks.
fn sanitize_question(question: &str) -> String {
    question.trim().replace('\n', " ")
}

fn session_key(user: &str, session: Option<&str>, course: &str) -> String {
    format!("{user}/{}/{course}", session.unwrap_or("default"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::UpstreamError;

    #[test]
    fn question_sanitization() {
        assert_eq!(
            sanitize_question("  What is\nsampling?\n"),
            "What is sampling?"
        );
        assert_eq!(sanitize_question("   \n  "), "");
    }

    #[test]
    fn session_keys_separate_users_sessions_and_courses() {
        let a = session_key("alice", Some("s1"), "INFO 2950");
        let b = session_key("alice", Some("s2"), "INFO 2950");
        let c = session_key("bob", Some("s1"), "INFO 2950");
        let d = session_key("alice", None, "INFO 2950");
        assert!(a != b && a != c && a != d);
        assert_eq!(d, "alice/default/INFO 2950");
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(
            status_for(&Error::QuotaExceeded { user: "u".into() }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_for(&Error::EmbeddingFailure), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&Error::GenerationFailure),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::UpstreamExhausted {
                attempts: 6,
                source: UpstreamError::Api {
                    status_code: 503,
                    message: "unavailable".into()
                }
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Config {
                message: "bad".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
