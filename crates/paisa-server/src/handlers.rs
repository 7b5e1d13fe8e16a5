//! HTTP request handlers for the statement upload service.
//!
//! Implements the upload, provider info, and health check endpoints using
//! axum. Authentication is external; the authenticated user arrives as the
//! `x-user-id` header.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use paisa_document::DocumentError;
use paisa_domain::Transaction;
use paisa_extractor::{ExtractError, ExtractionRequest, StatementExtractor};
use paisa_llm::{ChatCompleter, ProviderChoice, ProviderInfo};
use paisa_store::SqliteStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Uploads larger than this are refused outright (raw file bytes)
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
pub struct AppState<C> {
    /// The extraction pipeline
    pub extractor: Arc<StatementExtractor<C, SqliteStore>>,
    /// Providers configured at startup, for the informational endpoint
    pub providers: Vec<ProviderInfo>,
    /// Provider preference bound from the environment at startup
    pub provider_choice: ProviderChoice,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            providers: self.providers.clone(),
            provider_choice: self.provider_choice,
        }
    }
}

/// Successful upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Always true on the success path
    pub success: bool,
    /// Number of transactions persisted
    pub count: usize,
    /// The persisted transactions, in extraction order
    pub data: Vec<Transaction>,
    /// Human-readable summary
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Overall service status
    pub status: &'static str,
    /// Number of LLM providers with credentials configured
    pub providers_configured: usize,
}

/// Provider info response
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Configured providers in priority order
    pub providers: Vec<ProviderInfo>,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false on the error path
    pub success: bool,
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// The `x-user-id` header is absent or empty
    MissingUser,
    /// The multipart body is malformed or has no file field
    BadUpload(String),
    /// The uploaded file could not be decoded to text
    Document(DocumentError),
    /// Extraction pipeline error
    Extract(ExtractError),
}

impl From<DocumentError> for AppError {
    fn from(e: DocumentError) -> Self {
        AppError::Document(e)
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        AppError::Extract(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingUser => (
                StatusCode::UNAUTHORIZED,
                "Missing x-user-id header".to_string(),
            ),
            AppError::BadUpload(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Document(e) => {
                let status = match e {
                    DocumentError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string())
            }
            AppError::Extract(e) => (extract_status(&e), e.to_string()),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
        });
        (status, body).into_response()
    }
}

/// Map pipeline errors to HTTP statuses
fn extract_status(error: &ExtractError) -> StatusCode {
    match error {
        ExtractError::EmptyContent
        | ExtractError::TooLarge(_, _)
        | ExtractError::NotAStatement
        | ExtractError::NoTransactionsExtracted
        | ExtractError::NoValidTransactions => StatusCode::BAD_REQUEST,
        ExtractError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        ExtractError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /statements/upload - Extract transactions from an uploaded statement
///
/// Multipart body with a `file` field; the field's content type selects the
/// decoder (PDF, CSV, or plain text).
async fn upload_statement<C>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    C: ChatCompleter + 'static,
{
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or(AppError::MissingUser)?
        .to_string();

    let mut file: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadUpload(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let mime = field
                .content_type()
                .unwrap_or("text/plain")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadUpload(format!("Failed to read file field: {}", e)))?;
            file = Some((data.to_vec(), mime));
        }
    }

    let (bytes, mime) = file.ok_or_else(|| AppError::BadUpload("Missing file field".to_string()))?;

    let content = paisa_document::decode(&bytes, &mime)?;

    let outcome = state
        .extractor
        .extract(ExtractionRequest::new(content, user_id).with_provider(state.provider_choice))
        .await
        .map_err(|e| {
            warn!(error = %e, "Statement extraction failed");
            e
        })?;

    let count = outcome.materialized.inserted();
    Ok(Json(UploadResponse {
        success: true,
        count,
        data: outcome.materialized.transactions,
        message: format!(
            "Extracted {} transactions via {}",
            count, outcome.provider
        ),
    }))
}

/// GET /providers - Informational list of configured providers
async fn list_providers<C>(State(state): State<AppState<C>>) -> Json<ProvidersResponse>
where
    C: ChatCompleter + 'static,
{
    Json(ProvidersResponse {
        providers: state.providers.clone(),
    })
}

/// GET /health - Liveness check
async fn health_check<C>(State(state): State<AppState<C>>) -> Json<HealthCheckResponse>
where
    C: ChatCompleter + 'static,
{
    let status = if state.providers.is_empty() {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthCheckResponse {
        status,
        providers_configured: state.providers.len(),
    })
}

/// Create the axum router with all routes
pub fn create_router<C>(state: AppState<C>) -> Router
where
    C: ChatCompleter + 'static,
{
    Router::new()
        .route("/statements/upload", post(upload_statement::<C>))
        .route("/providers", get(list_providers::<C>))
        .route("/health", get(health_check::<C>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use paisa_extractor::ExtractorConfig;
    use paisa_llm::{MockCompleter, ProviderGateway, ProviderName};
    use std::sync::Mutex;
    use tower::ServiceExt; // for oneshot

    const BOUNDARY: &str = "test-boundary";

    const STATEMENT: &str = "Kotak Bank Statement\n06-09-2023 UPI/LILA PITTURA DECO Cr 300.00";

    const ONE_TXN_RESPONSE: &str = r#"[{"description":"UPI/LILA PITTURA DECO","amount":300,
        "type":"income","category":"other","date":"2023-09-06",
        "merchant":"LILA PITTURA DECO","currency":"INR"}]"#;

    fn test_state(completer: MockCompleter) -> AppState<MockCompleter> {
        let gateway = ProviderGateway::with_backends(vec![(ProviderName::Groq, completer)]);
        let store = Arc::new(Mutex::new(SqliteStore::new(":memory:").unwrap()));
        let extractor = Arc::new(StatementExtractor::new(
            gateway,
            store,
            ExtractorConfig::default(),
        ));

        AppState {
            extractor,
            providers: vec![],
            provider_choice: ProviderChoice::Auto,
        }
    }

    fn multipart_body(content: &str, mime: &str) -> Body {
        Body::from(format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"statement.txt\"\r\n\
             Content-Type: {mime}\r\n\r\n\
             {content}\r\n\
             --{b}--\r\n",
            b = BOUNDARY,
            mime = mime,
            content = content,
        ))
    }

    fn upload_request(content: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/statements/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        builder.body(multipart_body(content, "text/plain")).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state(MockCompleter::default()));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_providers_endpoint() {
        let app = create_router(test_state(MockCompleter::default()));

        let request = Request::builder()
            .uri("/providers")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_persists_and_returns_ok() {
        let state = test_state(MockCompleter::new(ONE_TXN_RESPONSE));
        let extractor = Arc::clone(&state.extractor);
        let app = create_router(state);

        let response = app
            .oneshot(upload_request(STATEMENT, Some("user-1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let store = extractor.store();
        let count = {
            use paisa_domain::TransactionStore;
            store.lock().unwrap().count_for_user("user-1").unwrap()
        };
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_upload_without_user_is_unauthorized() {
        let app = create_router(test_state(MockCompleter::new(ONE_TXN_RESPONSE)));

        let response = app.oneshot(upload_request(STATEMENT, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_statement_upload_is_bad_request() {
        let app = create_router(test_state(MockCompleter::new(ONE_TXN_RESPONSE)));

        let response = app
            .oneshot(upload_request(
                "a recipe for lemon cake with frosting",
                Some("user-1"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limited_maps_to_429() {
        let completer = MockCompleter::new("unused");
        completer.set_rate_limited(true);
        let app = create_router(test_state(completer));

        let response = app
            .oneshot(upload_request(STATEMENT, Some("user-1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_unsupported_mime_is_rejected() {
        let app = create_router(test_state(MockCompleter::new(ONE_TXN_RESPONSE)));

        let request = Request::builder()
            .method("POST")
            .uri("/statements/upload")
            .header("x-user-id", "user-1")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(STATEMENT, "image/png"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_bad_request() {
        let app = create_router(test_state(MockCompleter::new(ONE_TXN_RESPONSE)));

        let body = Body::from(format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\r\n\
             no file here\r\n\
             --{b}--\r\n",
            b = BOUNDARY,
        ));
        let request = Request::builder()
            .method("POST")
            .uri("/statements/upload")
            .header("x-user-id", "user-1")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(body)
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
