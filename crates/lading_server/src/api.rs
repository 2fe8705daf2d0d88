//! HTTP routes of the bridge.

use crate::{Credentials, IngestReport, IngestRequest, IngestionPipeline, require_basic_auth};
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use lading_error::{LadingError, LadingErrorKind};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

/// Shared state handed to every route.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct AppState {
    /// Ingestion pipeline
    pipeline: Arc<IngestionPipeline>,
    /// Expected basic-auth credentials
    credentials: Credentials,
    /// Records returned by `/preview-data` when no limit is given
    preview_limit: usize,
    /// Records inferred over by `/infer-types` when no limit is given
    infer_limit: usize,
}

impl AppState {
    /// Creates new API state.
    pub fn new(
        pipeline: IngestionPipeline,
        credentials: Credentials,
        preview_limit: usize,
        infer_limit: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            credentials,
            preview_limit,
            infer_limit,
        }
    }
}

/// A failure rendered as `{"detail": ...}` with a status derived from its kind.
#[derive(Debug)]
pub struct ApiError(LadingError);

impl<E> From<E> for ApiError
where
    E: Into<LadingError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// Status code for this error.
    ///
    /// Client input and empty batches are 400, auth failures 401, remote
    /// API failures 502, everything else 500.
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            LadingErrorKind::Input(_) | LadingErrorKind::Inference(_) => StatusCode::BAD_REQUEST,
            LadingErrorKind::Auth(_) => StatusCode::UNAUTHORIZED,
            LadingErrorKind::Fetch(_) => StatusCode::BAD_GATEWAY,
            LadingErrorKind::Database(_)
            | LadingErrorKind::Config(_)
            | LadingErrorKind::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message, without source locations.
    pub fn detail(&self) -> String {
        match self.0.kind() {
            LadingErrorKind::Input(e) => e.kind.to_string(),
            LadingErrorKind::Inference(e) => e.kind.to_string(),
            LadingErrorKind::Database(e) => e.kind.to_string(),
            LadingErrorKind::Fetch(e) => e.message.clone(),
            LadingErrorKind::Auth(e) => e.kind.to_string(),
            LadingErrorKind::Config(e) => e.message.clone(),
            LadingErrorKind::Backend(e) => e.message.clone(),
        }
    }

    /// The wrapped error.
    pub fn inner(&self) -> &LadingError {
        &self.0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, %status, "Request failed");
        } else {
            tracing::warn!(error = %self.0, %status, "Request rejected");
        }

        let mut response = (status, Json(json!({"detail": self.detail()}))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        }
        response
    }
}

/// Query string of the read-only routes.
#[derive(Debug, Deserialize)]
struct EndpointQuery {
    endpoint: String,
    limit: Option<usize>,
}

/// Creates the bridge router.
///
/// `/` is public; every other route requires basic auth.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/test-connection", get(test_connection))
        .route("/test-hana-connection", get(test_connection))
        .route("/extract-and-write", post(extract_and_write))
        .route("/preview-data", get(preview_data))
        .route("/infer-types", get(infer_types))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    Router::new()
        .route("/", get(root))
        .merge(protected)
        .with_state(state)
}

/// Public liveness endpoint.
async fn root() -> impl IntoResponse {
    Json(json!({"message": "API-to-warehouse bridge is running"}))
}

async fn test_connection(State(state): State<AppState>) -> Result<Json<JsonValue>, ApiError> {
    let response = state.pipeline.test_connection().await?;
    Ok(Json(json!({"status": "success", "warehouse_response": response})))
}

async fn extract_and_write(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let report = state.pipeline.ingest(request).await?;
    Ok(Json(report))
}

async fn preview_data(
    State(state): State<AppState>,
    Query(query): Query<EndpointQuery>,
) -> Result<Json<JsonValue>, ApiError> {
    let limit = query.limit.unwrap_or(state.preview_limit);
    let batch = state.pipeline.preview(&query.endpoint, limit).await?;
    Ok(Json(json!({"preview": batch})))
}

async fn infer_types(
    State(state): State<AppState>,
    Query(query): Query<EndpointQuery>,
) -> Result<Json<JsonValue>, ApiError> {
    let limit = query.limit.unwrap_or(state.infer_limit);
    let schema = state.pipeline.infer_types(&query.endpoint, limit).await?;
    Ok(Json(json!({"inferred_types": schema.type_map()})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lading_error::{
        AuthError, AuthErrorKind, FetchError, InferenceError, InferenceErrorKind, InputError,
        InputErrorKind,
    };

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(InputError::new(InputErrorKind::EmptyResponse)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(InferenceError::new(InferenceErrorKind::ColumnCollision {
                first: "id".to_string(),
                second: "ID".to_string(),
                column: "ID".to_string(),
            }))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::new(AuthErrorKind::InvalidCredentials)).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(FetchError::new("timeout")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_detail_omits_location() {
        let err = ApiError::from(AuthError::new(AuthErrorKind::InvalidCredentials));
        assert_eq!(err.detail(), "Unauthorized");
    }

    #[test]
    fn test_unauthorized_response_challenges() {
        let response =
            ApiError::from(AuthError::new(AuthErrorKind::MissingCredentials)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Basic");
    }
}
