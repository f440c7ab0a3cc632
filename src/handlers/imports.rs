//! CSV import, history and undo endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::services::batch_uploader::PgRecordSink;
use crate::services::import_history::{ImportService, PgImportHistoryStore};
use crate::types::{
    ImportCsvRequest, ImportHistoryEntry, ImportKind, ImportResponse, ListQuery, ListResponse, UndoImportResponse,
};

const MAX_PAGE_SIZE: i64 = 200;

/// Upload body whose rejections use the JSON error envelope
pub struct ImportBody(pub ImportCsvRequest);

fn body_rejection(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("import file is larger than the configured upload limit".into())
    } else {
        ApiError::validation(rejection.body_text())
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequest<S> for ImportBody {
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<ImportCsvRequest>::from_request(request, state)
            .await
            .map_err(body_rejection)?;
        Ok(ImportBody(body))
    }
}

pub async fn import_csv(
    State(state): State<AppState>,
    user: AuthUser,
    Path(kind): Path<String>,
    ImportBody(request): ImportBody,
) -> ApiResult<Json<ImportResponse>> {
    user.require_admin()?;
    let kind = ImportKind::parse(&kind).ok_or_else(|| ApiError::validation(format!("Unknown import type '{}'", kind)))?;
    if request.file_name.trim().is_empty() {
        return Err(ApiError::validation("file_name is required"));
    }

    let projects = queries::project::list_project_refs(&state.pool).await?;
    let sink = PgRecordSink::new(state.pool.clone());
    let history = PgImportHistoryStore::new(state.pool.clone());

    let response = ImportService::new(&sink, &history)
        .import_csv(kind, request, projects, Some(user.user_id))
        .await?;
    Ok(Json(response))
}

pub async fn list_imports(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<ImportHistoryEntry>>> {
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.max(0);
    let (items, total) = queries::import::list_history(&state.pool, limit, offset).await?;
    Ok(Json(ListResponse {
        items,
        total,
        limit,
        offset,
    }))
}

pub async fn undo_import(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UndoImportResponse>> {
    user.require_admin()?;
    let sink = PgRecordSink::new(state.pool.clone());
    let history = PgImportHistoryStore::new(state.pool.clone());

    let response = ImportService::new(&sink, &history).undo(id, Some(user.user_id)).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::DefaultBodyLimit;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::defaults::IMPORT_BODY_LIMIT_BYTES;

    async fn rows_received(ImportBody(request): ImportBody) -> String {
        request.csv_content.lines().count().to_string()
    }

    fn upload_router(limit: usize) -> Router {
        Router::new().route("/upload", post(rows_received).layer(DefaultBodyLimit::max(limit)))
    }

    /// Calls export of roughly 2.4 MB, above axum's default body limit
    fn large_upload() -> axum::http::Request<Body> {
        let mut csv = String::from("project_name,lead_name,lead_phone_number,call_datetime\n");
        for i in 0..45_000 {
            csv.push_str(&format!("Smile Dental,Lead {i},555{i:07},2024-03-01 10:00\n"));
        }
        let body = serde_json::json!({ "file_name": "calls.csv", "csv_content": csv });
        axum::http::Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn large_exports_fit_the_import_limit() {
        let response = upload_router(IMPORT_BODY_LIMIT_BYTES).oneshot(large_upload()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"45001");
    }

    #[tokio::test]
    async fn oversized_upload_gets_error_envelope() {
        let response = upload_router(1024 * 1024).oneshot(large_upload()).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn malformed_upload_is_invalid_request() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"file_name": "calls.csv"}"#))
            .unwrap();
        let response = upload_router(IMPORT_BODY_LIMIT_BYTES).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
