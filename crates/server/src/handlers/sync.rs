//! Blob sync endpoints.
//!
//! Every handler authorizes against the root named in the path before it
//! validates any path segment or reads the body. Segments are taken from the
//! URI as sent rather than through `Path`, which percent-decodes them and
//! rejects invalid UTF-8 before the handler runs. A segment carrying a `%`
//! escape is never a valid key segment, so it still fails validation, just
//! after the 401 check.

use crate::auth::require_root_access;
use crate::coordinator::UploadStatus;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use syncvault_core::{BlobEntry, BlobKey, RootKey, Segment};
use time::OffsetDateTime;

const OCTET_STREAM: &str = "application/octet-stream";
const SYNC_PREFIX: &str = "/v1/sync/";

/// Response for a stored blob.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub size: u64,
}

/// Query parameters for listing a root.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Restrict the listing to one device.
    #[serde(rename = "deviceId", alias = "device_id")]
    pub device_id: Option<String>,
}

/// PUT /v1/sync/{app_id}/{root_id}/{device_id}/{event_id}
///
/// Stores the raw request body. 201 when the blob is new, 200 when it
/// replaced an existing one.
#[tracing::instrument(skip_all, fields(path = %uri.path()))]
pub async fn upload_blob(
    State(state): State<AppState>,
    uri: Uri,
    req: Request,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let [app_id, root_id, device_id, event_id] = raw_segments(&uri)?;
    require_root_access(&state.registry, req.headers(), app_id, root_id)?;
    let key = BlobKey::parse(app_id, root_id, device_id, event_id)?;

    check_content_type(req.headers())?;
    let data = read_upload_body(req, state.config.server.body_limit()).await?;

    let receipt = state.coordinator.upload(&key, data).await?;
    let status = match receipt.status {
        UploadStatus::Created => StatusCode::CREATED,
        UploadStatus::Updated => StatusCode::OK,
    };

    Ok((
        status,
        Json(UploadResponse {
            created_at: receipt.entry.created_at,
            size: receipt.entry.size,
        }),
    ))
}

/// GET /v1/sync/{app_id}/{root_id}/{device_id}/{event_id}
#[tracing::instrument(skip_all, fields(path = %uri.path()))]
pub async fn download_blob(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let [app_id, root_id, device_id, event_id] = raw_segments(&uri)?;
    require_root_access(&state.registry, &headers, app_id, root_id)?;
    let key = BlobKey::parse(app_id, root_id, device_id, event_id)?;

    let data = state.coordinator.download(&key).await?;
    tracing::debug!(size = data.len(), "serving blob");

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM)),
            (CONTENT_LENGTH, HeaderValue::from(data.len())),
        ],
        Body::from(data),
    )
        .into_response())
}

/// DELETE /v1/sync/{app_id}/{root_id}/{device_id}/{event_id}
///
/// 204 whether or not anything was there.
#[tracing::instrument(skip_all, fields(path = %uri.path()))]
pub async fn delete_blob(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let [app_id, root_id, device_id, event_id] = raw_segments(&uri)?;
    require_root_access(&state.registry, &headers, app_id, root_id)?;
    let key = BlobKey::parse(app_id, root_id, device_id, event_id)?;

    state.coordinator.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/sync/{app_id}/{root_id}?deviceId=
///
/// An empty `deviceId` is the same as no filter.
#[tracing::instrument(skip_all, fields(path = %uri.path()))]
pub async fn list_blobs(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<BlobEntry>>> {
    let [app_id, root_id] = raw_segments(&uri)?;
    require_root_access(&state.registry, &headers, app_id, root_id)?;
    let root = RootKey::parse(app_id, root_id)?;

    // Parsed here rather than by an extractor so a bad query string cannot
    // pre-empt the 401.
    let Query(query) = Query::<ListQuery>::try_from_uri(&uri)
        .map_err(|e| ApiError::BadRequest(format!("invalid query: {}", e.body_text())))?;
    let device_filter = match query.device_id.as_deref() {
        None | Some("") => None,
        Some(device_id) => Some(Segment::parse("deviceId", device_id)?),
    };

    let entries = state.coordinator.list(&root, device_filter.as_ref()).await?;
    Ok(Json(entries))
}

/// Split the part of a sync route after `/v1/sync/` into its `N` segments,
/// still percent-encoded.
fn raw_segments<const N: usize>(uri: &Uri) -> ApiResult<[&str; N]> {
    let rest = uri
        .path()
        .strip_prefix(SYNC_PREFIX)
        .ok_or_else(|| ApiError::BadRequest(format!("not a sync path: {}", uri.path())))?;
    let segments: Vec<&str> = rest.split('/').collect();
    segments
        .try_into()
        .map_err(|_| ApiError::BadRequest(format!("expected {N} path segments: {}", uri.path())))
}

/// Accept a missing Content-Type or `application/octet-stream` (parameters
/// ignored). Anything else is a client error.
fn check_content_type(headers: &HeaderMap) -> ApiResult<()> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(());
    };

    let mime = value
        .to_str()
        .ok()
        .and_then(|v| v.split(';').next())
        .map(str::trim);

    match mime {
        Some(mime) if mime.eq_ignore_ascii_case(OCTET_STREAM) => Ok(()),
        _ => Err(ApiError::BadRequest(format!(
            "unsupported content type {value:?}, expected {OCTET_STREAM}"
        ))),
    }
}

/// Buffer the request body, failing with 413 as soon as it exceeds `limit`.
async fn read_upload_body(req: Request, limit: usize) -> ApiResult<Bytes> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(declared) = declared
        && declared > limit as u64
    {
        return Err(ApiError::PayloadTooLarge(format!(
            "body of {declared} bytes exceeds limit of {limit}"
        )));
    }

    let mut stream = req.into_body().into_data_stream();
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
        if buffer.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge(format!(
                "body exceeds limit of {limit} bytes"
            )));
        }
        buffer.extend_from_slice(&chunk);
    }

    if buffer.is_empty() {
        return Err(ApiError::BadRequest("request body is empty".to_string()));
    }
    Ok(buffer.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_raw_segments_keep_escapes() {
        let uri: Uri = "/v1/sync/app1/root1/devA/%FF".parse().unwrap();
        assert_eq!(
            raw_segments::<4>(&uri).unwrap(),
            ["app1", "root1", "devA", "%FF"]
        );

        let uri: Uri = "/v1/sync/app1/root1?deviceId=devA".parse().unwrap();
        assert_eq!(raw_segments::<2>(&uri).unwrap(), ["app1", "root1"]);
        assert!(raw_segments::<4>(&uri).is_err());

        let uri: Uri = "/v1/health".parse().unwrap();
        assert!(raw_segments::<2>(&uri).is_err());
    }

    #[test]
    fn test_content_type_check() {
        assert!(check_content_type(&HeaderMap::new()).is_ok());
        assert!(check_content_type(&content_type("application/octet-stream")).is_ok());
        assert!(check_content_type(&content_type("Application/Octet-Stream; charset=binary")).is_ok());
        assert!(check_content_type(&content_type("application/json")).is_err());
        assert!(check_content_type(&content_type("text/plain")).is_err());
    }

    #[tokio::test]
    async fn test_read_upload_body_limits() {
        let req = Request::new(Body::from("12345"));
        assert_eq!(read_upload_body(req, 5).await.unwrap(), Bytes::from("12345"));

        let req = Request::new(Body::from("123456"));
        assert!(matches!(
            read_upload_body(req, 5).await,
            Err(ApiError::PayloadTooLarge(_))
        ));

        let req = Request::new(Body::empty());
        assert!(matches!(
            read_upload_body(req, 5).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_read_upload_body_rejects_declared_length() {
        let req = axum::http::Request::builder()
            .header(CONTENT_LENGTH, "1000")
            .body(Body::from("small"))
            .unwrap();
        assert!(matches!(
            read_upload_body(req, 10).await,
            Err(ApiError::PayloadTooLarge(_))
        ));
    }
}
