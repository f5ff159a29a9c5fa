//! Proxy route handlers.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method as HttpMethod, StatusCode, Uri},
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use futures::future::try_join_all;
use tracing::debug;
use url::Url;

use keel_core::types::{Method, Request, RequestMode, Response};
use keel_core::KeelError;
use keel_worker::FetchOutcome;

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Response headers that only describe the upstream connection.
const HOP_BY_HOP: &[&str] = &["connection", "content-length", "keep-alive", "transfer-encoding"];

/// GET /__keel/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let registration = &state.registration;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        origin: state.config.origin.to_string(),
        cache_name: state.config.cache_name.clone(),
        active: registration.active().as_deref().map(WorkerDto::from),
        waiting: registration.waiting().as_deref().map(WorkerDto::from),
    })
}

/// POST /__keel/message
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<MessageResponse>> {
    let message = state.registration.post_message(&payload).await?;
    debug!(accepted = message.is_some(), "Delivered client message");

    Ok(Json(MessageResponse {
        accepted: message.is_some(),
        active: state.registration.active().as_deref().map(WorkerDto::from),
    }))
}

/// GET /__keel/caches
pub async fn list_caches(State(state): State<Arc<AppState>>) -> Result<Json<CachesResponse>> {
    let names = state.storage.keys().await?;

    let caches = try_join_all(names.into_iter().map(|name| {
        let storage = state.storage.clone();
        async move {
            let entries = storage.open(&name).await?.keys().await?.len();
            Ok::<_, KeelError>(CacheSummary { name, entries })
        }
    }))
    .await?;

    Ok(Json(CachesResponse { caches }))
}

/// Every other path: answered by the active worker, or forwarded upstream.
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<HttpResponse> {
    let request = to_worker_request(&state.config.origin, &method, &uri, &headers, body)?;

    let response = match state.registration.handle_fetch(request.clone()).await? {
        FetchOutcome::Respond(response) => response,
        FetchOutcome::Passthrough => {
            debug!(method = %request.method, url = %request.url, "Forwarding upstream");
            state.fetcher.fetch(&request).await?
        }
    };

    Ok(to_http_response(response))
}

/// Rebases an incoming request onto the upstream origin.
fn to_worker_request(
    origin: &Url,
    method: &HttpMethod,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Request> {
    let url = rebase(origin, uri)?;
    let method: Method = method.as_str().parse()?;

    let mut request = Request::from_url(method, url).with_body(body);
    for (name, value) in headers {
        if name == header::HOST {
            continue;
        }
        if let Ok(value) = value.to_str() {
            request.headers.append(name.as_str(), value);
        }
    }

    let navigate = headers
        .get("sec-fetch-mode")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|mode| mode.eq_ignore_ascii_case("navigate"));
    if navigate {
        request = request.with_mode(RequestMode::Navigate);
    }

    Ok(request)
}

/// Appends the request path to the origin path; the result must stay under the origin.
fn rebase(origin: &Url, uri: &Uri) -> Result<Url> {
    let mut url = origin.clone();
    url.set_path(&format!("{}{}", origin.path(), uri.path().trim_start_matches('/')));
    url.set_query(uri.query());

    let same_origin = url.scheme() == origin.scheme()
        && url.host_str() == origin.host_str()
        && url.port_or_known_default() == origin.port_or_known_default();
    if !same_origin || !url.path().starts_with(origin.path()) {
        return Err(ApiError::bad_request(format!(
            "Path '{}' escapes the upstream origin",
            uri.path()
        )));
    }
    Ok(url)
}

fn to_http_response(response: Response) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in response.headers.iter() {
        if HOP_BY_HOP.contains(&name) {
            continue;
        }
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = name, "Dropping invalid response header"),
        }
    }

    (status, headers, Body::from(response.body)).into_response()
}
