use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use service::directory::{Command, RequestFields, Verb};
use service::DirectoryService;

use crate::errors::{ApiError, ApiReply};
use crate::observability::record_request;

#[derive(Clone)]
pub struct ServerState {
    pub directory: Arc<DirectoryService>,
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn pairs_to_map(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        // first occurrence wins
        map.entry(k).or_insert(Value::String(v));
    }
    map
}

/// Collect request fields: JSON body, then form body, then query string.
/// Unparseable sources contribute nothing.
pub fn collect_fields(headers: &HeaderMap, query: Option<&str>, body: &[u8]) -> RequestFields {
    let mut fields = RequestFields::new();

    if !body.is_empty() {
        if is_form(headers) {
            match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
                Ok(pairs) => fields = fields.with_layer(pairs_to_map(pairs)),
                Err(e) => debug!(error = %e, "ignoring malformed form body"),
            }
        } else {
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(map)) => fields = fields.with_layer(map),
                Ok(_) => debug!("ignoring non-object JSON body"),
                Err(e) => debug!(error = %e, "ignoring malformed JSON body"),
            }
        }
    }

    if let Some(q) = query.filter(|q| !q.is_empty()) {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(q) {
            Ok(pairs) => fields = fields.with_layer(pairs_to_map(pairs)),
            Err(e) => debug!(error = %e, "ignoring malformed query string"),
        }
    }

    fields
}

/// The single action-dispatched directory endpoint.
pub async fn dispatch(
    State(state): State<ServerState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let fields = collect_fields(&headers, query.as_deref(), &body);

    let cmd = match Command::from_request(Verb::parse(method.as_str()), &fields) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!(%method, action = ?fields.text("action"), "unsupported directory request");
            record_request("unsupported", e.kind());
            return ApiError(e).into_response();
        }
    };

    let action = cmd.action().as_str();
    match state.directory.execute(cmd).await {
        Ok(reply) => {
            record_request(action, "ok");
            ApiReply(reply).into_response()
        }
        Err(e) => {
            record_request(action, e.kind());
            ApiError(e).into_response()
        }
    }
}
