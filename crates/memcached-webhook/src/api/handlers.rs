use admission_review::{AdmissionRequest, AdmissionResponse, AdmissionReview, Decoded, encode};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{Span, debug, error, warn};

use crate::api::{api_error::ApiError, state::ApiServerState};
use crate::decision::AdmissionPhase;

#[tracing::instrument(
    name = "admission",
    fields(
        phase = %phase,
        host = crate::config::HOSTNAME.as_str(),
        request_uid = tracing::field::Empty,
        name = tracing::field::Empty,
        namespace = tracing::field::Empty,
        operation = tracing::field::Empty,
        kind_group = tracing::field::Empty,
        kind_version = tracing::field::Empty,
        kind = tracing::field::Empty,
        resource_group = tracing::field::Empty,
        resource_version = tracing::field::Empty,
        resource = tracing::field::Empty,
        allowed = tracing::field::Empty,
        response_message = tracing::field::Empty,
    ),
    skip_all)]
/// Answer an AdmissionReview sent by the API server for the given phase.
pub(crate) async fn admission_handler(
    phase: AdmissionPhase,
    State(state): State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if !is_json_content_type(&headers) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        warn!(content_type, "expected application/json content type");
        return Ok(StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response());
    }

    debug!(body = %String::from_utf8_lossy(&body), "handling request");

    let (decoded, gvk) = state.scheme.decode(&body).map_err(|e| {
        let message = format!("Request could not be decoded: {e}");
        error!("{}", message);
        ApiError::bad_request(message)
    })?;

    let Decoded::AdmissionReview(review) = decoded else {
        let message = format!("Expected AdmissionReview but got: {gvk}");
        error!("{}", message);
        return Err(ApiError::bad_request(message));
    };
    let Some(request) = review.request.as_ref() else {
        let message = String::from("No Request object defined inside AdmissionReview object");
        error!("{}", message);
        return Err(ApiError::bad_request(message));
    };

    populate_span_with_admission_request_data(request);

    let response = phase
        .decide(&review, &state.scheme)
        .with_uid(request.uid.clone());

    populate_span_with_admission_response(&response);

    let review_response = AdmissionReview::response_for(&gvk, response);
    debug!(response = ?review_response, "sending response");

    let body = encode(&review_response).map_err(|e| {
        error!(error = %e, "cannot serialize AdmissionReview response");
        ApiError::internal_server_error(e.to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.essence_str() == mime::APPLICATION_JSON.essence_str())
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("kind_group", adm_req.kind.group.as_str());
    Span::current().record("kind_version", adm_req.kind.version.as_str());
    Span::current().record("name", adm_req.name.as_deref().unwrap_or_default());
    Span::current().record(
        "namespace",
        adm_req.namespace.as_deref().unwrap_or_default(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("resource", adm_req.resource.resource.as_str());
    Span::current().record("resource_group", adm_req.resource.group.as_str());
    Span::current().record("resource_version", adm_req.resource.version.as_str());
}

fn populate_span_with_admission_response(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    if let Some(message) = response.message() {
        Span::current().record("response_message", message);
    }
}
