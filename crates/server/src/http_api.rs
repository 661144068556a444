use axum::{
    extract::Request,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use cropcast_model::{EncodeError, PredictError};
use cropcast_protocol::{serialize_json, ErrorEnvelope, ErrorResponse};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serialize_json(body) {
        Ok(json) => (status, [(CONTENT_TYPE, "application/json")], json).into_response(),
        Err(err) => {
            log::error!("Failed to serialize response: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    error_response_with_details(status, code, message, None)
}

fn error_response_with_details(
    status: StatusCode,
    code: &str,
    message: String,
    details: Option<Value>,
) -> Response {
    let hint = match code {
        "invalid_request" => {
            Some("Send a JSON object matching the endpoint's payload.".to_string())
        }
        "unknown_category" => Some("GET /config lists the accepted areas and items.".to_string()),
        "invalid_numeric_field" => {
            Some("year, rainfall, pesticides and temp must be finite numbers.".to_string())
        }
        "model_unavailable" => {
            Some("The service started without valid artifacts; see GET /health.".to_string())
        }
        _ => None,
    };
    json_response(
        status,
        &ErrorResponse {
            error: ErrorEnvelope {
                code: code.to_string(),
                message,
                details,
                hint,
            },
        },
    )
}

pub(crate) fn prediction_error_response(err: &PredictError) -> Response {
    let status = if err.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_REQUEST
    };
    let details = match err {
        PredictError::Encoding(EncodeError::UnknownCategory { field, value }) => {
            Some(json!({ "field": field, "value": value }))
        }
        PredictError::Encoding(EncodeError::InvalidNumericField { field }) => {
            Some(json!({ "field": field }))
        }
        _ => None,
    };
    error_response_with_details(status, err.code(), err.to_string(), details)
}

/// Permissive CORS for the browser client; preflights never reach a handler.
pub(crate) async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}

/// Map a URL path onto a file below `root`. `None` for anything that could escape it.
pub(crate) fn resolve_static_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in url_path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains('\\') {
            return None;
        }
        let mut parts = Path::new(segment).components();
        match (parts.next(), parts.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        relative.push("index.html");
    }
    Some(root.join(relative))
}

pub(crate) fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_paths_stay_inside_root() {
        let root = Path::new("/srv/site");
        assert_eq!(
            resolve_static_path(root, "/"),
            Some(root.join("index.html"))
        );
        assert_eq!(
            resolve_static_path(root, "/assets//app.js"),
            Some(root.join("assets").join("app.js"))
        );
        assert_eq!(resolve_static_path(root, "/../etc/passwd"), None);
        assert_eq!(resolve_static_path(root, "/assets/..\\secret"), None);
    }

    #[test]
    fn unavailable_maps_to_503_and_encoding_to_400() {
        let unavailable = prediction_error_response(&PredictError::ModelUnavailable);
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let unknown = prediction_error_response(&PredictError::Encoding(
            EncodeError::UnknownCategory {
                field: "region",
                value: "Atlantis".to_string(),
            },
        ));
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            unknown.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn content_types_follow_extensions() {
        assert_eq!(
            content_type_for(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("blob")),
            "application/octet-stream"
        );
    }
}
