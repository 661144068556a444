use crate::http_api::{
    content_type_for, cors, error_response, json_response, prediction_error_response,
    resolve_static_path,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use cropcast_credentials::{CredentialError, CredentialStore, LoginOutcome, SignupOutcome};
use cropcast_model::{ModelContext, RawPredictionRequest};
use cropcast_protocol::{
    AuthResponse, CredentialsPayload, OptionsResponse, PredictPayload, PredictResponse,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelContext>,
    pub credentials: Arc<dyn CredentialStore>,
    pub static_dir: Option<PathBuf>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/config", get(config))
        .route("/predict", post(predict))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/health", get(health))
        .fallback(static_file)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Bodies must be JSON objects; serde would otherwise accept positional arrays.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    let invalid = |reason: String| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            format!("Invalid request body: {reason}"),
        )
    };
    let fields: Map<String, Value> =
        serde_json::from_slice(body).map_err(|err| invalid(err.to_string()))?;
    serde_json::from_value(Value::Object(fields)).map_err(|err| invalid(err.to_string()))
}

async fn config(State(state): State<AppState>) -> Response {
    let options = state.model.options();
    json_response(
        StatusCode::OK,
        &OptionsResponse {
            areas: options.regions,
            items: options.crops,
        },
    )
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: PredictPayload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let request = RawPredictionRequest {
        region: payload.area,
        crop: payload.item,
        year: payload.year,
        rainfall: payload.rainfall,
        pesticide_use: payload.pesticides,
        avg_temperature: payload.temp,
    };
    match state.model.predict_raw(request) {
        Ok(prediction) => json_response(StatusCode::OK, &PredictResponse { prediction }),
        Err(err) => {
            if err.is_unavailable() {
                log::error!("Prediction rejected: {err}");
            } else {
                log::warn!("Prediction failed: {err}");
            }
            prediction_error_response(&err)
        }
    }
}

async fn signup(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: CredentialsPayload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let store = Arc::clone(&state.credentials);
    let outcome =
        tokio::task::spawn_blocking(move || store.signup(&payload.email, &payload.password)).await;
    let response = match flatten(outcome) {
        Ok(SignupOutcome::Created) => AuthResponse::success("Signup successful"),
        Ok(SignupOutcome::AlreadyExists) => AuthResponse::error("User already exists"),
        Err(StoreFailure::Input(message)) => AuthResponse::error(message),
        Err(StoreFailure::Internal(message)) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_store_error",
                message,
            );
        }
    };
    json_response(StatusCode::OK, &response)
}

async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: CredentialsPayload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let store = Arc::clone(&state.credentials);
    let outcome =
        tokio::task::spawn_blocking(move || store.login(&payload.email, &payload.password)).await;
    let response = match flatten(outcome) {
        Ok(LoginOutcome::Authenticated) => AuthResponse::success("Login successful"),
        Ok(LoginOutcome::InvalidCredentials) => AuthResponse::error("Invalid credentials"),
        Err(StoreFailure::Input(message)) => AuthResponse::error(message),
        Err(StoreFailure::Internal(message)) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_store_error",
                message,
            );
        }
    };
    json_response(StatusCode::OK, &response)
}

enum StoreFailure {
    Input(String),
    Internal(String),
}

fn flatten<T>(
    outcome: Result<cropcast_credentials::Result<T>, tokio::task::JoinError>,
) -> Result<T, StoreFailure> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(CredentialError::InvalidInput(reason))) => {
            Err(StoreFailure::Input(format!("Invalid input: {reason}")))
        }
        Ok(Err(err)) => {
            log::error!("{err}");
            Err(StoreFailure::Internal("Credential store unavailable".to_string()))
        }
        Err(err) => {
            log::error!("Credential task failed: {err}");
            Err(StoreFailure::Internal("Credential store unavailable".to_string()))
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    let report = state.model.status();
    let status = if report.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    json_response(status, &report)
}

async fn static_file(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let not_found = || {
        error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No route for {method} {}", uri.path()),
        )
    };
    let Some(root) = state.static_dir.as_deref() else {
        return not_found();
    };
    if method != Method::GET && method != Method::HEAD {
        return not_found();
    }
    let Some(mut path) = resolve_static_path(root, uri.path()) else {
        return not_found();
    };
    if path.is_dir() {
        path.push("index.html");
    }
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(CONTENT_TYPE, content_type_for(&path))],
            bytes,
        )
            .into_response(),
        Err(_) => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arrays_are_rejected() {
        let predict =
            parse_body::<PredictPayload>(&Bytes::from_static(br#"["India","Rice",2020]"#));
        assert_eq!(predict.unwrap_err().status(), StatusCode::BAD_REQUEST);

        let creds = parse_body::<CredentialsPayload>(&Bytes::from_static(br#"["a@x","pw"]"#));
        assert_eq!(creds.unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn objects_parse_into_payloads() {
        let creds = parse_body::<CredentialsPayload>(&Bytes::from_static(
            br#"{"email":"a@x","password":"pw"}"#,
        ));
        assert!(matches!(creds, Ok(ref c) if c.email == "a@x" && c.password == "pw"));
    }
}
