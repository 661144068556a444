use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Prediction payload as posted by the browser client.
///
/// Numeric fields stay untyped so the model layer can report which field
/// failed to coerce instead of a generic JSON error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictPayload {
    pub area: String,
    pub item: String,
    #[serde(default)]
    pub year: serde_json::Value,
    #[serde(default)]
    pub rainfall: serde_json::Value,
    #[serde(default)]
    pub pesticides: serde_json::Value,
    #[serde(default)]
    pub temp: serde_json::Value,
}

impl PredictPayload {
    pub fn typed(
        area: impl Into<String>,
        item: impl Into<String>,
        year: i64,
        rainfall: f64,
        pesticides: f64,
        temp: f64,
    ) -> Self {
        Self {
            area: area.into(),
            item: item.into(),
            year: year.into(),
            rainfall: rainfall.into(),
            pesticides: pesticides.into(),
            temp: temp.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictResponse {
    pub prediction: f64,
}

/// Selection lists for the client dropdowns (`GET /config`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct OptionsResponse {
    pub areas: Vec<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CredentialsPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub message: String,
    pub status: AuthStatus,
}

impl AuthResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: AuthStatus::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: AuthStatus::Error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Body returned for every failed `/predict` or malformed request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: ErrorEnvelope,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn predict_payload_keeps_untyped_numeric_fields() {
        let raw = r#"{"area":"India","item":"Rice","year":"2020","rainfall":1200.0,"temp":22.5}"#;
        let payload: PredictPayload = serde_json::from_str(raw).unwrap();

        assert_eq!(payload.year, serde_json::json!("2020"));
        assert_eq!(payload.pesticides, serde_json::Value::Null);
        assert_eq!(payload.temp, serde_json::json!(22.5));
    }

    #[test]
    fn auth_status_uses_lowercase_wire_names() {
        let json = serialize_json(&AuthResponse::success("Signup successful")).unwrap();
        assert_eq!(
            json,
            r#"{"message":"Signup successful","status":"success"}"#
        );
    }

    #[test]
    fn error_envelope_omits_empty_optionals() {
        let json = serialize_json(&ErrorResponse {
            error: ErrorEnvelope {
                code: "model_unavailable".to_string(),
                message: "model not loaded".to_string(),
                details: None,
                hint: None,
            },
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"error":{"code":"model_unavailable","message":"model not loaded"}}"#
        );
    }
}
