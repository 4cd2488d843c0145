use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::constants::ErrorKind;

/// A decoded call from the host: method name plus a JSON argument map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: Value) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    fn arg(&self, key: &str) -> Option<&Value> {
        match &self.args {
            Value::Object(map) => map.get(key).filter(|v| !v.is_null()),
            _ => None,
        }
    }

    /// Optional number argument; present but not a number is an error.
    pub fn optional_f32(&self, key: &str) -> Result<Option<f32>, String> {
        match self.arg(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(|v| Some(v.clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32))
                .ok_or_else(|| format!("argument '{}' must be a number, got {}", key, value)),
        }
    }

    pub fn required_f32(&self, key: &str) -> Result<f32, String> {
        self.optional_f32(key)?
            .ok_or_else(|| format!("missing argument '{}'", key))
    }

    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>, String> {
        match self.arg(key) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| format!("argument '{}' must be a bool, got {}", key, value)),
        }
    }

    pub fn required_bool(&self, key: &str) -> Result<bool, String> {
        self.optional_bool(key)?
            .ok_or_else(|| format!("missing argument '{}'", key))
    }
}

/// Error tuple returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PluginError {
    pub fn new(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            code: kind.code.to_string(),
            message: kind.message.to_string(),
            details: Some(details.into()),
        }
    }
}

/// Encoded result of a [`MethodCall`].
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Error(PluginError),
    NotImplemented,
}

impl MethodResponse {
    pub fn empty() -> Self {
        Self::Success(Value::Null)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Serialize as `{"result": ...}`, `{"error": {...}}` or `{"notImplemented": true}`.
    pub fn to_json(&self) -> Value {
        let mut envelope = Map::new();
        match self {
            Self::Success(value) => {
                envelope.insert("result".into(), value.clone());
            }
            Self::Error(error) => {
                envelope.insert(
                    "error".into(),
                    serde_json::to_value(error).unwrap_or(Value::Null),
                );
            }
            Self::NotImplemented => {
                envelope.insert("notImplemented".into(), Value::Bool(true));
            }
        }
        Value::Object(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::constants::error;
    use serde_json::json;

    #[test]
    fn huge_numbers_stay_finite() {
        let call = MethodCall::new("raiseVolume", json!({"step": 1e40, "volume": -1e300}));
        assert_eq!(call.optional_f32("step"), Ok(Some(f32::MAX)));
        assert_eq!(call.required_f32("volume"), Ok(f32::MIN));
    }

    #[test]
    fn reads_typed_arguments() {
        let call = MethodCall::new("setVolume", json!({"volume": 0.5, "isMuted": true}));
        assert_eq!(call.required_f32("volume"), Ok(0.5));
        assert_eq!(call.required_bool("isMuted"), Ok(true));
        assert_eq!(call.optional_f32("step"), Ok(None));
    }

    #[test]
    fn null_and_missing_arguments_are_absent() {
        let call = MethodCall::new("raiseVolume", json!({"step": null}));
        assert_eq!(call.optional_f32("step"), Ok(None));
        assert!(call.required_f32("volume").is_err());

        let no_args = MethodCall::new("raiseVolume", Value::Null);
        assert_eq!(no_args.optional_f32("step"), Ok(None));
    }

    #[test]
    fn mistyped_argument_is_an_error() {
        let call = MethodCall::new("setVolume", json!({"volume": "loud"}));
        assert!(call.required_f32("volume").unwrap_err().contains("must be a number"));
    }

    #[test]
    fn call_decodes_from_json() {
        let call: MethodCall = serde_json::from_str(r#"{"method": "getVolume"}"#).unwrap();
        assert_eq!(call.method, "getVolume");
        assert_eq!(call.args, Value::Null);
    }

    #[test]
    fn error_envelope_carries_code_and_message() {
        let response = MethodResponse::Error(PluginError::new(error::GET_VOLUME, "device not available"));
        assert_eq!(
            response.to_json(),
            json!({"error": {"code": "1000", "message": "Failed to get volume", "details": "device not available"}})
        );
        assert_eq!(MethodResponse::empty().to_json(), json!({"result": null}));
    }
}
