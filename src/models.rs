use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============ Response Envelope ============

/// Body returned for every call to `/method`.
///
/// The `code` mirrors the HTTP status of the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodResponse {
    /// Successful call carrying the handler result.
    Success {
        /// Handler payload.
        response: Value,
        /// Always 200.
        code: u16,
    },
    /// Failed call carrying a public error message.
    Failure {
        /// Human-readable error description.
        error: String,
        /// Non-200 status code.
        code: u16,
    },
}

impl MethodResponse {
    pub fn success(response: Value) -> Self {
        MethodResponse::Success {
            response,
            code: 200,
        }
    }

    pub fn failure(error: impl Into<String>, code: u16) -> Self {
        MethodResponse::Failure {
            error: error.into(),
            code,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            MethodResponse::Success { code, .. } | MethodResponse::Failure { code, .. } => *code,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| {
            br#"{"error":"Internal Server Error","code":500}"#.to_vec()
        })
    }
}

// ============ Method Results ============

/// Result of `online_score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnlineScoreResponse {
    pub score: f64,
}

/// Result of `clients_interests`: client id (as string) to interest list.
pub type ClientsInterestsResponse = BTreeMap<String, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(MethodResponse::success(json!({"score": 3.0}))).unwrap();
        assert_eq!(ok, json!({"response": {"score": 3.0}, "code": 200}));

        let err = serde_json::to_value(MethodResponse::failure("Forbidden", 403)).unwrap();
        assert_eq!(err, json!({"error": "Forbidden", "code": 403}));
    }

    #[test]
    fn test_envelope_parses_back() {
        let parsed: MethodResponse =
            serde_json::from_slice(br#"{"error":"Bad Request","code":400}"#).unwrap();
        assert_eq!(parsed.code(), 400);
        assert!(matches!(parsed, MethodResponse::Failure { .. }));
    }
}
