use thiserror::Error;

/// One field-level validation failure.
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: String,
    pub location: String,
    pub message: String,
}

/// Validation failure for an entire request. Refused with HTTP 400 and
/// `{error: "Validation Error", code: "VALIDATION_ERROR", errors: [...]}`.
#[derive(Debug, Error)]
#[error("request validation failed with {} error(s)", errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// The `{error, code, errors}` body the gateway sends on a 400 refusal.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": "Validation Error",
            "code": "VALIDATION_ERROR",
            "errors": self.errors.iter().map(|e| serde_json::json!({
                "field": e.field,
                "location": e.location,
                "message": e.message,
            })).collect::<Vec<_>>(),
        })
    }
}
