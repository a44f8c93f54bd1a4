use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationError};
use crate::location::Location;
use crate::rule::{FieldRule, FieldType};
use crate::sanitize::sanitize_string;

/// Per-location field rules plus the cross-cutting content-type gate.
pub struct ValidatorConfig {
    pub(crate) rules: HashMap<Location, Vec<FieldRule>>,
    pub(crate) strict: bool,
    pub(crate) allowed_content_types: Vec<String>,
    pub(crate) max_body_size: Option<usize>,
}

/// Builder for [`ValidatorConfig`].
pub struct ValidatorConfigBuilder {
    rules: HashMap<Location, Vec<FieldRule>>,
    strict: bool,
    allowed_content_types: Vec<String>,
    max_body_size: Option<usize>,
}

impl Default for ValidatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorConfigBuilder {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
            strict: false,
            allowed_content_types: vec![
                "application/json".to_string(),
                "application/x-www-form-urlencoded".to_string(),
                "text/".to_string(),
                "multipart/form-data".to_string(),
            ],
            max_body_size: None,
        }
    }

    pub fn rules(mut self, location: Location, rules: Vec<FieldRule>) -> Self {
        self.rules.insert(location, rules);
        self
    }

    /// In strict mode, any field present in a validated location but not
    /// listed in that location's rules is a validation error.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn allowed_content_types(mut self, types: Vec<String>) -> Self {
        self.allowed_content_types = types;
        self
    }

    /// Advisory only: the validator does not itself parse the body, so this
    /// is recorded for the host's body parser to read.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = Some(max_body_size);
        self
    }

    pub fn build(self) -> ValidatorConfig {
        ValidatorConfig {
            rules: self.rules,
            strict: self.strict,
            allowed_content_types: self.allowed_content_types,
            max_body_size: self.max_body_size,
        }
    }
}

/// The request data the validator inspects, supplied by the host.
pub struct RequestValues<'a> {
    pub method: &'a str,
    pub content_type: Option<&'a str>,
    pub headers: &'a Map<String, Value>,
    pub query: &'a Map<String, Value>,
    pub body: &'a Map<String, Value>,
    pub params: &'a Map<String, Value>,
}

/// Sanitized field values the host should write back onto the request before
/// forwarding, keyed by location then field name.
pub type SanitizedFields = HashMap<Location, Map<String, Value>>;

/// A declarative validator over four request locations.
pub struct RequestValidator {
    config: ValidatorConfig,
}

impl RequestValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn max_body_size(&self) -> Option<usize> {
        self.config.max_body_size
    }

    /// Validates `values` against the configured rules. Returns the
    /// sanitized field overrides on success, or every collected field error
    /// on failure.
    pub fn validate(&self, values: &RequestValues<'_>) -> Result<SanitizedFields, ValidationError> {
        let mut errors = Vec::new();
        let mut sanitized = SanitizedFields::new();

        if !matches!(values.method, "GET" | "HEAD") {
            if let Some(content_type) = values.content_type {
                let allowed = self
                    .config
                    .allowed_content_types
                    .iter()
                    .any(|prefix| content_type.starts_with(prefix.as_str()));
                if !allowed {
                    errors.push(FieldError {
                        field: "content-type".to_string(),
                        location: Location::Headers.to_string(),
                        message: format!("unsupported content type: {content_type}"),
                    });
                }
            }
        }

        for location in [
            Location::Headers,
            Location::Query,
            Location::Body,
            Location::Params,
        ] {
            let map = match location {
                Location::Headers => values.headers,
                Location::Query => values.query,
                Location::Body => values.body,
                Location::Params => values.params,
            };
            let rules = self.config.rules.get(&location).map(Vec::as_slice).unwrap_or(&[]);
            let location_sanitized =
                validate_location(rules, location, map, self.config.strict, &mut errors);
            if !location_sanitized.is_empty() {
                sanitized.insert(location, location_sanitized);
            }
        }

        if errors.is_empty() {
            Ok(sanitized)
        } else {
            Err(ValidationError { errors })
        }
    }
}

fn validate_location(
    rules: &[FieldRule],
    location: Location,
    values: &Map<String, Value>,
    strict: bool,
    errors: &mut Vec<FieldError>,
) -> Map<String, Value> {
    let mut sanitized = Map::new();

    for rule in rules {
        let Some(value) = values.get(&rule.field) else {
            if rule.required {
                errors.push(FieldError {
                    field: rule.field.clone(),
                    location: location.to_string(),
                    message: "field is required".to_string(),
                });
            }
            continue;
        };

        match validate_field(rule, value) {
            Ok(Some(new_value)) => {
                sanitized.insert(rule.field.clone(), new_value);
            }
            Ok(None) => {}
            Err(message) => errors.push(FieldError {
                field: rule.field.clone(),
                location: location.to_string(),
                message,
            }),
        }
    }

    if strict {
        let known: std::collections::HashSet<&str> =
            rules.iter().map(|r| r.field.as_str()).collect();
        for field in values.keys() {
            if !known.contains(field.as_str()) {
                errors.push(FieldError {
                    field: field.clone(),
                    location: location.to_string(),
                    message: "unexpected field".to_string(),
                });
            }
        }
    }

    sanitized
}

/// Validates and, where applicable, coerces/sanitizes one field's value.
/// Returns `Ok(Some(value))` when the original should be replaced (coercion
/// or sanitization), `Ok(None)` when it validated as-is.
fn validate_field(rule: &FieldRule, value: &Value) -> Result<Option<Value>, String> {
    let coerced = coerce(value, rule.kind)?;
    let effective = coerced.as_ref().unwrap_or(value);

    if let Some(min_length) = rule.min_length {
        if let Some(s) = effective.as_str() {
            if s.chars().count() < min_length {
                return Err(format!("must be at least {min_length} characters"));
            }
        }
    }
    if let Some(max_length) = rule.max_length {
        if let Some(s) = effective.as_str() {
            if s.chars().count() > max_length {
                return Err(format!("must be at most {max_length} characters"));
            }
        }
    }
    if let Some(min) = rule.min {
        if let Some(n) = effective.as_f64() {
            if n < min {
                return Err(format!("must be >= {min}"));
            }
        }
    }
    if let Some(max) = rule.max {
        if let Some(n) = effective.as_f64() {
            if n > max {
                return Err(format!("must be <= {max}"));
            }
        }
    }
    if let Some(pattern) = &rule.pattern {
        if let Some(s) = effective.as_str() {
            if !pattern.is_match(s) {
                return Err("does not match the required pattern".to_string());
            }
        }
    }
    if let Some(allowed) = &rule.allowed_values {
        if !allowed.contains(effective) {
            return Err("value is not one of the allowed values".to_string());
        }
    }
    if let Some(custom) = &rule.custom {
        custom(effective)?;
    }

    if rule.sanitize {
        return Ok(Some(sanitize_value(effective.clone())));
    }

    Ok(coerced)
}

fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(&s)),
        other => other,
    }
}

/// Coerces a string-typed value into the shape `kind` expects, returning
/// `None` when the value already matches and needs no replacement.
fn coerce(value: &Value, kind: FieldType) -> Result<Option<Value>, String> {
    match kind {
        FieldType::String | FieldType::Custom => Ok(None),
        FieldType::Number => match value {
            Value::Number(_) => Ok(None),
            Value::String(s) => s
                .parse::<f64>()
                .map(|n| {
                    Some(serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null))
                })
                .map_err(|_| "must be a number".to_string()),
            _ => Err("must be a number".to_string()),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(None),
            Value::String(s) if s == "true" => Ok(Some(Value::Bool(true))),
            Value::String(s) if s == "false" => Ok(Some(Value::Bool(false))),
            _ => Err("must be a boolean".to_string()),
        },
        FieldType::Email => {
            let s = value.as_str().ok_or_else(|| "must be a string".to_string())?;
            if s.contains('@') && s.split('@').count() == 2 && !s.starts_with('@') && !s.ends_with('@') {
                Ok(None)
            } else {
                Err("must be a valid email address".to_string())
            }
        }
        FieldType::Url => {
            let s = value.as_str().ok_or_else(|| "must be a string".to_string())?;
            if s.starts_with("http://") || s.starts_with("https://") {
                Ok(None)
            } else {
                Err("must be a valid url".to_string())
            }
        }
        FieldType::Json => match value {
            Value::String(s) => serde_json::from_str::<Value>(s)
                .map(Some)
                .map_err(|_| "must be valid json".to_string()),
            _ => Ok(None),
        },
    }
}
