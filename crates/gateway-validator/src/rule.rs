use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

/// The expected shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Email,
    Url,
    Json,
    Custom,
}

/// A declarative rule for one field within a request location.
///
/// Values are represented as [`serde_json::Value`] regardless of source
/// location: headers/query/params arrive as strings and are coerced where the
/// rule's [`FieldType`] calls for it; a JSON body arrives already parsed. This
/// uniform representation is what lets one engine validate all four
/// locations.
#[derive(Clone)]
pub struct FieldRule {
    pub field: String,
    pub kind: FieldType,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<Regex>,
    pub custom: Option<Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>>,
    pub sanitize: bool,
    pub allowed_values: Option<Vec<Value>>,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field", &self.field)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("pattern", &self.pattern)
            .field("custom", &self.custom.as_ref().map(|_| "Fn(..)"))
            .field("sanitize", &self.sanitize)
            .field("allowed_values", &self.allowed_values)
            .finish()
    }
}

impl FieldRule {
    /// Creates a required rule of `kind` with every other constraint unset.
    pub fn new(field: impl Into<String>, kind: FieldType) -> Self {
        Self {
            field: field.into(),
            kind,
            required: true,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            pattern: None,
            custom: None,
            sanitize: false,
            allowed_values: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(f));
        self
    }

    pub fn sanitize(mut self) -> Self {
        self.sanitize = true;
        self
    }

    pub fn allowed_values(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }
}
