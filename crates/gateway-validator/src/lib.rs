//! Declarative request validation and sanitization.
//!
//! A [`RequestValidator`] checks four request locations (headers, query,
//! body, params) against per-location [`FieldRule`] lists. Values are
//! represented uniformly as [`serde_json::Value`] so the same engine handles
//! string-valued locations (headers/query/params) and a parsed JSON body.

mod engine;
mod error;
mod location;
mod rule;
mod sanitize;

pub use engine::{
    RequestValidator, RequestValues, SanitizedFields, ValidatorConfig, ValidatorConfigBuilder,
};
pub use error::{FieldError, ValidationError};
pub use location::Location;
pub use rule::{FieldRule, FieldType};
pub use sanitize::sanitize_string;
