//! Validation error types

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single failed rule for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is missing or empty when it shouldn't be
    Missing { field: &'static str },

    /// Field exceeds maximum length in bytes
    TooLong { field: &'static str, max: usize },

    /// Field is shorter than the minimum length in bytes
    TooShort { field: &'static str, min: usize },

    /// Numeric field outside its permitted range
    OutOfRange { field: &'static str, reason: String },

    /// Collection contains the same value twice
    Duplicate { field: &'static str },

    /// Value is not a member of a fixed allow-list
    NotPermitted { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the field this error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::TooLong { field, .. }
            | Self::TooShort { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Duplicate { field }
            | Self::NotPermitted { field, .. } => field,
        }
    }

    /// Human-readable message without the field name.
    pub fn message(&self) -> String {
        match self {
            Self::Missing { .. } => "must be provided".to_string(),
            Self::TooLong { max, .. } => format!("must not be more than {} bytes long", max),
            Self::TooShort { min, .. } => format!("must be at least {} bytes long", min),
            Self::OutOfRange { reason, .. } => reason.clone(),
            Self::Duplicate { .. } => "must not contain duplicate values".to_string(),
            Self::NotPermitted { value, .. } => format!("invalid value '{}'", value),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field(), self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Every failed field, keeping the first failing rule per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, ValidationError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Error recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.values()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, err) in self.errors.values().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Serializes as `{"field": "message", ...}`.
impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, err) in &self.errors {
            map.serialize_entry(field, &err.message())?;
        }
        map.end()
    }
}

/// Accumulates rule failures across fields.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err` when `ok` is false, unless its field already failed.
    pub fn check(&mut self, ok: bool, err: impl FnOnce() -> ValidationError) {
        if !ok {
            self.add(err());
        }
    }

    pub fn add(&mut self, err: ValidationError) {
        self.errors.errors.entry(err.field()).or_insert(err);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// True when no value appears twice.
pub fn unique<T: Ord>(values: &[T]) -> bool {
    let mut seen = std::collections::BTreeSet::new();
    values.iter().all(|v| seen.insert(v))
}
