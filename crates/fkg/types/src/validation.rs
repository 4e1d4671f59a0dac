use serde_json::Value;
use std::fmt;

/// What a record is being validated as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaKind {
    /// An entity of the given type (`organization`, `service`, ...)
    Entity(String),
    Edge,
    Source,
    Manifest,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Entity(t) => write!(f, "entity.{}", t),
            SchemaKind::Edge => f.write_str("edge"),
            SchemaKind::Source => f.write_str("source"),
            SchemaKind::Manifest => f.write_str("manifest"),
        }
    }
}

/// Structural validation failure with one `path: message` string per
/// violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub errors: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            message: message.into(),
            errors,
        }
    }

    /// Message followed by every violation, for user-facing summaries.
    pub fn detailed(&self) -> String {
        if self.errors.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.message, self.errors.join("; "))
        }
    }
}

/// Structural validator consulted before records are written.
///
/// Implementations are expected to be cheap to call repeatedly; compile
/// schemas up front.
pub trait RecordValidator: Send + Sync {
    fn validate(
        &self,
        record: &Value,
        kind: &SchemaKind,
        schema_version: &str,
    ) -> Result<(), ValidationError>;
}

/// Accepts everything. Used when validation is explicitly disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl RecordValidator for NoopValidator {
    fn validate(&self, _: &Value, _: &SchemaKind, _: &str) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_kind_display() {
        assert_eq!(
            SchemaKind::Entity("organization".into()).to_string(),
            "entity.organization"
        );
        assert_eq!(SchemaKind::Manifest.to_string(), "manifest");
    }

    #[test]
    fn detailed_lists_every_violation() {
        let err = ValidationError::with_errors(
            "Entity validation failed with 2 error(s)",
            vec!["name: required".into(), "(root): bad".into()],
        );
        assert_eq!(
            err.detailed(),
            "Entity validation failed with 2 error(s): name: required; (root): bad"
        );
        assert_eq!(ValidationError::new("x").detailed(), "x");
    }
}
