use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while scanning, parsing, evaluating or resolving templates.
///
/// Every error is terminal for the call that produced it; nothing is
/// retried or defaulted internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("key `{0}` does not exist")]
    UnknownKey(String),

    #[error("`${0}` does not end with `$`, do you mean `${0}$`?")]
    UnterminatedPlaceholder(String),

    #[error("`{expression}` is not a valid expression: {reason} (at offset {offset})")]
    InvalidExpression {
        expression: String,
        offset: usize,
        reason: String,
    },

    #[error("operator `{op}` cannot be applied to {got}")]
    TypeMismatch { op: &'static str, got: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("integer overflow in `{0}`")]
    IntegerOverflow(&'static str),

    #[error("`{0}` is $? (unresolved) and must be patched before the record is read")]
    UnresolvedEntryRemaining(String),

    #[error("`{0}` is not an unresolved ($?) entry and cannot be patched")]
    PatchTargetInvalid(String),

    #[error("in template `{key}`: {source}")]
    Template {
        key: String,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    pub fn invalid_expression(expression: &str, offset: usize, reason: impl Into<String>) -> Self {
        ResolveError::InvalidExpression {
            expression: expression.to_string(),
            offset,
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(op: &'static str, got: impl Into<String>) -> Self {
        ResolveError::TypeMismatch {
            op,
            got: got.into(),
        }
    }

    /// Stable kebab-case identifier for the innermost error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UnknownKey(_) => "unknown-key",
            ResolveError::UnterminatedPlaceholder(_) => "unterminated-placeholder",
            ResolveError::InvalidExpression { .. } => "invalid-expression",
            ResolveError::TypeMismatch { .. } => "type-mismatch",
            ResolveError::DivisionByZero => "division-by-zero",
            ResolveError::IndexOutOfRange { .. } => "index-out-of-range",
            ResolveError::IntegerOverflow(_) => "integer-overflow",
            ResolveError::UnresolvedEntryRemaining(_) => "unresolved-entry-remaining",
            ResolveError::PatchTargetInvalid(_) => "patch-target-invalid",
            ResolveError::Template { source, .. } => source.code(),
        }
    }

    /// The innermost error, with any `Template` context stripped.
    pub fn root(&self) -> &ResolveError {
        match self {
            ResolveError::Template { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors raised while loading reference or template records from JSON.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{}` is not a JSON object of named variants", path.display())]
    NotAnObject { path: PathBuf },

    #[error("variant `{variant}` does not exist in `{}`", path.display())]
    MissingVariant { path: PathBuf, variant: String },

    #[error("value for `{key}` is {kind}, which is not supported")]
    UnsupportedValue { key: String, kind: &'static str },

    #[error("expected a JSON object of key/value pairs, found {0}")]
    NotARecord(&'static str),

    #[error("`{0}` must have the form KEY=VALUE")]
    MalformedAssignment(String),
}

/// Either kind of failure, for callers that load and resolve in one go.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_looks_through_template_context() {
        let err = ResolveError::Template {
            key: "outer".to_string(),
            source: Box::new(ResolveError::Template {
                key: "inner".to_string(),
                source: Box::new(ResolveError::DivisionByZero),
            }),
        };
        assert_eq!(err.code(), "division-by-zero");
        assert_eq!(err.root(), &ResolveError::DivisionByZero);
        assert_eq!(ResolveError::UnknownKey("x".into()).code(), "unknown-key");
    }
}
