//! Error types for Kindle

use thiserror::Error;

/// The main error type for Kindle operations
#[derive(Debug, Error)]
pub enum KindleError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Effect not found: {0}")]
    EffectNotFound(String),

    #[error("Invalid value '{text}': {reason}")]
    ValueParse { text: String, reason: String },

    #[error("Unknown field kind: {0}")]
    UnknownFieldKind(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl KindleError {
    /// Shorthand for a grammar error on `text`
    pub fn value_parse(text: &str, reason: impl Into<String>) -> Self {
        KindleError::ValueParse {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Kindle operations
pub type Result<T> = std::result::Result<T, KindleError>;

impl From<toml::de::Error> for KindleError {
    fn from(err: toml::de::Error) -> Self {
        KindleError::TomlParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_parse_message_names_text() {
        let err = KindleError::value_parse("[1 2", "unterminated range");
        assert_eq!(err.to_string(), "Invalid value '[1 2': unterminated range");
    }

    #[test]
    fn toml_error_converts() {
        let bad: std::result::Result<toml::Value, _> = toml::from_str("x = [");
        let err: KindleError = bad.unwrap_err().into();
        assert!(matches!(err, KindleError::TomlParseError(_)));
    }
}
