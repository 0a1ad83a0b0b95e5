use crate::node::NodeKind;

/// Error types for catalog construction and fragment translation
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// No rule in the catalog accepts the node. Recoverable: the caller picks a fallback.
    #[error("No rule matches {kind} node")]
    NoMatch { kind: NodeKind },
    /// A rule with this name is already registered
    #[error("Duplicate rule name: {0}")]
    DuplicateRuleName(String),
    /// A template references a placeholder the node does not capture
    #[error("Rule '{rule}' references missing capture '${placeholder}'")]
    MissingCapture { rule: String, placeholder: String },
    /// The template text of a rule could not be parsed
    #[error("Template error: {0}")]
    Template(String),
    /// A `Matches` condition carries an invalid regular expression
    #[error("Rule '{rule}' has invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        message: String,
    },
    #[error("Invalid rule file {0}")]
    InvalidRuleFile(String),
    /// The fragment is not a construct the parser recognizes
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse JSON from '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TranslateError {
    /// Whether a fallback policy may stand in for this error.
    ///
    /// Only unsupported input is recoverable. Catalog defects are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TranslateError::NoMatch { .. } | TranslateError::Parse(_))
    }
}

/// Result type for catalog and translation operations
pub type TranslateResult<T> = Result<T, TranslateError>;
