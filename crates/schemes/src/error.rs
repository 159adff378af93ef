use thiserror::Error;

/// Result type for scheme operations
pub type Result<T> = std::result::Result<T, SchemeError>;

/// Errors raised while assembling schemes. All of them are fatal to a run:
/// they happen before any text is scanned.
#[derive(Error, Debug)]
pub enum SchemeError {
    /// IO error while reading a scheme definition file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The user scheme file is not valid TOML or has the wrong shape
    #[error("failed to load user schemes: {0}")]
    LoadError(#[from] toml::de::Error),

    /// A pattern failed to compile
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    /// A scheme definition breaks a structural rule
    #[error("invalid scheme {tags:?}: {reason}")]
    InvalidScheme { tags: Vec<String>, reason: String },

    /// A template references something that cannot exist
    #[error("invalid template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A scheme with a custom opener cannot produce a command by itself
    #[error("scheme with tags {0:?} configured as custom opener but missing post handler")]
    MissingPostHandler(Vec<String>),
}

impl SchemeError {
    pub fn invalid_scheme(tags: &[String], reason: impl Into<String>) -> Self {
        Self::InvalidScheme {
            tags: tags.to_vec(),
            reason: reason.into(),
        }
    }

    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
