use fzf_links_schemes::{OpenerKind, SchemeError};
use thiserror::Error;

/// Result type for opener operations
pub type Result<T> = std::result::Result<T, OpenerError>;

/// Failures while turning one picked line into a running command. None of
/// them stops the rest of the batch.
#[derive(Error, Debug)]
pub enum OpenerError {
    /// A picked line does not follow the rendering grammar
    #[error("malformed selection: {0}")]
    MalformedSelection(String),

    #[error("selection index {0} is out of range")]
    IndexOutOfRange(usize),

    #[error("no scheme is registered for tag [{0}]")]
    UnknownTag(String),

    #[error("no editor command is configured")]
    NoEditorConfigured,

    #[error("no browser command is configured")]
    NoBrowserConfigured,

    /// The platform utility for system-open or reveal is missing
    #[error("no suitable app was found to open the link: {0}")]
    NoSuitableApp(String),

    #[error("platform {0} not supported")]
    UnsupportedPlatform(&'static str),

    /// The post-handler result does not carry what the opener needs
    #[error("a {action} action cannot be opened with the {opener} opener")]
    IncompatibleAction {
        opener: OpenerKind,
        action: &'static str,
    },

    #[error("could not find \"{0}\" in the path")]
    CommandNotFound(String),

    #[error("failed to execute command \"{command}\": {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Bad command template or missing post-handler
    #[error(transparent)]
    Scheme(#[from] SchemeError),
}
