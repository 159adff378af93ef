use thiserror::Error;

/// Result type for picker operations
pub type Result<T> = std::result::Result<T, PickerError>;

/// Errors that end a picker round-trip. Cancellation is not one of them.
#[derive(Error, Debug)]
pub enum PickerError {
    /// A popup option in the fzf display options has a missing or bad value
    #[error("failed parsing user option: {0}")]
    InvalidOption(String),

    /// The popup shell could not find the fzf executable
    #[error("fzf command not found: {0}. Make sure fzf command is installed and reachable in the $PATH")]
    FzfNotFound(String),

    /// fzf (or the popup around it) exited with an unexpected status
    #[error("fzf failed with exit code {code}: {stderr}")]
    FzfFailed { code: i32, stderr: String },

    /// The popup was killed before fzf could report
    #[error("fzf popup terminated by a signal")]
    Terminated,

    /// The first reply line is not a known action
    #[error("Action selected with fzf is not supported: {0}")]
    WrongAction(String),

    /// `tmux popup` could not be started
    #[error("failed to start tmux popup: {0}")]
    Popup(#[source] std::io::Error),

    /// A reply stream never reached end-of-file after the popup exited
    #[error("fzf output stream did not close")]
    Stalled,

    /// IO error on the private FIFOs or choices file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
