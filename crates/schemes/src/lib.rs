//! Link detection for fzf-links.
//!
//! A [`SchemeRegistry`] holds the ordered list of schemes (user schemes first,
//! then the built-ins). [`scan`] runs every scheme over captured pane text and
//! keeps one [`Candidate`] per distinct matched substring, and
//! [`CandidateIndex`] orders the candidates for display and maps a 1-based
//! display index back to its match.

pub mod builtins;
pub mod candidates;
pub mod colors;
pub mod context;
pub mod error;
pub mod model;
pub mod registry;
pub mod scanner;
pub mod template;
pub mod user;

pub use builtins::builtin_schemes;
pub use candidates::CandidateIndex;
pub use colors::{Colors, LsColors, Rgb};
pub use context::{heuristic_find_file, RunContext};
pub use error::{Result, SchemeError};
pub use model::{
    DisplayCandidate, OpenAction, OpenerKind, Pattern, PreHandled, RawMatch, Scheme,
};
pub use registry::SchemeRegistry;
pub use scanner::{scan, Candidate};
pub use template::CommandTemplate;
pub use user::{GroupTemplate, UserSchemes};
