//! Selection bridge: shows rendered candidate lines in fzf inside a tmux
//! popup and parses what the user picked.

pub mod bridge;
pub mod error;
pub mod geometry;
pub mod protocol;

pub use bridge::{Picker, PickerConfig, PickerOutcome};
pub use error::{PickerError, Result};
pub use geometry::{PaneSize, PopupGeometry};
pub use protocol::{fzf_base_args, strip_ansi, Action, PickerReply, SelectionLine};
