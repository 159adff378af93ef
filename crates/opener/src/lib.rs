//! Opens what the user picked: resolves each selected line to a command
//! through its scheme and launches it detached from fzf-links.

pub mod command;
pub mod dispatch;
pub mod error;
pub mod platform;
pub mod spawn;

pub use command::{resolve, ResolvedCommand};
pub use dispatch::{clipboard_command, DispatchReport, Dispatcher};
pub use error::{OpenerError, Result};
pub use spawn::{DetachedLauncher, Launcher};
