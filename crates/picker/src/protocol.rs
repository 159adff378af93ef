//! Wire format between fzf-links and fzf.
//!
//! fzf prints the name of the bound action first, then every chosen line as
//! it was rendered: `<index> - [<tag>] - <display text>`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PickerError, Result};

/// Key binding the user accepted the selection with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Open,
    SystemOpen,
    Reveal,
    CopyToClipboard,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Open,
        Action::SystemOpen,
        Action::Reveal,
        Action::CopyToClipboard,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Open => "OPEN",
            Action::SystemOpen => "SYSTEM_OPEN",
            Action::Reveal => "REVEAL",
            Action::CopyToClipboard => "COPY_TO_CLIPBOARD",
        }
    }

    /// fzf key bound to the action.
    pub const fn key(self) -> &'static str {
        match self {
            Action::Open => "enter",
            Action::SystemOpen => "ctrl-d",
            Action::Reveal => "ctrl-r",
            Action::CopyToClipboard => "ctrl-c",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PickerError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| PickerError::WrongAction(s.to_string()))
    }
}

/// What fzf printed after a successful selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerReply {
    pub action: Action,
    /// Chosen lines, verbatim.
    pub selection: Vec<String>,
}

impl PickerReply {
    pub fn parse(stdout: &str) -> Result<Self> {
        let mut lines = stdout.trim().lines();
        let action = lines.next().unwrap_or_default().trim().parse()?;
        Ok(Self {
            action,
            selection: lines.map(str::to_string).collect(),
        })
    }
}

/// A chosen line split back into its rendered parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionLine {
    /// 1-based position in the candidate index.
    pub index: usize,
    pub tag: String,
    pub display_text: String,
}

impl SelectionLine {
    /// `None` when the line does not follow the rendering grammar.
    /// Color sequences are removed first.
    pub fn parse(line: &str) -> Option<Self> {
        let plain = strip_ansi(line);
        let caps = selection_re().captures(&plain)?;
        Some(Self {
            index: caps[1].parse().ok()?,
            tag: caps[2].to_string(),
            display_text: caps[3].to_string(),
        })
    }
}

fn selection_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*-\s*\[(.+?)\]\s*-\s*(.+)$").expect("selection grammar is valid")
    })
}

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("SGR pattern is valid"))
}

pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ansi_re().replace_all(text, "")
}

/// Name of the platform file manager shown in the header.
pub const fn file_manager_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "Finder"
    } else {
        "explorer"
    }
}

/// Arguments every fzf invocation gets, ahead of the user's own.
pub fn fzf_base_args(ansi: bool, show_header: bool) -> Vec<String> {
    let mut args = vec!["--no-sort".to_string()];
    for action in [
        Action::CopyToClipboard,
        Action::Reveal,
        Action::SystemOpen,
        Action::Open,
    ] {
        args.push("--bind".to_string());
        args.push(format!("{}:print({})+accept", action.key(), action.as_str()));
    }
    if ansi {
        args.push("--ansi".to_string());
    }
    if show_header {
        args.push("--header".to_string());
        args.push(format!(
            "↵ to open with configured opener, ^-d to open with system's default opener, \
             ^+r to reveal in {}, ^+c to copy to tmux buffer",
            file_manager_name()
        ));
    }
    args
}
