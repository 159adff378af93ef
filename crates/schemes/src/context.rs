use std::path::{Path, PathBuf};

use crate::colors::Colors;

/// Per-run state shared by handlers and openers.
///
/// Built once at start-up and passed down by reference.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    pub colors: Colors,
    pub editor_open_cmd: Option<String>,
    pub browser_open_cmd: Option<String>,
}

impl RunContext {
    /// Same context with colors switched off, used once the picker is done.
    pub fn without_colors(&self) -> Self {
        let mut ctx = self.clone();
        ctx.colors.set_enabled(false);
        ctx
    }

    /// Editor command template (`%file`, `%line`): the configured one, else `$EDITOR`.
    pub fn editor_template(&self) -> Option<String> {
        configured(self.editor_open_cmd.as_deref())
            .or_else(|| env_template("EDITOR", "%file"))
    }

    /// Browser command template (`%url`): the configured one, else `$BROWSER`.
    pub fn browser_template(&self) -> Option<String> {
        configured(self.browser_open_cmd.as_deref())
            .or_else(|| env_template("BROWSER", "%url"))
    }
}

fn configured(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn env_template(var: &str, placeholder: &str) -> Option<String> {
    let program = std::env::var(var).ok()?;
    let program = program.trim();
    if program.is_empty() {
        return None;
    }
    Some(format!("{program} '{placeholder}'"))
}

/// Resolve a path as typed in the terminal: expand `~`, then keep it only if
/// it exists (relative paths are taken against the current directory).
pub fn heuristic_find_file(raw: &str) -> Option<PathBuf> {
    let expanded = expand_tilde(raw)?;
    if !expanded.exists() {
        return None;
    }
    expanded.canonicalize().ok()
}

fn expand_tilde(raw: &str) -> Option<PathBuf> {
    if raw == "~" {
        return dirs::home_dir();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    Some(Path::new(raw).to_path_buf())
}
