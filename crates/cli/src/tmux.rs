use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use fzf_links_picker::PaneSize;
use tokio::process::Command;

/// Size and scroll state of the active pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaneInfo {
    pub size: PaneSize,
    /// Lines scrolled back in copy mode, 0 otherwise.
    pub scroll_position: i64,
}

impl PaneInfo {
    /// Parse `#{pane_height},#{pane_width},#{scroll_position},`.
    pub fn parse(output: &str) -> Result<Self> {
        let mut fields = output.trim().split(',').map(str::trim);
        let mut number = |name: &str| -> Result<i64> {
            let field = fields.next().unwrap_or_default();
            if field.is_empty() && name == "scroll position" {
                return Ok(0);
            }
            field
                .parse()
                .with_context(|| format!("invalid pane {name}: '{field}'"))
        };
        let height = number("height")?;
        let width = number("width")?;
        let scroll_position = number("scroll position")?;
        Ok(Self {
            size: PaneSize { height, width },
            scroll_position,
        })
    }

    /// `capture-pane` start and end lines: the visible screen as currently
    /// scrolled, plus `history_lines` above it.
    pub fn capture_range(&self, history_lines: u32) -> (i64, i64) {
        let start = -(self.scroll_position + i64::from(history_lines));
        let end = self.size.height - self.scroll_position - 1;
        (start, end)
    }
}

async fn tmux(args: &[&str]) -> Result<String> {
    let output = Command::new("tmux")
        .args(args)
        .output()
        .await
        .context("failed to run tmux")?;
    if !output.status.success() {
        bail!(
            "tmux {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub async fn pane_info() -> Result<PaneInfo> {
    let output = tmux(&["display", "-p", "#{pane_height},#{pane_width},#{scroll_position},"]).await?;
    PaneInfo::parse(&output)
}

/// Joined pane content; wrapped lines come back as one line.
pub async fn capture_pane(info: &PaneInfo, history_lines: u32) -> Result<String> {
    let (start, end) = info.capture_range(history_lines);
    let (start, end) = (start.to_string(), end.to_string());
    tmux(&["capture-pane", "-J", "-p", "-S", &start, "-E", &end]).await
}

pub async fn current_path() -> Result<PathBuf> {
    let output = tmux(&["display", "-p", "#{pane_current_path}"]).await?;
    let path = output.trim();
    if path.is_empty() {
        bail!("tmux reported no current path for the pane");
    }
    Ok(PathBuf::from(path))
}
