use fzf_links_picker::{Action, PickerReply, SelectionLine};
use fzf_links_schemes::{CandidateIndex, OpenAction, OpenerKind, RunContext, SchemeRegistry};

use crate::command::{self, ResolvedCommand};
use crate::error::{OpenerError, Result};
use crate::spawn::Launcher;

/// Tally of one batch of picked lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub launched: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum LineOutcome {
    Launched,
    Copied(String),
    Skipped,
}

/// Maps picked lines back to their candidates and opens them.
pub struct Dispatcher<'a, L> {
    registry: &'a SchemeRegistry,
    index: &'a CandidateIndex,
    ctx: &'a RunContext,
    launcher: L,
}

impl<'a, L: Launcher> Dispatcher<'a, L> {
    pub fn new(
        registry: &'a SchemeRegistry,
        index: &'a CandidateIndex,
        ctx: &'a RunContext,
        launcher: L,
    ) -> Self {
        Self {
            registry,
            index,
            ctx,
            launcher,
        }
    }

    /// Handle every picked line. A failing line is logged and the batch
    /// moves on; copied lines are sent to the tmux buffer at the end.
    pub fn dispatch(&self, reply: &PickerReply) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut clipboard = Vec::new();

        for line in &reply.selection {
            match self.handle_line(reply.action, line) {
                Ok(LineOutcome::Launched) => report.launched += 1,
                Ok(LineOutcome::Copied(text)) => {
                    clipboard.push(text);
                    report.copied += 1;
                }
                Ok(LineOutcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    log::error!("error: {err}");
                    report.failed += 1;
                }
            }
        }

        if !clipboard.is_empty() {
            if let Err(err) = self.launcher.launch(&clipboard_command(&clipboard)) {
                log::error!("error: {err}");
                report.failed += 1;
            }
        }

        log::debug!("dispatch finished: {report:?}");
        report
    }

    fn handle_line(&self, action: Action, line: &str) -> Result<LineOutcome> {
        let selection = SelectionLine::parse(line)
            .ok_or_else(|| OpenerError::MalformedSelection(line.to_string()))?;
        let candidate = self
            .index
            .get(selection.index)
            .ok_or(OpenerError::IndexOutOfRange(selection.index))?;
        let scheme = self
            .registry
            .scheme_for_tag(&selection.tag)
            .ok_or_else(|| OpenerError::UnknownTag(selection.tag.clone()))?;

        if action == Action::CopyToClipboard {
            return Ok(LineOutcome::Copied(selection.display_text));
        }

        let open_action = scheme.post_handle(&candidate.raw, self.ctx)?;
        if open_action == OpenAction::NoAction {
            log::info!("nothing to open for: {}", candidate.raw_text());
            return Ok(LineOutcome::Skipped);
        }

        let opener = match action {
            Action::Reveal | Action::SystemOpen if open_action.file().is_none() => {
                let what = if action == Action::Reveal {
                    "cannot reveal selected choice in system file manager"
                } else {
                    "cannot open selected choice with system's default opener"
                };
                log::warn!("warning: {what}: {}", candidate.raw_text());
                return Ok(LineOutcome::Skipped);
            }
            Action::Reveal => OpenerKind::Reveal,
            Action::SystemOpen => OpenerKind::SystemOpen,
            Action::Open | Action::CopyToClipboard => scheme.opener(),
        };

        let resolved = command::resolve(&open_action, opener, self.ctx)?;
        log::debug!("opening [{}] {} with `{resolved}`", selection.tag, candidate.raw_text());
        self.launcher.launch(&resolved)?;
        Ok(LineOutcome::Launched)
    }
}

/// `tmux set-buffer` for the copied display texts, one per line.
pub fn clipboard_command(lines: &[String]) -> ResolvedCommand {
    let plural = if lines.len() > 1 { "s" } else { "" };
    ResolvedCommand::new(
        "tmux",
        vec![
            "set-buffer".to_string(),
            "-w".to_string(),
            lines.join("\n"),
            ";".to_string(),
            "display-message".to_string(),
            format!("copied selection{plural} to tmux buffer"),
        ],
    )
}
