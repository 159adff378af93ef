//! `fzf-links`: capture the tmux pane, list what can be opened, let the user
//! pick with fzf in a popup and open the picks.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fzf_links_opener::{DetachedLauncher, Dispatcher};
use fzf_links_picker::{PaneSize, Picker, PickerConfig, PickerOutcome};
use fzf_links_schemes::{
    builtin_schemes, scan, CandidateIndex, Colors, LsColors, RunContext, SchemeRegistry,
    UserSchemes,
};
use unicode_normalization::UnicodeNormalization;

pub mod config;
pub mod logging;
pub mod tmux;

use config::{Cli, Config};
use logging::LogSettings;

pub async fn main_entry() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(&LogSettings::from_cli(&cli)) {
        log::error!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    let config = Config::from_cli(&cli);
    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> Result<()> {
    if let Some(extension) = &config.path_extension {
        extend_path(extension);
    }

    let user = match &config.user_schemes_path {
        Some(path) => UserSchemes::load(path)
            .with_context(|| format!("failed to load user schemes from {}", path.display()))?,
        None => UserSchemes::default(),
    };
    let ctx = run_context(config, &user);
    let registry = SchemeRegistry::build(user.schemes, builtin_schemes()?, &user.removed)
        .context("failed to build the scheme registry")?;

    let (text, pane) = match &config.input {
        Some(input) => (read_input(input)?, None),
        None => {
            let (text, info) = capture_active_pane(config.history_lines).await?;
            (text, Some(info.size))
        }
    };
    let text: String = text.nfc().collect();

    let candidates = scan(&text, &registry, &ctx);
    if candidates.is_empty() {
        log::info!("no link found");
        return Ok(());
    }
    let index = CandidateIndex::new(candidates);
    let choices = index.render(&ctx.colors);
    log::debug!("{} choices indexed", choices.len());

    if config.list_only {
        return print_choices(&choices);
    }

    let pane = match pane {
        Some(pane) => pane,
        None => {
            tmux::pane_info()
                .await
                .context("tmux pane size could not be determined")?
                .size
        }
    };
    let pane = check_pane(pane)?;
    let picker = Picker::new(PickerConfig {
        fzf_path: config.fzf_path.clone(),
        display_options: config.fzf_display_options.clone(),
        ansi: ctx.colors.enabled(),
        show_header: !config.hide_fzf_header,
    });
    let reply = match picker.pick(&choices, pane).await? {
        PickerOutcome::Selected(reply) => reply,
        PickerOutcome::Cancelled => {
            log::debug!("selection cancelled");
            return Ok(());
        }
    };
    log::debug!("{} line(s) picked with {}", reply.selection.len(), reply.action);

    let ctx = ctx.without_colors();
    let report = Dispatcher::new(&registry, &index, &ctx, DetachedLauncher).dispatch(&reply);
    if report.failed > 0 {
        log::debug!("{} of {} picks failed", report.failed, reply.selection.len());
    }
    Ok(())
}

async fn capture_active_pane(history_lines: u32) -> Result<(String, tmux::PaneInfo)> {
    let info = tmux::pane_info()
        .await
        .context("tmux pane size could not be determined")?;
    let text = tmux::capture_pane(&info, history_lines)
        .await
        .context("tmux pane content could not be captured")?;
    let cwd = tmux::current_path()
        .await
        .context("current directory could not be changed")?;
    env::set_current_dir(&cwd)
        .with_context(|| format!("current directory could not be changed to {}", cwd.display()))?;
    Ok((text, info))
}

fn run_context(config: &Config, user: &UserSchemes) -> RunContext {
    let mut colors = Colors::new(config.use_colors);
    user.apply_colors(&mut colors);
    if config.use_colors {
        match &config.ls_colors_filename {
            Some(path) => match fs::read_to_string(path) {
                Ok(spec) => colors.set_ls_colors(LsColors::parse(spec.trim())),
                Err(_) => log::warn!(
                    "file '{}' not found; LS_COLORS cannot be configured",
                    path.display()
                ),
            },
            None => colors.set_ls_colors(LsColors::from_env()),
        }
    }

    RunContext {
        colors,
        editor_open_cmd: config.editor_open_cmd.clone(),
        browser_open_cmd: config.browser_open_cmd.clone(),
    }
}

/// Prepend `extension` to `PATH` unless it is already listed.
fn extend_path(extension: &str) {
    let current = env::var("PATH").unwrap_or_default();
    if let Some(path) = extended_path(&current, extension) {
        log::debug!("PATH extended with {extension}");
        env::set_var("PATH", path);
    }
}

fn extended_path(current: &str, extension: &str) -> Option<String> {
    if current.split(':').any(|dir| dir == extension) {
        return None;
    }
    if current.is_empty() {
        return Some(extension.to_string());
    }
    Some(format!("{extension}:{current}"))
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read text from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn print_choices(choices: &[String]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for choice in choices {
        if let Err(err) = writeln!(stdout, "{choice}") {
            if err.kind() == io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(err.into());
        }
    }
    stdout.flush()?;
    Ok(())
}

/// Rejects a pane too small to be useful before the popup is sized from it.
pub fn check_pane(pane: PaneSize) -> Result<PaneSize> {
    if pane.height <= 0 || pane.width <= 0 {
        bail!("tmux pane size could not be determined");
    }
    Ok(pane)
}
