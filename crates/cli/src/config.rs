use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Command line of the `fzf-links` binary.
///
/// The tmux plugin script passes every `@fzf-links-*` option through, so
/// values arrive as raw strings and are validated leniently: a bad value is
/// reported and replaced by its default instead of aborting the run.
#[derive(Parser, Debug, Clone)]
#[command(name = "fzf-links")]
#[command(about = "Pick links, paths and error locations from a tmux pane with fzf", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Scrollback lines captured above the visible part of the pane
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub history_lines: String,

    /// Editor command template; `%file` and `%line` are substituted
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub editor_open_cmd: String,

    /// Browser command template; `%url` is substituted
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub browser_open_cmd: String,

    /// fzf executable
    #[arg(long, default_value = "fzf")]
    pub fzf_path: String,

    /// Extra fzf options; `-w`, `-h`, `-x`, `-y` place the popup
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub fzf_display_options: String,

    /// Directories prepended to PATH before anything is launched
    #[arg(long, default_value = "")]
    pub path_extension: String,

    /// Threshold of messages shown in the tmux status line
    #[arg(long, default_value = "WARNING")]
    pub loglevel_tmux: String,

    /// Threshold of messages written to the log file
    #[arg(long, default_value = "DEBUG")]
    pub loglevel_file: String,

    /// Log file; file logging is off when empty
    #[arg(long, default_value = "")]
    pub log_filename: String,

    /// TOML file with user schemes
    #[arg(long, default_value = "")]
    pub user_schemes_path: String,

    /// `on` to color the choices
    #[arg(long, default_value = "off")]
    pub use_colors: String,

    /// File holding an LS_COLORS specification used instead of the environment
    #[arg(long, default_value = "")]
    pub ls_colors_filename: String,

    /// `on` to hide the key binding header in fzf
    #[arg(long, default_value = "off")]
    pub hide_fzf_header: String,

    /// Read text from this file (`-` for stdin) instead of the tmux pane
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print the indexed choices to stdout and exit without opening fzf
    #[arg(long)]
    pub list: bool,
}

/// Validated run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub history_lines: u32,
    pub editor_open_cmd: Option<String>,
    pub browser_open_cmd: Option<String>,
    pub fzf_path: String,
    pub fzf_display_options: String,
    pub path_extension: Option<String>,
    pub user_schemes_path: Option<PathBuf>,
    pub use_colors: bool,
    pub ls_colors_filename: Option<PathBuf>,
    pub hide_fzf_header: bool,
    pub input: Option<PathBuf>,
    pub list_only: bool,
}

impl Config {
    /// Must run after logging is up: invalid values are reported as warnings.
    pub fn from_cli(cli: &Cli) -> Self {
        let history_lines = match cli.history_lines.trim().parse::<u32>() {
            Ok(lines) => lines,
            Err(_) => {
                log::warn!(
                    "history lines '{}' is not a non-negative integer; using 0",
                    cli.history_lines
                );
                0
            }
        };
        let fzf_path = non_empty(&cli.fzf_path).unwrap_or_else(|| "fzf".to_string());

        Self {
            history_lines,
            editor_open_cmd: non_empty(&cli.editor_open_cmd),
            browser_open_cmd: non_empty(&cli.browser_open_cmd),
            fzf_path,
            fzf_display_options: cli.fzf_display_options.trim().to_string(),
            path_extension: non_empty(&cli.path_extension),
            user_schemes_path: non_empty(&cli.user_schemes_path).map(PathBuf::from),
            use_colors: parse_switch("use colors", &cli.use_colors),
            ls_colors_filename: non_empty(&cli.ls_colors_filename).map(PathBuf::from),
            hide_fzf_header: parse_switch("hide fzf header", &cli.hide_fzf_header),
            input: cli.input.clone(),
            list_only: cli.list,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `on`/`off` switch; anything else counts as `off`.
pub fn parse_switch(name: &str, value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" => true,
        "off" | "" => false,
        other => {
            log::warn!("{name} must be 'on' or 'off', got '{other}'; using 'off'");
            false
        }
    }
}

/// Level names as written in tmux options, case-insensitive.
/// Unknown names fall back to warnings.
pub fn parse_level(name: &str) -> LevelFilter {
    match name.trim().to_ascii_uppercase().as_str() {
        "NOTSET" | "TRACE" => LevelFilter::Trace,
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARNING" | "WARN" => LevelFilter::Warn,
        "ERROR" | "CRITICAL" | "FATAL" => LevelFilter::Error,
        "OFF" => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}
