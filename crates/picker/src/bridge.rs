use std::ffi::CString;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::{PickerError, Result};
use crate::geometry::{PaneSize, PopupGeometry};
use crate::protocol::{fzf_base_args, PickerReply};

const EXIT_CANCELLED: i32 = 130;
const EXIT_NOT_FOUND: i32 = 127;

const FIFO_POLL_INTERVAL: Duration = Duration::from_millis(50);
const FIFO_DRAIN_ATTEMPTS: usize = 40;

#[derive(Clone, Debug)]
pub struct PickerConfig {
    /// fzf executable, looked up in `PATH` by the popup shell.
    pub fzf_path: String,
    /// Extra fzf arguments; popup placement options are taken out of them.
    pub display_options: String,
    /// Choices carry color sequences.
    pub ansi: bool,
    pub show_header: bool,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            fzf_path: "fzf".to_string(),
            display_options: String::new(),
            ansi: false,
            show_header: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerOutcome {
    Selected(PickerReply),
    Cancelled,
}

/// Runs fzf in a tmux popup and collects its reply.
///
/// fzf reads the choices from a file and writes to two FIFOs in a private
/// temporary directory, which is removed when `pick` returns.
#[derive(Clone, Debug)]
pub struct Picker {
    config: PickerConfig,
}

impl Picker {
    pub fn new(config: PickerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    /// Popup placement plus the full fzf argument list.
    pub fn prepare(&self, choices: usize, pane: PaneSize) -> Result<(PopupGeometry, Vec<String>)> {
        let mut user_args = shlex::split(&self.config.display_options).ok_or_else(|| {
            PickerError::InvalidOption("unbalanced quotes in fzf display options".to_string())
        })?;
        let geometry =
            PopupGeometry::resolve(&mut user_args, pane, choices, self.config.show_header)?;
        let mut args = fzf_base_args(self.config.ansi, self.config.show_header);
        args.extend(user_args);
        Ok((geometry, args))
    }

    pub async fn pick(&self, choices: &[String], pane: PaneSize) -> Result<PickerOutcome> {
        let (geometry, fzf_args) = self.prepare(choices.len(), pane)?;

        let workdir = tempfile::Builder::new().prefix("fzf-links-").tempdir()?;
        let choices_path = workdir.path().join("choices");
        let stdout_fifo = workdir.path().join("fzf_stdout");
        let stderr_fifo = workdir.path().join("fzf_stderr");

        let mut corpus = choices.join("\n");
        corpus.push('\n');
        tokio::fs::write(&choices_path, corpus).await?;
        make_fifo(&stdout_fifo)?;
        make_fifo(&stderr_fifo)?;

        let script = popup_script(
            &self.config.fzf_path,
            &fzf_args,
            &choices_path,
            &stdout_fifo,
            &stderr_fifo,
        )?;
        log::debug!("fzf popup: {script}");

        let mut popup = Command::new("tmux")
            .arg("popup")
            .arg("-E")
            .args(geometry.tmux_args())
            .arg(&script)
            .kill_on_drop(true)
            .spawn()
            .map_err(PickerError::Popup)?;

        let stdout_reader = tokio::spawn(tokio::fs::read(stdout_fifo.clone()));
        let stderr_reader = tokio::spawn(tokio::fs::read(stderr_fifo.clone()));

        let status = popup.wait().await?;
        let stdout = drain_fifo(stdout_reader, &stdout_fifo).await?;
        let stderr = drain_fifo(stderr_reader, &stderr_fifo).await?;

        interpret_exit(status.code(), &stdout, &stderr, &self.config.fzf_path)
    }
}

/// Map the popup's exit status and output to an outcome.
pub fn interpret_exit(
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
    fzf_path: &str,
) -> Result<PickerOutcome> {
    match code {
        Some(0) => Ok(PickerOutcome::Selected(PickerReply::parse(stdout)?)),
        Some(EXIT_CANCELLED) => Ok(PickerOutcome::Cancelled),
        Some(EXIT_NOT_FOUND) => Err(PickerError::FzfNotFound(fzf_path.to_string())),
        Some(code) => Err(PickerError::FzfFailed {
            code,
            stderr: stderr.trim().to_string(),
        }),
        None => Err(PickerError::Terminated),
    }
}

/// Shell line run inside the popup.
pub fn popup_script(
    fzf_path: &str,
    fzf_args: &[String],
    choices: &Path,
    stdout_fifo: &Path,
    stderr_fifo: &Path,
) -> Result<String> {
    let mut words = vec![quote(fzf_path)?];
    for arg in fzf_args {
        words.push(quote(arg)?);
    }
    Ok(format!(
        "{} < {} > {} 2> {}",
        words.join(" "),
        quote_path(choices)?,
        quote_path(stdout_fifo)?,
        quote_path(stderr_fifo)?,
    ))
}

fn quote(word: &str) -> Result<String> {
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .map_err(|_| PickerError::InvalidOption(format!("cannot pass {word:?} to the popup shell")))
}

fn quote_path(path: &Path) -> Result<String> {
    quote(&path.to_string_lossy())
}

fn make_fifo(path: &Path) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
    if unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Wait for a FIFO reader to finish. A reader still blocked in `open` after
/// the popup exited (the shell never opened its end) is released by opening
/// and closing the write end ourselves.
async fn drain_fifo(mut reader: JoinHandle<io::Result<Vec<u8>>>, path: &Path) -> Result<String> {
    for _ in 0..FIFO_DRAIN_ATTEMPTS {
        match tokio::time::timeout(FIFO_POLL_INTERVAL, &mut reader).await {
            Ok(joined) => {
                let bytes = joined.map_err(io::Error::other)??;
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }
            Err(_) => release_reader(path),
        }
    }
    reader.abort();
    Err(PickerError::Stalled)
}

fn release_reader(path: &Path) {
    // ENXIO until the reader has opened its end; the next round retries.
    let _ = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path);
}
