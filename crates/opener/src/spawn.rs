use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use crate::command::ResolvedCommand;
use crate::error::{OpenerError, Result};

/// Starts resolved commands. Success means the process started; its own
/// exit status is never observed.
pub trait Launcher {
    fn launch(&self, command: &ResolvedCommand) -> Result<()>;
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(&self, command: &ResolvedCommand) -> Result<()> {
        (**self).launch(command)
    }
}

/// Launches each command in its own session with null stdio, so it keeps
/// running after fzf-links exits and the popup closes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedLauncher;

impl Launcher for DetachedLauncher {
    fn launch(&self, command: &ResolvedCommand) -> Result<()> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        match cmd.spawn() {
            Ok(child) => {
                log::debug!("launched `{command}` as pid {}", child.id());
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(OpenerError::CommandNotFound(command.program.clone()))
            }
            Err(source) => Err(OpenerError::CommandFailed {
                command: command.to_string(),
                source,
            }),
        }
    }
}
