//! Platform file utilities behind the system-open and reveal actions.

use crate::error::{OpenerError, Result};

/// Command template (`%file`) that opens a file with the desktop default app.
pub fn system_open_template() -> Result<String> {
    if cfg!(target_os = "macos") {
        Ok(format!("{} '%file'", locate("open")?))
    } else if cfg!(target_os = "linux") {
        Ok(format!("{} '%file'", locate("xdg-open")?))
    } else {
        Err(OpenerError::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Command template (`%file`) that shows a file in the platform file manager.
pub fn reveal_template() -> Result<String> {
    if cfg!(target_os = "macos") {
        Ok(format!("{} -R '%file'", locate("open")?))
    } else if cfg!(target_os = "linux") {
        Ok(format!(
            "{} --session --dest=org.freedesktop.FileManager1 --type=method_call \
             /org/freedesktop/FileManager1 org.freedesktop.FileManager1.ShowItems \
             array:string:\"file://%file\" string:\"\"",
            locate("dbus-send")?
        ))
    } else {
        Err(OpenerError::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Absolute path of `utility`, quoted for use in a template.
fn locate(utility: &str) -> Result<String> {
    let path = which::which(utility)
        .map_err(|_| OpenerError::NoSuitableApp(format!("{utility} not found in the path")))?;
    let path = path.to_string_lossy();
    shlex::try_quote(&path)
        .map(|quoted| quoted.into_owned())
        .map_err(|_| OpenerError::NoSuitableApp(format!("unusable path for {utility}: {path}")))
}
