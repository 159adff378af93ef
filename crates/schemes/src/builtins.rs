//! Schemes shipped with fzf-links, in registry order: url, file, git, code error.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::colors::Rgb;
use crate::context::{heuristic_find_file, RunContext};
use crate::error::Result;
use crate::model::{DisplayCandidate, OpenAction, OpenerKind, Pattern, PreHandled, RawMatch, Scheme};
use crate::template::CommandTemplate;

const URL_COLOR: Rgb = Rgb(200, 0, 255);
const GIT_COLOR: Rgb = Rgb(0, 255, 115);
const CODE_ERROR_COLOR: Rgb = Rgb(255, 0, 0);

/// Bytes inspected when deciding whether a file is binary.
const BINARY_PROBE_BYTES: u64 = 4096;

const URL_PATTERN: &str =
    r"https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_+.~#?&/=]*";

const FILE_PATTERNS: &[&str] = &[
    // whole line from its start, spaces allowed
    r#"(?m)(?P<link>^[^<>:"\\|?*\x00-\x1F]+)(:(?P<line>\d+))?"#,
    // single-quoted, spaces allowed
    r#"'(?P<link>[^:'"|?*\x00-\x1F]+)'(:(?P<line>\d+))?"#,
    // bare, no spaces
    r#"(?P<link>[^ :'"|?*\x00-\x1F]+)(:(?P<line>\d+))?"#,
];

const GIT_PATTERN: &str =
    r#"(ssh://)?git@(?P<server>[^ \t\n"')\]}]+):(?P<repo>[^ .\t\n"')\]}]+)"#;

const CODE_ERROR_PATTERN: &str = r#"File "(?P<file>...*?)", line (?P<line>[0-9]+)"#;

pub fn builtin_schemes() -> Result<Vec<Scheme>> {
    Ok(vec![
        url_scheme()?,
        file_scheme()?,
        git_scheme()?,
        code_error_scheme()?,
    ])
}

pub fn url_scheme() -> Result<Scheme> {
    Ok(
        Scheme::new(["url"], OpenerKind::Browser, vec![Pattern::new(URL_PATTERN)?])?
            .with_pre_handler(|raw, ctx| {
                PreHandled::Accepted(DisplayCandidate {
                    display_text: ctx.colors.paint(URL_COLOR, raw.as_str()),
                    tag: "url".to_string(),
                })
            }),
    )
}

pub fn file_scheme() -> Result<Scheme> {
    let patterns = FILE_PATTERNS
        .iter()
        .map(|source| Pattern::new(source))
        .collect::<Result<Vec<_>>>()?;
    Ok(Scheme::new(["file", "dir"], OpenerKind::Custom, patterns)?
        .with_pre_handler(file_pre_handler)
        .with_post_handler(file_post_handler))
}

pub fn git_scheme() -> Result<Scheme> {
    Ok(
        Scheme::new(["git"], OpenerKind::Browser, vec![Pattern::new(GIT_PATTERN)?])?
            .with_pre_handler(|raw, ctx| {
                PreHandled::Accepted(DisplayCandidate {
                    display_text: ctx.colors.paint(GIT_COLOR, raw.as_str()),
                    tag: "git".to_string(),
                })
            })
            .with_post_handler(git_post_handler),
    )
}

pub fn code_error_scheme() -> Result<Scheme> {
    Ok(Scheme::new(
        ["code err.", "Python"],
        OpenerKind::Editor,
        vec![Pattern::new(CODE_ERROR_PATTERN)?],
    )?
    .with_pre_handler(code_error_pre_handler)
    .with_post_handler(code_error_post_handler))
}

fn file_pre_handler(raw: &RawMatch, ctx: &RunContext) -> PreHandled {
    let Some(link) = raw.name("link") else {
        return PreHandled::Rejected;
    };
    // `.`, `..` and a lone `~` are everywhere in shell output
    if link.chars().all(|c| c == '.') || link == "~" {
        return PreHandled::Rejected;
    }
    let Some(resolved) = heuristic_find_file(link) else {
        return PreHandled::Rejected;
    };
    let tag = if resolved.is_dir() { "dir" } else { "file" };
    PreHandled::Accepted(DisplayCandidate {
        display_text: ctx.colors.paint_path(&resolved, link),
        tag: tag.to_string(),
    })
}

fn file_post_handler(raw: &RawMatch, ctx: &RunContext) -> OpenAction {
    let Some(link) = raw.name("link") else {
        return OpenAction::NoAction;
    };
    let line = raw.name("line").unwrap_or("1");

    let Some(resolved) = heuristic_find_file(link) else {
        log::warn!("could not resolve the path of: {link}");
        return OpenAction::NoAction;
    };
    let resolved_str = resolved.to_string_lossy().into_owned();

    if !resolved.is_file() {
        let Ok(quoted) = shlex::try_quote(&resolved_str) else {
            log::warn!("cannot change directory to: {resolved_str}");
            return OpenAction::NoAction;
        };
        return OpenAction::Custom {
            cmd: "tmux".to_string(),
            args: vec![
                "send-keys".to_string(),
                format!("cd {quoted}"),
                "C-m".to_string(),
            ],
            file: Some(resolved_str),
        };
    }

    match is_binary(&resolved) {
        Ok(false) => {}
        Ok(true) => {
            log::warn!("binary files cannot be opened with the editor: {resolved_str}");
            return OpenAction::NoAction;
        }
        Err(err) => {
            log::warn!("cannot read {resolved_str}: {err}");
            return OpenAction::NoAction;
        }
    }

    let Some(template) = ctx.editor_template() else {
        log::warn!("no editor command is configured");
        return OpenAction::NoAction;
    };
    let template = match CommandTemplate::parse(&template) {
        Ok(template) => template,
        Err(err) => {
            log::warn!("{err}");
            return OpenAction::NoAction;
        }
    };
    let mut argv = template
        .expand(&[("file", resolved_str.as_str()), ("line", line)])
        .into_iter();
    let Some(cmd) = argv.next() else {
        return OpenAction::NoAction;
    };
    OpenAction::Custom {
        cmd,
        args: argv.collect(),
        file: Some(resolved_str),
    }
}

fn git_post_handler(raw: &RawMatch, _ctx: &RunContext) -> OpenAction {
    match (raw.name("server"), raw.name("repo")) {
        (Some(server), Some(repo)) => OpenAction::Url {
            url: format!("https://{server}/{repo}"),
        },
        _ => OpenAction::NoAction,
    }
}

fn code_error_pre_handler(raw: &RawMatch, ctx: &RunContext) -> PreHandled {
    let (Some(file), Some(line)) = (raw.name("file"), raw.name("line")) else {
        return PreHandled::Rejected;
    };
    let Some(resolved) = heuristic_find_file(file) else {
        return PreHandled::Rejected;
    };
    let tag = match resolved.extension().and_then(|ext| ext.to_str()) {
        Some("py") => "Python",
        _ => "code err.",
    };
    PreHandled::Accepted(DisplayCandidate {
        display_text: ctx
            .colors
            .paint(CODE_ERROR_COLOR, &format!("{file}, line {line}")),
        tag: tag.to_string(),
    })
}

fn code_error_post_handler(raw: &RawMatch, _ctx: &RunContext) -> OpenAction {
    let (Some(file), Some(line)) = (raw.name("file"), raw.name("line")) else {
        return OpenAction::NoAction;
    };
    match heuristic_find_file(file) {
        Some(resolved) => OpenAction::File {
            file: resolved.to_string_lossy().into_owned(),
            line: Some(line.to_string()),
        },
        None => {
            log::warn!("could not resolve the path of: {file}");
            OpenAction::NoAction
        }
    }
}

/// A NUL byte near the start of a file marks it as binary.
fn is_binary(path: &Path) -> io::Result<bool> {
    let mut chunk = Vec::with_capacity(BINARY_PROBE_BYTES as usize);
    File::open(path)?
        .take(BINARY_PROBE_BYTES)
        .read_to_end(&mut chunk)?;
    Ok(chunk.contains(&0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn first_match(scheme: &Scheme, text: &str) -> RawMatch {
        scheme
            .patterns()
            .iter()
            .flat_map(|p| p.find_all(text))
            .next()
            .expect("match")
    }

    #[test]
    fn git_scheme_resolves_https_url() {
        let scheme = git_scheme().unwrap();
        let ctx = RunContext::default();
        let raw = first_match(&scheme, "git@github.com:org/repo.git");

        assert_eq!(scheme.opener(), OpenerKind::Browser);
        assert_eq!(
            scheme.post_handle(&raw, &ctx).unwrap(),
            OpenAction::Url {
                url: "https://github.com/org/repo".to_string()
            }
        );
        assert_eq!(
            scheme.pre_handle(&raw, &ctx),
            PreHandled::Accepted(DisplayCandidate {
                display_text: "git@github.com:org/repo".to_string(),
                tag: "git".to_string(),
            })
        );
    }

    #[test]
    fn url_scheme_matches_plain_urls() {
        let scheme = url_scheme().unwrap();
        let raw = first_match(&scheme, "see https://www.rust-lang.org/learn, then stop");
        assert_eq!(raw.as_str(), "https://www.rust-lang.org/learn");
    }

    #[test]
    fn file_scheme_tags_directories_and_rejects_dots() {
        let temp = tempdir().unwrap();
        let scheme = file_scheme().unwrap();
        let ctx = RunContext::default();
        let dir = temp.path().to_str().unwrap();

        let raw = first_match(&scheme, dir);
        match scheme.pre_handle(&raw, &ctx) {
            PreHandled::Accepted(candidate) => assert_eq!(candidate.tag, "dir"),
            PreHandled::Rejected => panic!("directory should be accepted"),
        }

        let dots = first_match(&scheme, "..");
        assert_eq!(scheme.pre_handle(&dots, &ctx), PreHandled::Rejected);
    }

    #[test]
    fn file_post_handler_uses_editor_template_and_line() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("main.rs");
        fs::write(&file, "fn main() {}\n").unwrap();
        let resolved = file.canonicalize().unwrap();
        let resolved = resolved.to_str().unwrap();

        let scheme = file_scheme().unwrap();
        let ctx = RunContext {
            editor_open_cmd: Some("vim +%line '%file'".to_string()),
            ..RunContext::default()
        };
        let raw = first_match(&scheme, &format!("{}:42", file.display()));

        assert_eq!(
            scheme.post_handle(&raw, &ctx).unwrap(),
            OpenAction::Custom {
                cmd: "vim".to_string(),
                args: vec!["+42".to_string(), resolved.to_string()],
                file: Some(resolved.to_string()),
            }
        );
    }

    #[test]
    fn file_post_handler_refuses_binary_files() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("blob.bin");
        fs::write(&file, b"\x7fELF\x00\x01").unwrap();

        let scheme = file_scheme().unwrap();
        let ctx = RunContext {
            editor_open_cmd: Some("vim '%file'".to_string()),
            ..RunContext::default()
        };
        let raw = first_match(&scheme, file.to_str().unwrap());

        assert_eq!(scheme.post_handle(&raw, &ctx).unwrap(), OpenAction::NoAction);
    }

    #[test]
    fn code_error_scheme_tags_python_files() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("app.py");
        fs::write(&file, "print(1)\n").unwrap();

        let scheme = code_error_scheme().unwrap();
        let ctx = RunContext::default();
        let text = format!("  File \"{}\", line 7, in <module>", file.display());
        let raw = first_match(&scheme, &text);

        match scheme.pre_handle(&raw, &ctx) {
            PreHandled::Accepted(candidate) => {
                assert_eq!(candidate.tag, "Python");
                assert_eq!(candidate.display_text, format!("{}, line 7", file.display()));
            }
            PreHandled::Rejected => panic!("existing file should be accepted"),
        }
        assert_eq!(
            scheme.post_handle(&raw, &ctx).unwrap(),
            OpenAction::File {
                file: file.canonicalize().unwrap().to_string_lossy().into_owned(),
                line: Some("7".to_string()),
            }
        );
    }
}
