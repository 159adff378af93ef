use std::fmt;

use fzf_links_schemes::{CommandTemplate, OpenAction, OpenerKind, RunContext};

use crate::error::{OpenerError, Result};
use crate::platform;

/// A program and its arguments, ready to launch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ResolvedCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn from_template(template: &str, vars: &[(&str, &str)]) -> Result<Self> {
        let mut argv = CommandTemplate::parse(template)?.expand(vars).into_iter();
        // parse() rejects empty templates
        let program = argv.next().unwrap_or_default();
        Ok(Self::new(program, argv.collect()))
    }
}

impl fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Turn a post-handled action into the command that opens it with `opener`.
pub fn resolve(action: &OpenAction, opener: OpenerKind, ctx: &RunContext) -> Result<ResolvedCommand> {
    let incompatible = || OpenerError::IncompatibleAction {
        opener,
        action: action.kind(),
    };

    match (opener, action) {
        (OpenerKind::Custom, OpenAction::Custom { cmd, args, .. }) => {
            Ok(ResolvedCommand::new(cmd.clone(), args.clone()))
        }
        (OpenerKind::Editor, OpenAction::File { file, line }) => {
            let template = ctx
                .editor_template()
                .ok_or(OpenerError::NoEditorConfigured)?;
            ResolvedCommand::from_template(
                &template,
                &[("file", file.as_str()), ("line", line.as_deref().unwrap_or("1"))],
            )
        }
        (OpenerKind::Browser, OpenAction::Url { url }) => {
            let template = ctx
                .browser_template()
                .ok_or(OpenerError::NoBrowserConfigured)?;
            ResolvedCommand::from_template(&template, &[("url", url.as_str())])
        }
        (OpenerKind::SystemOpen, _) => {
            let file = action.file().ok_or_else(incompatible)?;
            ResolvedCommand::from_template(&platform::system_open_template()?, &[("file", file)])
        }
        (OpenerKind::Reveal, _) => {
            let file = action.file().ok_or_else(incompatible)?;
            ResolvedCommand::from_template(&platform::reveal_template()?, &[("file", file)])
        }
        _ => Err(incompatible()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> RunContext {
        RunContext {
            editor_open_cmd: Some("code --goto '%file:%line'".to_string()),
            browser_open_cmd: Some("firefox --new-tab %url".to_string()),
            ..RunContext::default()
        }
    }

    #[test]
    fn editor_line_defaults_to_one() {
        let action = OpenAction::File {
            file: "/srv/my app/main.rs".to_string(),
            line: None,
        };
        assert_eq!(
            resolve(&action, OpenerKind::Editor, &ctx()).unwrap(),
            ResolvedCommand::new(
                "code",
                vec!["--goto".to_string(), "/srv/my app/main.rs:1".to_string()]
            )
        );
    }

    #[test]
    fn browser_uses_url_template() {
        let action = OpenAction::Url {
            url: "https://example.com/?q=a b".to_string(),
        };
        let command = resolve(&action, OpenerKind::Browser, &ctx()).unwrap();
        assert_eq!(command.to_string(), "firefox --new-tab https://example.com/?q=a b");
        assert_eq!(command.args.len(), 2);
    }

    #[test]
    fn custom_action_is_passed_through() {
        let action = OpenAction::Custom {
            cmd: "tmux".to_string(),
            args: vec!["send-keys".to_string(), "cd /tmp".to_string(), "C-m".to_string()],
            file: Some("/tmp".to_string()),
        };
        let command = resolve(&action, OpenerKind::Custom, &ctx()).unwrap();
        assert_eq!(command.program, "tmux");
        assert_eq!(command.args[1], "cd /tmp");
    }

    #[test]
    fn mismatched_action_is_rejected() {
        let url = OpenAction::Url {
            url: "https://example.com".to_string(),
        };
        assert!(matches!(
            resolve(&url, OpenerKind::Editor, &ctx()),
            Err(OpenerError::IncompatibleAction { action: "url", .. })
        ));
        assert!(matches!(
            resolve(&url, OpenerKind::Reveal, &ctx()),
            Err(OpenerError::IncompatibleAction { .. })
        ));
        assert!(matches!(
            resolve(&OpenAction::NoAction, OpenerKind::Custom, &ctx()),
            Err(OpenerError::IncompatibleAction { action: "none", .. })
        ));
    }
}
