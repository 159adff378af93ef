//! Declarative user schemes, loaded from a TOML file.
//!
//! ```toml
//! rm_default_schemes = ["git"]
//! tag_color = [255, 255, 0]
//!
//! [[schemes]]
//! tags = ["IPv4"]
//! opener = "custom"
//! patterns = ['(?<!://)(?P<ip>\b(?:\d{1,3}\.){3}\d{1,3}\b(:\d+)?)']
//!
//! [schemes.display]
//! text = "{ip}"
//!
//! [schemes.action]
//! cmd = "tmux"
//! args = ["set-buffer", "-w", "{ip}"]
//! ```
//!
//! Templates refer to capture groups as `{0}`, `{N}` or `{name}`; `{{` and
//! `}}` stand for literal braces.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::colors::{Colors, Rgb};
use crate::error::{Result, SchemeError};
use crate::model::{
    DisplayCandidate, OpenAction, OpenerKind, Pattern, PreHandled, RawMatch, Scheme,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserFile {
    #[serde(default)]
    rm_default_schemes: Vec<String>,
    #[serde(default)]
    schemes: Vec<SchemeDef>,
    index_color: Option<Rgb>,
    tag_color: Option<Rgb>,
    dash_color: Option<Rgb>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemeDef {
    tags: Vec<String>,
    opener: OpenerKind,
    patterns: Vec<String>,
    display: Option<DisplayDef>,
    action: Option<ActionDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DisplayDef {
    text: Option<String>,
    tag: Option<String>,
    color: Option<Rgb>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionDef {
    url: Option<String>,
    file: Option<String>,
    line: Option<String>,
    cmd: Option<String>,
    #[serde(default)]
    args: Vec<String>,
}

/// Everything a user scheme file contributes to a run.
#[derive(Debug, Default)]
pub struct UserSchemes {
    /// Compiled schemes, in file order.
    pub schemes: Vec<Scheme>,
    /// Tags whose schemes must not be registered.
    pub removed: Vec<String>,
    pub index_color: Option<Rgb>,
    pub tag_color: Option<Rgb>,
    pub dash_color: Option<Rgb>,
}

impl UserSchemes {
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let loaded = Self::parse(&source)?;
        log::debug!(
            "loaded {} user schemes from {}",
            loaded.schemes.len(),
            path.display()
        );
        Ok(loaded)
    }

    pub fn parse(source: &str) -> Result<Self> {
        let file: UserFile = toml::from_str(source)?;
        let schemes = file
            .schemes
            .into_iter()
            .map(compile_scheme)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schemes,
            removed: file.rm_default_schemes,
            index_color: file.index_color,
            tag_color: file.tag_color,
            dash_color: file.dash_color,
        })
    }

    pub fn apply_colors(&self, colors: &mut Colors) {
        if let Some(color) = self.index_color {
            colors.set_index_color(color);
        }
        if let Some(color) = self.tag_color {
            colors.set_tag_color(color);
        }
        if let Some(color) = self.dash_color {
            colors.set_dash_color(color);
        }
    }
}

fn compile_scheme(def: SchemeDef) -> Result<Scheme> {
    let patterns = def
        .patterns
        .iter()
        .map(|source| Pattern::new(source))
        .collect::<Result<Vec<_>>>()?;
    let scheme = Scheme::new(def.tags.clone(), def.opener, patterns)?;

    let display = def.display.unwrap_or_default();
    let text = GroupTemplate::parse(display.text.as_deref().unwrap_or("{0}"))?;
    let tag = display.tag.as_deref().map(GroupTemplate::parse).transpose()?;
    let action = def.action.map(ActionTemplate::compile).transpose()?;

    let mut templates = vec![&text];
    templates.extend(tag.as_ref());
    if let Some(action) = &action {
        templates.extend(action.templates());
    }
    for template in templates {
        for group in template.groups() {
            if !scheme.patterns().iter().any(|p| p.has_group(group)) {
                return Err(SchemeError::invalid_template(
                    template.as_str(),
                    format!("no pattern of {:?} has a group {group:?}", def.tags),
                ));
            }
        }
    }

    match &action {
        Some(action) if !action.fits(def.opener) => {
            return Err(SchemeError::invalid_scheme(
                &def.tags,
                format!("a {} action cannot be used with the {} opener", action.kind(), def.opener),
            ));
        }
        None if def.opener == OpenerKind::Custom => {
            return Err(SchemeError::MissingPostHandler(def.tags));
        }
        _ => {}
    }

    let first_tag = scheme.first_tag().to_string();
    let color = display.color;
    let scheme = scheme.with_pre_handler(move |raw, ctx| {
        let Some(display_text) = text.render(raw) else {
            return PreHandled::Rejected;
        };
        let tag = match &tag {
            Some(tag) => match tag.render(raw) {
                Some(tag) => tag,
                None => return PreHandled::Rejected,
            },
            None => first_tag.clone(),
        };
        let display_text = match color {
            Some(color) => ctx.colors.paint(color, &display_text),
            None => display_text,
        };
        PreHandled::Accepted(DisplayCandidate { display_text, tag })
    });

    Ok(match action {
        Some(action) => scheme.with_post_handler(move |raw, _| action.render(raw)),
        None => scheme,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Group(String),
}

/// Text with `{group}` references into a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl GroupTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => key.push(c),
                            None => {
                                return Err(SchemeError::invalid_template(source, "unclosed '{'"))
                            }
                        }
                    }
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(SchemeError::invalid_template(source, "empty group reference"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Group(key.to_string()));
                }
                '}' => return Err(SchemeError::invalid_template(source, "unmatched '}'")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Group keys referenced by the template.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Group(key) => Some(key.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// `None` when a referenced group did not take part in the match.
    pub fn render(&self, raw: &RawMatch) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Group(key) => out.push_str(raw.group(key)?),
            }
        }
        Some(out)
    }
}

#[derive(Debug)]
enum ActionTemplate {
    Url(GroupTemplate),
    File {
        file: GroupTemplate,
        line: Option<GroupTemplate>,
    },
    Custom {
        cmd: GroupTemplate,
        args: Vec<GroupTemplate>,
        file: Option<GroupTemplate>,
    },
}

impl ActionTemplate {
    fn compile(def: ActionDef) -> Result<Self> {
        let parse = |value: Option<String>| value.as_deref().map(GroupTemplate::parse).transpose();
        match (def.url, def.cmd) {
            (Some(_), Some(_)) => Err(invalid_action("`url` and `cmd` are mutually exclusive")),
            (Some(url), None) => {
                if def.file.is_some() || def.line.is_some() || !def.args.is_empty() {
                    return Err(invalid_action("a `url` action takes no other field"));
                }
                Ok(Self::Url(GroupTemplate::parse(&url)?))
            }
            (None, Some(cmd)) => {
                if def.line.is_some() {
                    return Err(invalid_action("`line` is only valid with a `file` action"));
                }
                Ok(Self::Custom {
                    cmd: GroupTemplate::parse(&cmd)?,
                    args: def
                        .args
                        .iter()
                        .map(|arg| GroupTemplate::parse(arg))
                        .collect::<Result<Vec<_>>>()?,
                    file: parse(def.file)?,
                })
            }
            (None, None) => {
                if !def.args.is_empty() {
                    return Err(invalid_action("`args` requires `cmd`"));
                }
                let file = parse(def.file)?
                    .ok_or_else(|| invalid_action("one of `url`, `file` or `cmd` is required"))?;
                Ok(Self::File {
                    file,
                    line: parse(def.line)?,
                })
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::File { .. } => "file",
            Self::Custom { .. } => "cmd",
        }
    }

    fn templates(&self) -> Vec<&GroupTemplate> {
        match self {
            Self::Url(url) => vec![url],
            Self::File { file, line } => std::iter::once(file).chain(line.as_ref()).collect(),
            Self::Custom { cmd, args, file } => std::iter::once(cmd)
                .chain(args.iter())
                .chain(file.as_ref())
                .collect(),
        }
    }

    fn fits(&self, opener: OpenerKind) -> bool {
        match opener {
            OpenerKind::Browser => matches!(self, Self::Url(_)),
            OpenerKind::Editor => matches!(self, Self::File { .. }),
            OpenerKind::Custom => matches!(self, Self::Custom { .. }),
            OpenerKind::SystemOpen | OpenerKind::Reveal => match self {
                Self::File { .. } => true,
                Self::Custom { file, .. } => file.is_some(),
                Self::Url(_) => false,
            },
        }
    }

    fn render(&self, raw: &RawMatch) -> OpenAction {
        self.try_render(raw).unwrap_or_else(|| {
            log::warn!("{:?}: a required group did not match", raw.as_str());
            OpenAction::NoAction
        })
    }

    fn try_render(&self, raw: &RawMatch) -> Option<OpenAction> {
        match self {
            Self::Url(url) => Some(OpenAction::Url {
                url: url.render(raw)?,
            }),
            Self::File { file, line } => Some(OpenAction::File {
                file: file.render(raw)?,
                line: line.as_ref().and_then(|line| line.render(raw)),
            }),
            Self::Custom { cmd, args, file } => Some(OpenAction::Custom {
                cmd: cmd.render(raw)?,
                args: args
                    .iter()
                    .map(|arg| arg.render(raw))
                    .collect::<Option<Vec<_>>>()?,
                file: file.as_ref().and_then(|file| file.render(raw)),
            }),
        }
    }
}

fn invalid_action(reason: &str) -> SchemeError {
    SchemeError::invalid_template("[schemes.action]", reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use pretty_assertions::assert_eq;

    const IP_SCHEMES: &str = r#"
rm_default_schemes = ["git"]
tag_color = [255, 255, 0]

[[schemes]]
tags = ["IPv4"]
opener = "custom_open"
patterns = ['(?<!://)(?P<ip>\b(?:\d{1,3}\.){3}\d{1,3}\b)(:(?P<port>\d+))?']

[schemes.display]
text = "{ip}"

[schemes.action]
cmd = "tmux"
args = ["set-buffer", "-w", "{ip}"]
"#;

    fn matches(scheme: &Scheme, text: &str) -> Vec<RawMatch> {
        scheme
            .patterns()
            .iter()
            .flat_map(|p| p.find_all(text))
            .collect()
    }

    #[test]
    fn loads_schemes_removals_and_colors() {
        let user = UserSchemes::parse(IP_SCHEMES).unwrap();
        assert_eq!(user.removed, vec!["git".to_string()]);
        assert_eq!(user.schemes.len(), 1);

        let mut colors = Colors::new(true);
        user.apply_colors(&mut colors);
        assert_eq!(colors.tag_color(), "\x1b[38;2;255;255;0m");

        let scheme = &user.schemes[0];
        let ctx = RunContext::default();
        let found = matches(scheme, "http://10.0.0.1 ping 192.168.1.1:22");
        assert_eq!(found.len(), 1);
        assert_eq!(
            scheme.pre_handle(&found[0], &ctx),
            PreHandled::Accepted(DisplayCandidate {
                display_text: "192.168.1.1".to_string(),
                tag: "IPv4".to_string(),
            })
        );
        assert_eq!(
            scheme.post_handle(&found[0], &ctx).unwrap(),
            OpenAction::Custom {
                cmd: "tmux".to_string(),
                args: vec!["set-buffer".into(), "-w".into(), "192.168.1.1".into()],
                file: None,
            }
        );
    }

    #[test]
    fn missing_groups_reject_or_drop_action() {
        let user = UserSchemes::parse(
            r#"
[[schemes]]
tags = ["issue"]
opener = "browser"
patterns = ['#(?P<num>\d+)|(?P<bare>ISSUE)']

[schemes.display]
text = "issue {num}"

[schemes.action]
url = "https://tracker/{{id}}/{bare}"
"#,
        )
        .unwrap();
        let scheme = &user.schemes[0];
        let ctx = RunContext::default();
        let found = matches(scheme, "#42 ISSUE");

        assert_eq!(
            scheme.pre_handle(&found[0], &ctx),
            PreHandled::Accepted(DisplayCandidate {
                display_text: "issue 42".to_string(),
                tag: "issue".to_string(),
            })
        );
        assert_eq!(scheme.post_handle(&found[0], &ctx).unwrap(), OpenAction::NoAction);
        assert_eq!(scheme.pre_handle(&found[1], &ctx), PreHandled::Rejected);
        assert_eq!(
            scheme.post_handle(&found[1], &ctx).unwrap(),
            OpenAction::Url {
                url: "https://tracker/{id}/ISSUE".to_string()
            }
        );
    }

    #[test]
    fn optional_line_is_omitted_when_absent() {
        let user = UserSchemes::parse(
            r#"
[[schemes]]
tags = ["loc"]
opener = "editor"
patterns = ['@(?P<file>[\w/.]+)(#(?P<line>\d+))?']

[schemes.action]
file = "{file}"
line = "{line}"
"#,
        )
        .unwrap();
        let scheme = &user.schemes[0];
        let found = matches(scheme, "@src/main.rs");

        assert_eq!(
            scheme.post_handle(&found[0], &RunContext::default()).unwrap(),
            OpenAction::File {
                file: "src/main.rs".to_string(),
                line: None,
            }
        );
    }

    #[test]
    fn rejects_invalid_definitions() {
        let custom_without_action = r#"
[[schemes]]
tags = ["x"]
opener = "custom"
patterns = ["x"]
"#;
        assert!(matches!(
            UserSchemes::parse(custom_without_action),
            Err(SchemeError::MissingPostHandler(_))
        ));

        let unknown_group = r#"
[[schemes]]
tags = ["x"]
opener = "editor"
patterns = ["(?P<a>x)"]
display = { text = "{b}" }
"#;
        assert!(matches!(
            UserSchemes::parse(unknown_group),
            Err(SchemeError::InvalidTemplate { .. })
        ));

        let unknown_key = r#"
[[schemes]]
tags = ["x"]
opener = "editor"
patterns = ["x"]
regex = ["y"]
"#;
        assert!(matches!(
            UserSchemes::parse(unknown_key),
            Err(SchemeError::LoadError(_))
        ));

        let mismatched = r#"
[[schemes]]
tags = ["x"]
opener = "browser"
patterns = ["x"]
action = { file = "{0}" }
"#;
        assert!(matches!(
            UserSchemes::parse(mismatched),
            Err(SchemeError::InvalidScheme { .. })
        ));

        let bad_regex = r#"
[[schemes]]
tags = ["x"]
opener = "editor"
patterns = ["(unclosed"]
"#;
        assert!(matches!(
            UserSchemes::parse(bad_regex),
            Err(SchemeError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn template_parsing() {
        let template = GroupTemplate::parse("{{ {0}-{name} }}").unwrap();
        assert_eq!(template.groups().collect::<Vec<_>>(), vec!["0", "name"]);
        assert!(GroupTemplate::parse("{open").is_err());
        assert!(GroupTemplate::parse("close}").is_err());
        assert!(GroupTemplate::parse("{}").is_err());
    }
}
