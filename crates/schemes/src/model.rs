use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fancy_regex::Regex;
use serde::Deserialize;

use crate::context::RunContext;
use crate::error::{Result, SchemeError};

/// What a scheme does with a selected match.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OpenerKind {
    Editor,
    Browser,
    /// The post-handler supplies the full command line.
    #[serde(alias = "custom_open")]
    Custom,
    SystemOpen,
    Reveal,
}

impl OpenerKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            OpenerKind::Editor => "editor",
            OpenerKind::Browser => "browser",
            OpenerKind::Custom => "custom",
            OpenerKind::SystemOpen => "system_open",
            OpenerKind::Reveal => "reveal",
        }
    }
}

impl fmt::Display for OpenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled text pattern together with its capture-group names.
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: Regex,
    names: Arc<HashMap<String, usize>>,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|err| SchemeError::InvalidPattern {
            pattern: source.to_string(),
            source: Box::new(err),
        })?;
        let names = regex
            .capture_names()
            .enumerate()
            .filter_map(|(idx, name)| name.map(|name| (name.to_string(), idx)))
            .collect();
        Ok(Self {
            regex,
            names: Arc::new(names),
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Number of groups, including the implicit whole-match group 0.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len()
    }

    pub fn has_group(&self, key: &str) -> bool {
        match key.parse::<usize>() {
            Ok(idx) => idx < self.group_count(),
            Err(_) => self.names.contains_key(key),
        }
    }

    /// All non-overlapping, non-empty matches in `text`, in text order.
    pub fn find_all(&self, text: &str) -> Vec<RawMatch> {
        let mut matches = Vec::new();
        for caps in self.regex.captures_iter(text) {
            let caps = match caps {
                Ok(caps) => caps,
                Err(err) => {
                    log::warn!("pattern {:?} aborted: {err}", self.as_str());
                    break;
                }
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.as_str().is_empty() {
                continue;
            }
            let groups = (0..caps.len())
                .map(|idx| caps.get(idx).map(|m| m.as_str().to_string()))
                .collect();
            matches.push(RawMatch {
                start: whole.start(),
                groups,
                names: Arc::clone(&self.names),
            });
        }
        matches
    }
}

/// A single regex match, kept with all of its capture groups so that the
/// post-handler later sees the original match rather than display text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMatch {
    start: usize,
    groups: Vec<Option<String>>,
    names: Arc<HashMap<String, usize>>,
}

impl RawMatch {
    /// Build a match by hand; `groups[0]` is the whole match.
    pub fn new(start: usize, groups: Vec<Option<String>>, names: HashMap<String, usize>) -> Self {
        Self {
            start,
            groups,
            names: Arc::new(names),
        }
    }

    /// The exact matched substring.
    pub fn as_str(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    /// Byte offset of the match in the scanned text.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.groups.get(idx).and_then(|g| g.as_deref())
    }

    pub fn name(&self, name: &str) -> Option<&str> {
        self.names.get(name).and_then(|&idx| self.get(idx))
    }

    /// Look a group up by number (`"2"`) or by name (`"link"`).
    pub fn group(&self, key: &str) -> Option<&str> {
        match key.parse::<usize>() {
            Ok(idx) => self.get(idx),
            Err(_) => self.name(key),
        }
    }
}

/// Display line content produced by a pre-handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayCandidate {
    pub display_text: String,
    pub tag: String,
}

/// Outcome of a pre-handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreHandled {
    Accepted(DisplayCandidate),
    Rejected,
}

/// Outcome of a post-handler: what to open once the user picked a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenAction {
    File {
        file: String,
        line: Option<String>,
    },
    Url {
        url: String,
    },
    Custom {
        cmd: String,
        args: Vec<String>,
        file: Option<String>,
    },
    NoAction,
}

impl OpenAction {
    /// The file backing this action, if there is one.
    pub fn file(&self) -> Option<&str> {
        match self {
            OpenAction::File { file, .. } => Some(file),
            OpenAction::Custom { file, .. } => file.as_deref(),
            OpenAction::Url { .. } | OpenAction::NoAction => None,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            OpenAction::File { .. } => "file",
            OpenAction::Url { .. } => "url",
            OpenAction::Custom { .. } => "custom",
            OpenAction::NoAction => "none",
        }
    }
}

pub type PreHandler = Box<dyn Fn(&RawMatch, &RunContext) -> PreHandled>;
pub type PostHandler = Box<dyn Fn(&RawMatch, &RunContext) -> OpenAction>;

/// A named link detector.
pub struct Scheme {
    tags: Vec<String>,
    opener: OpenerKind,
    patterns: Vec<Pattern>,
    pre_handler: Option<PreHandler>,
    post_handler: Option<PostHandler>,
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme")
            .field("tags", &self.tags)
            .field("opener", &self.opener)
            .field(
                "patterns",
                &self.patterns.iter().map(Pattern::as_str).collect::<Vec<_>>(),
            )
            .field("pre_handler", &self.pre_handler.is_some())
            .field("post_handler", &self.post_handler.is_some())
            .finish()
    }
}

impl Scheme {
    /// Tags must be non-empty and unique; at least one pattern is required.
    pub fn new<T: Into<String>>(
        tags: impl IntoIterator<Item = T>,
        opener: OpenerKind,
        patterns: Vec<Pattern>,
    ) -> Result<Self> {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        if tags.is_empty() {
            return Err(SchemeError::invalid_scheme(&tags, "at least one tag is required"));
        }
        if let Some(empty) = tags.iter().find(|tag| tag.trim().is_empty()) {
            return Err(SchemeError::invalid_scheme(
                &tags,
                format!("tag {empty:?} is blank"),
            ));
        }
        for (idx, tag) in tags.iter().enumerate() {
            if tags[..idx].contains(tag) {
                return Err(SchemeError::invalid_scheme(
                    &tags,
                    format!("tag {tag:?} is declared twice"),
                ));
            }
        }
        if patterns.is_empty() {
            return Err(SchemeError::invalid_scheme(&tags, "at least one pattern is required"));
        }
        Ok(Self {
            tags,
            opener,
            patterns,
            pre_handler: None,
            post_handler: None,
        })
    }

    pub fn with_pre_handler(
        mut self,
        handler: impl Fn(&RawMatch, &RunContext) -> PreHandled + 'static,
    ) -> Self {
        self.pre_handler = Some(Box::new(handler));
        self
    }

    pub fn with_post_handler(
        mut self,
        handler: impl Fn(&RawMatch, &RunContext) -> OpenAction + 'static,
    ) -> Self {
        self.post_handler = Some(Box::new(handler));
        self
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Fallback display tag.
    pub fn first_tag(&self) -> &str {
        &self.tags[0]
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn opener(&self) -> OpenerKind {
        self.opener
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn has_post_handler(&self) -> bool {
        self.post_handler.is_some()
    }

    /// Run the pre-handler, or accept the whole match under the first tag.
    pub fn pre_handle(&self, raw: &RawMatch, ctx: &RunContext) -> PreHandled {
        match &self.pre_handler {
            Some(handler) => handler(raw, ctx),
            None => PreHandled::Accepted(DisplayCandidate {
                display_text: raw.as_str().to_string(),
                tag: self.first_tag().to_string(),
            }),
        }
    }

    /// Run the post-handler, or map the whole match by opener kind.
    pub fn post_handle(&self, raw: &RawMatch, ctx: &RunContext) -> Result<OpenAction> {
        if let Some(handler) = &self.post_handler {
            return Ok(handler(raw, ctx));
        }
        match self.opener {
            OpenerKind::Editor => Ok(OpenAction::File {
                file: raw.as_str().to_string(),
                line: None,
            }),
            OpenerKind::Browser => Ok(OpenAction::Url {
                url: raw.as_str().to_string(),
            }),
            OpenerKind::SystemOpen | OpenerKind::Reveal => Ok(OpenAction::File {
                file: raw.as_str().to_string(),
                line: None,
            }),
            OpenerKind::Custom => Err(SchemeError::MissingPostHandler(self.tags.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn find_all_keeps_named_groups() {
        let pattern = Pattern::new(r"(?P<key>\w+)=(?P<value>\d+)?").unwrap();
        let matches = pattern.find_all("a=1 b= c=3");

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].as_str(), "a=1");
        assert_eq!(matches[0].name("value"), Some("1"));
        assert_eq!(matches[1].name("key"), Some("b"));
        assert_eq!(matches[1].name("value"), None);
        assert_eq!(matches[2].start(), 7);
        assert_eq!(matches[2].group("2"), Some("3"));
    }

    #[test]
    fn find_all_supports_lookbehind() {
        let pattern = Pattern::new(r"(?<!://)\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap();
        let matches = pattern.find_all("http://10.0.0.1 and 192.168.1.1");

        let found: Vec<_> = matches.iter().map(RawMatch::as_str).collect();
        assert_eq!(found, vec!["192.168.1.1"]);
    }

    #[test]
    fn scheme_rejects_duplicate_tags() {
        let pattern = Pattern::new("x").unwrap();
        let err = Scheme::new(["a", "a"], OpenerKind::Editor, vec![pattern]).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn default_post_handler_follows_opener() {
        let ctx = RunContext::default();
        let raw = Pattern::new("https://x.io").unwrap().find_all("https://x.io")[0].clone();

        let browser =
            Scheme::new(["url"], OpenerKind::Browser, vec![Pattern::new("x").unwrap()]).unwrap();
        assert_eq!(
            browser.post_handle(&raw, &ctx).unwrap(),
            OpenAction::Url {
                url: "https://x.io".to_string()
            }
        );

        let custom =
            Scheme::new(["c"], OpenerKind::Custom, vec![Pattern::new("x").unwrap()]).unwrap();
        assert!(matches!(
            custom.post_handle(&raw, &ctx),
            Err(SchemeError::MissingPostHandler(_))
        ));
    }
}
