use crate::error::{Result, SchemeError};

/// A shell-like command line with `%name` placeholders (`%file`, `%line`, `%url`).
///
/// The template is split into words first and placeholders are substituted
/// inside each word afterwards, so substituted values never need quoting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    words: Vec<String>,
}

impl CommandTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let words = shlex::split(source)
            .ok_or_else(|| SchemeError::invalid_template(source, "unbalanced quotes"))?;
        if words.is_empty() {
            return Err(SchemeError::invalid_template(source, "empty command"));
        }
        Ok(Self {
            source: source.to_string(),
            words,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Expand into `argv`. Placeholders without a value are left as written.
    pub fn expand(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.words.iter().map(|word| substitute(word, vars)).collect()
    }
}

/// One left-to-right pass; inserted values are not scanned again.
fn substitute(word: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(word.len());
    let mut rest = word;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let matched = vars
            .iter()
            .filter(|(key, _)| !key.is_empty() && after.starts_with(key))
            .max_by_key(|(key, _)| key.len());
        match matched {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len()..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
