use std::collections::{HashMap, HashSet};

use crate::error::{Result, SchemeError};
use crate::model::{OpenerKind, Scheme};

/// Final, ordered scheme list plus the tag → scheme lookup table.
#[derive(Debug, Default)]
pub struct SchemeRegistry {
    schemes: Vec<Scheme>,
    by_tag: HashMap<String, usize>,
}

impl SchemeRegistry {
    /// Merge `user` schemes ahead of `builtins`.
    ///
    /// A scheme is admitted only when none of its tags was claimed by an
    /// earlier admitted scheme and none appears in `removed`; otherwise it is
    /// dropped as a whole.
    pub fn build(user: Vec<Scheme>, builtins: Vec<Scheme>, removed: &[String]) -> Result<Self> {
        let removed: HashSet<&str> = removed.iter().map(String::as_str).collect();
        let mut schemes = Vec::new();
        let mut by_tag = HashMap::new();

        for scheme in user.into_iter().chain(builtins) {
            if let Some(tag) = scheme
                .tags()
                .iter()
                .find(|tag| by_tag.contains_key(*tag) || removed.contains(tag.as_str()))
            {
                log::debug!("scheme {:?} skipped: tag {tag:?} is taken or removed", scheme.tags());
                continue;
            }
            if scheme.opener() == OpenerKind::Custom && !scheme.has_post_handler() {
                return Err(SchemeError::MissingPostHandler(scheme.tags().to_vec()));
            }

            let idx = schemes.len();
            for tag in scheme.tags() {
                by_tag.insert(tag.clone(), idx);
            }
            schemes.push(scheme);
        }

        log::debug!("{} schemes admitted", schemes.len());
        Ok(Self { schemes, by_tag })
    }

    /// Schemes in scan priority order.
    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    pub fn scheme_for_tag(&self, tag: &str) -> Option<&Scheme> {
        self.by_tag.get(tag).map(|&idx| &self.schemes[idx])
    }

    /// Position of the scheme owning `tag`, in registry order.
    pub fn position_of_tag(&self, tag: &str) -> Option<usize> {
        self.by_tag.get(tag).copied()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OpenAction, Pattern};
    use pretty_assertions::assert_eq;

    fn scheme(tags: &[&str]) -> Scheme {
        Scheme::new(
            tags.iter().copied(),
            OpenerKind::Editor,
            vec![Pattern::new("x").unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn later_scheme_sharing_a_tag_is_excluded_entirely() {
        let registry = SchemeRegistry::build(
            vec![scheme(&["x", "y"])],
            vec![scheme(&["y", "z"]), scheme(&["w"])],
            &[],
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.position_of_tag("x"), Some(0));
        assert_eq!(registry.position_of_tag("y"), Some(0));
        assert_eq!(registry.position_of_tag("z"), None);
        assert_eq!(registry.position_of_tag("w"), Some(1));
    }

    #[test]
    fn removed_tags_drop_matching_schemes() {
        let registry = SchemeRegistry::build(
            vec![],
            vec![scheme(&["url"]), scheme(&["file", "dir"])],
            &["dir".to_string()],
        )
        .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.scheme_for_tag("file").is_none());
        assert!(registry.scheme_for_tag("url").is_some());
    }

    #[test]
    fn custom_opener_without_post_handler_is_fatal() {
        let custom = Scheme::new(["ip"], OpenerKind::Custom, vec![Pattern::new("x").unwrap()])
            .unwrap();
        let err = SchemeRegistry::build(vec![custom], vec![], &[]).unwrap_err();
        assert!(matches!(err, SchemeError::MissingPostHandler(_)));

        let fixed = Scheme::new(["ip"], OpenerKind::Custom, vec![Pattern::new("x").unwrap()])
            .unwrap()
            .with_post_handler(|_, _| OpenAction::NoAction);
        assert!(SchemeRegistry::build(vec![fixed], vec![], &[]).is_ok());
    }
}
