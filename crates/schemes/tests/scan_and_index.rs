use std::collections::HashSet;
use std::fs;

use fzf_links_schemes::{
    builtin_schemes, scan, CandidateIndex, Colors, RunContext, SchemeRegistry, UserSchemes,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn default_registry() -> SchemeRegistry {
    SchemeRegistry::build(vec![], builtin_schemes().unwrap(), &[]).unwrap()
}

#[test]
fn repeated_file_path_is_listed_once() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("a.txt");
    fs::write(&file, "hello\n").unwrap();
    let path = file.to_str().unwrap();

    let text = format!("cat {path}\nls {path}\n");
    let found = scan(&text, &default_registry(), &RunContext::default());

    let files: Vec<_> = found
        .iter()
        .filter(|c| c.tag() == "file")
        .map(|c| c.raw_text())
        .collect();
    assert_eq!(files, vec![path]);
}

#[test]
fn raw_texts_are_unique_across_schemes() {
    let text = "\
see https://example.com/docs and https://example.com/docs
clone git@github.com:org/repo.git
clone git@github.com:org/repo.git
";
    let found = scan(text, &default_registry(), &RunContext::default());

    let unique: HashSet<_> = found.iter().map(|c| c.raw_text()).collect();
    assert_eq!(unique.len(), found.len());

    let tagged: Vec<_> = found.iter().map(|c| (c.tag(), c.raw_text())).collect();
    assert!(tagged.contains(&("url", "https://example.com/docs")));
    assert!(tagged.contains(&("git", "git@github.com:org/repo")));
}

#[test]
fn user_scheme_takes_priority_and_can_remove_builtins() {
    let user = UserSchemes::parse(
        r#"
rm_default_schemes = ["git"]

[[schemes]]
tags = ["docs"]
opener = "browser"
patterns = ['https://example\.com/\S+']
"#,
    )
    .unwrap();
    let registry =
        SchemeRegistry::build(user.schemes, builtin_schemes().unwrap(), &user.removed).unwrap();

    assert!(registry.scheme_for_tag("git").is_none());
    assert_eq!(registry.position_of_tag("docs"), Some(0));

    let text = "https://example.com/a https://rust-lang.org git@github.com:x/y";
    let found = scan(text, &registry, &RunContext::default());
    let tagged: Vec<_> = found.iter().map(|c| (c.tag(), c.raw_text())).collect();
    assert_eq!(
        tagged,
        vec![
            ("docs", "https://example.com/a"),
            ("url", "https://rust-lang.org"),
        ]
    );
}

#[test]
fn index_lists_bottom_of_buffer_first() {
    let text = "https://one.example.org\nhttps://two.example.org\nhttps://three.example.org\n";
    let found = scan(text, &default_registry(), &RunContext::default());
    let index = CandidateIndex::new(found);

    let offsets: Vec<_> = index.iter().map(|(_, c)| c.start_offset()).collect();
    assert!(offsets.windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(
        index.get(1).map(|c| c.raw_text()),
        Some("https://three.example.org")
    );

    let lines = index.render(&Colors::default());
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "   1 - [url] - https://three.example.org");
}

#[test]
fn empty_text_has_no_candidates() {
    let found = scan("", &default_registry(), &RunContext::default());
    assert!(CandidateIndex::new(found).is_empty());
}
