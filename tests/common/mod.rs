#![allow(dead_code)]

use chainrex::{Flags, Regex};

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn regex(re: &str) -> Regex {
    let parse_result = Regex::new(re);
    assert!(
        parse_result.is_ok(),
        "Expected regex '{}' to be compiled successfully, got {:?}",
        re,
        parse_result.err()
    );
    parse_result.unwrap()
}

/// Search with `flags` and return the text of every group, unset groups as `None`.
#[cfg_attr(feature = "track_caller", track_caller)]
pub fn search_groups(re: &str, text: &str, flags: Flags) -> Option<Vec<Option<String>>> {
    let regex = regex(re);
    let result = regex.search(text, flags);
    assert!(
        result.is_ok(),
        "Expected search of '{}' in '{}' to succeed, got {:?}",
        re,
        text,
        result.as_ref().err()
    );
    result.unwrap().map(|caps| {
        caps.iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect()
    })
}

/// Assert that `re` is found in `text` and that its first groups have the expected text.
#[cfg_attr(feature = "track_caller", track_caller)]
pub fn assert_search(re: &str, text: &str, flags: Flags, expected: &[&str]) {
    let groups = search_groups(re, text, flags);
    assert!(
        groups.is_some(),
        "Expected '{}' to be found in '{:?}' with {:?}",
        re,
        text,
        flags
    );
    let groups = groups.unwrap();
    let actual: Vec<&str> = groups
        .iter()
        .take(expected.len())
        .map(|g| g.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(actual, expected, "groups of '{}' in '{:?}'", re, text);
}

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn assert_no_search(re: &str, text: &str, flags: Flags) {
    let groups = search_groups(re, text, flags);
    assert!(
        groups.is_none(),
        "Expected '{}' not to be found in '{:?}', got {:?}",
        re,
        text,
        groups
    );
}
