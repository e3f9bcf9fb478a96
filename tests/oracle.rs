//! Random patterns checked against the `regex` crate. Repeats only apply to single-character
//! atoms, where each iteration has exactly one way to match and both engines must agree on
//! leftmost-first results.

mod common;

use chainrex::Flags;
use quickcheck::{quickcheck, Arbitrary, Gen};

const ATOMS: &[&str] = &["a", "b", "c", " ", ".", "[ab]", "[^a]", "[^ ]", r"\s", r"\S"];
const QUANTIFIERS: &[&str] = &["", "", "*", "+", "?", "*?", "+?", "??", "{1,2}", "{2}", "{0,}"];

#[derive(Clone, Debug)]
struct Case {
    pattern: String,
    text: String,
}

fn pick<'a>(g: &mut Gen, from: &[&'a str]) -> &'a str {
    g.choose(from).copied().unwrap_or("")
}

fn branch(g: &mut Gen, depth: usize, out: &mut String) {
    let pieces = usize::arbitrary(g) % 4 + 1;
    for _ in 0..pieces {
        if depth > 0 && u8::arbitrary(g) % 5 == 0 {
            out.push_str(pick(g, &["(", "(?:"]));
            alternation(g, depth - 1, out);
            out.push(')');
        } else {
            out.push_str(pick(g, ATOMS));
            out.push_str(pick(g, QUANTIFIERS));
        }
    }
}

fn alternation(g: &mut Gen, depth: usize, out: &mut String) {
    let branches = usize::arbitrary(g) % 3 + 1;
    for i in 0..branches {
        if i > 0 {
            out.push('|');
        }
        branch(g, depth, out);
    }
}

impl Arbitrary for Case {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut pattern = String::new();
        alternation(g, 2, &mut pattern);
        let len = usize::arbitrary(g) % 11 + 1;
        let text = (0..len)
            .map(|_| *g.choose(&['a', 'b', 'c', ' ']).unwrap_or(&'a'))
            .collect();
        Case { pattern, text }
    }
}

fn spans_of(caps: &chainrex::Captures<'_, '_>) -> Vec<Option<(usize, usize)>> {
    caps.iter().map(|m| m.map(|m| (m.start(), m.end()))).collect()
}

fn oracle_spans(caps: &regex::Captures<'_>) -> Vec<Option<(usize, usize)>> {
    caps.iter().map(|m| m.map(|m| (m.start(), m.end()))).collect()
}

#[test]
fn agrees_with_regex_crate() {
    fn prop(case: Case) -> bool {
        let ours = common::regex(&case.pattern);
        let theirs = match regex::Regex::new(&case.pattern) {
            Ok(re) => re,
            Err(_) => return true,
        };
        let expected = theirs
            .captures_iter(&case.text)
            .find(|caps| caps.get(0).map_or(false, |m| m.start() < case.text.len()))
            .map(|caps| oracle_spans(&caps));
        let actual = ours
            .captures(&case.text)
            .ok()
            .and_then(|caps| caps.map(|caps| spans_of(&caps)));
        if expected != actual {
            eprintln!("{:?}: expected {:?}, got {:?}", case, expected, actual);
        }
        expected == actual
    }
    quickcheck(prop as fn(Case) -> bool);
}

#[test]
fn every_match_agrees_with_regex_crate() {
    fn prop(case: Case) -> bool {
        let ours = common::regex(&case.pattern);
        let theirs = match regex::Regex::new(&case.pattern) {
            Ok(re) => re,
            Err(_) => return true,
        };
        // the end of the text is not a start position here
        let expected: Vec<_> = theirs
            .find_iter(&case.text)
            .filter(|m| m.start() < case.text.len())
            .map(|m| m.range())
            .collect();
        let actual: Result<Vec<_>, _> = ours
            .find_iter(&case.text)
            .map(|m| m.map(|m| m.range()))
            .collect();
        actual.map_or(false, |actual| actual == expected)
    }
    quickcheck(prop as fn(Case) -> bool);
}

#[test]
fn match_splits_text() {
    fn prop(case: Case, reverse: bool) -> bool {
        let re = common::regex(&case.pattern);
        let flags = if reverse { Flags::REVERSE } else { Flags::empty() };
        match re.search(&case.text, flags) {
            Ok(Some(caps)) => {
                let rebuilt = format!("{}{}{}", caps.pre(), caps.group(0), caps.post());
                rebuilt == case.text && caps.length(0) == caps.group(0).len()
            }
            Ok(None) => true,
            Err(_) => false,
        }
    }
    quickcheck(prop as fn(Case, bool) -> bool);
}

#[test]
fn whole_match_substitution_is_identity() {
    fn prop(case: Case) -> bool {
        let re = common::regex(&case.pattern);
        re.substitute(&case.text, r"\&", -1)
            .map_or(false, |out| out == case.text)
    }
    quickcheck(prop as fn(Case) -> bool);
}

#[test]
fn reverse_finds_the_last_match_end() {
    fn prop(case: Case) -> bool {
        let re = common::regex(&case.pattern);
        let ends: Vec<usize> = (0..=case.text.len())
            .filter(|&end| {
                re.match_within_range(&case.text, 0..end, Flags::REVERSE)
                    .map_or(false, |caps| caps.is_some())
            })
            .collect();
        match re.search(&case.text, Flags::REVERSE) {
            Ok(Some(caps)) => ends.last() == Some(&caps.get(0).map_or(0, |m| m.end())),
            Ok(None) => ends.is_empty(),
            Err(_) => false,
        }
    }
    quickcheck(prop as fn(Case) -> bool);
}
