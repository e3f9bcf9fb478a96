// Copyright 2016 The Fancy Regex Authors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Expansion of substitution templates.

use crate::parse::NamedGroups;
use crate::{Captures, CompileError, Error, ParseError, Regex, Result, RuntimeError};

/// One piece of a parsed template.
#[derive(Debug, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a str),
    Group(usize),
    Named(&'a str),
    Pre,
    Post,
}

/// Expands substitution templates using the contents of capture groups.
///
/// A template is literal text with these references:
///
/// * `\0` to `\9`: the text of a numbered group (`\0` is the whole match)
/// * `\&`: the whole match
/// * `` \` ``: the text before the match
/// * `\'`: the text after the match
/// * `\g<name>`: the text of a named group; `\g<12>` also refers to groups by number
///
/// Any other backslash is kept as it is. A reference to a group that does not exist or did not
/// participate in the match makes the whole expansion fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expander;

impl Expander {
    /// Check a template against the groups of `regex`, without matching anything.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidBackref`] for a numbered reference past the last group,
    /// [`ParseError::InvalidGroupNameBackref`] for an unknown name and
    /// [`RuntimeError::InvalidRegex`] if `regex` holds no compiled pattern.
    pub fn check(&self, template: &str, regex: &Regex) -> Result<()> {
        let named_groups = regex
            .named_groups()
            .ok_or(Error::RuntimeError(RuntimeError::InvalidRegex))?;
        let n = regex.captures_len();
        for (offset, piece) in pieces(template) {
            match piece {
                Piece::Group(group) if group >= n => {
                    return Err(CompileError::InvalidBackref(group).into());
                }
                Piece::Named(name) => match lookup_name(named_groups, name) {
                    Some(group) if group < n => {}
                    _ => {
                        return Err(Error::ParseError(
                            offset,
                            ParseError::InvalidGroupNameBackref(name.to_string()),
                        ));
                    }
                },
                _ => {}
            }
        }
        Ok(())
    }

    /// Expand `template` with the groups of `caps`, or `None` if a reference cannot be resolved.
    pub fn expansion(&self, template: &str, caps: &Captures<'_, '_>) -> Option<String> {
        let mut dst = String::with_capacity(template.len());
        if self.append_expansion(&mut dst, template, caps) {
            Some(dst)
        } else {
            None
        }
    }

    /// Append the expansion of `template` to `dst`.
    ///
    /// Returns `false`, leaving `dst` as it was, if a reference cannot be resolved.
    pub fn append_expansion(
        &self,
        dst: &mut String,
        template: &str,
        caps: &Captures<'_, '_>,
    ) -> bool {
        let mark = dst.len();
        for (_, piece) in pieces(template) {
            let text = match piece {
                Piece::Text(text) => Some(text),
                Piece::Group(group) => caps.get(group).map(|m| m.as_str()),
                Piece::Named(name) => lookup_name(caps.named_groups(), name)
                    .and_then(|group| caps.get(group))
                    .map(|m| m.as_str()),
                Piece::Pre => Some(caps.pre()),
                Piece::Post => Some(caps.post()),
            };
            match text {
                Some(text) => dst.push_str(text),
                None => {
                    dst.truncate(mark);
                    return false;
                }
            }
        }
        true
    }
}

// a name made of digits refers to a group by number
fn lookup_name(named_groups: &NamedGroups, name: &str) -> Option<usize> {
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
        return name.parse().ok();
    }
    named_groups.get(name).copied()
}

/// Split a template into pieces, each with its byte offset in the template.
fn pieces(template: &str) -> Vec<(usize, Piece<'_>)> {
    let bytes = template.as_bytes();
    let mut result = Vec::new();
    let mut literal_start = 0;
    let mut ix = 0;
    while ix < bytes.len() {
        if bytes[ix] != b'\\' {
            ix += 1;
            continue;
        }
        let (piece, len) = match bytes.get(ix + 1).copied() {
            Some(b) if b.is_ascii_digit() => (Piece::Group(usize::from(b - b'0')), 2),
            Some(b'&') => (Piece::Group(0), 2),
            Some(b'`') => (Piece::Pre, 2),
            Some(b'\'') => (Piece::Post, 2),
            Some(b'g') if bytes.get(ix + 2) == Some(&b'<') => {
                match template[ix + 3..].find('>') {
                    Some(end) if end > 0 => {
                        (Piece::Named(&template[ix + 3..ix + 3 + end]), end + 4)
                    }
                    _ => {
                        ix += 1;
                        continue;
                    }
                }
            }
            _ => {
                ix += 1;
                continue;
            }
        };
        if literal_start < ix {
            result.push((literal_start, Piece::Text(&template[literal_start..ix])));
        }
        result.push((ix, piece));
        ix += len;
        literal_start = ix;
    }
    if literal_start < bytes.len() {
        result.push((literal_start, Piece::Text(&template[literal_start..])));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    fn expand(re: &str, text: &str, template: &str) -> Option<String> {
        let regex = Regex::new(re).unwrap();
        let caps = regex.captures(text).unwrap().unwrap();
        Expander.expansion(template, &caps)
    }

    #[test]
    fn pieces_of_template() {
        assert_eq!(
            pieces("a\\1b\\g<x>\\&"),
            vec![
                (0, Piece::Text("a")),
                (1, Piece::Group(1)),
                (3, Piece::Text("b")),
                (4, Piece::Named("x")),
                (9, Piece::Group(0)),
            ]
        );
        assert_eq!(pieces("\\`\\'"), vec![(0, Piece::Pre), (2, Piece::Post)]);
        assert_eq!(pieces(""), vec![]);
    }

    #[test]
    fn unknown_escapes_stay() {
        assert_eq!(pieces("\\n\\"), vec![(0, Piece::Text("\\n\\"))]);
        assert_eq!(pieces("\\g<>"), vec![(0, Piece::Text("\\g<>"))]);
        assert_eq!(pieces("\\g<x"), vec![(0, Piece::Text("\\g<x"))]);
    }

    #[test]
    fn numbered_groups() {
        assert_eq!(
            expand("(\\w+) (\\w+)", "hello world", "\\2 \\1"),
            Some("world hello".to_string())
        );
        assert_eq!(expand("b", "abc", "[\\&]"), Some("[b]".to_string()));
        assert_eq!(expand("b", "abc", "[\\0]"), Some("[b]".to_string()));
    }

    #[test]
    fn surrounding_text() {
        assert_eq!(expand("b", "abc", "\\'\\&\\`"), Some("cba".to_string()));
    }

    #[test]
    fn named_groups() {
        assert_eq!(
            expand("(?P<y>\\d+)-(?P<m>\\d+)", "2024-05", "\\g<m>/\\g<y>"),
            Some("05/2024".to_string())
        );
        assert_eq!(expand("(a)(b)", "ab", "\\g<2>\\g<1>"), Some("ba".to_string()));
    }

    #[test]
    fn unresolved_references_fail() {
        assert_eq!(expand("(a)|b", "b", "<\\1>"), None);
        assert_eq!(expand("a", "a", "\\3"), None);
        assert_eq!(expand("a", "a", "\\g<nope>"), None);
    }

    #[test]
    fn failed_append_leaves_destination() {
        let regex = Regex::new("a").unwrap();
        let caps = regex.captures("a").unwrap().unwrap();
        let mut dst = "keep".to_string();
        assert!(!Expander.append_expansion(&mut dst, "x\\1y", &caps));
        assert_eq!(dst, "keep");
    }

    #[test]
    fn check_template() {
        let regex = Regex::new("(?P<n>a)(b)").unwrap();
        assert!(Expander.check("\\1\\2\\g<n>\\g<2>\\&", &regex).is_ok());
        assert_matches!(
            Expander.check("\\3", &regex),
            Err(Error::CompileError(CompileError::InvalidBackref(3)))
        );
        assert_matches!(
            Expander.check("ab\\g<m>", &regex),
            Err(Error::ParseError(2, ParseError::InvalidGroupNameBackref(_)))
        );
    }
}
