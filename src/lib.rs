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

/*!
A backtracking regex engine supporting backreferences, look-around, conditionals and reverse
matching.

A pattern is compiled into a tree of match nodes, and matching walks that tree depth first,
backtracking over alternatives and repeats. This makes features such as backreferences and
look-behind of any length straightforward, but a pattern can take exponential time on some inputs
because of what is called "catastrophic backtracking". The nesting depth of the matcher is
bounded (see [`RegexBuilder::max_depth`]), so such patterns fail with an error rather than
overflowing the stack.

# Usage

Compile a regex, then use it to find matches in text.

## Example: Repeated words

A backreference matches the text a group captured earlier, here ignoring case:

```rust
use chainrex::{Flags, Regex};

let re = Regex::new(r"\b(\w+)\s+\1\b").unwrap();
let caps = re
    .search("it was was late", Flags::CASE_INSENSITIVE)
    .unwrap()
    .expect("a repeated word");

assert_eq!(caps.group(0), "was was");
assert_eq!(caps.offset(0), 3);
assert_eq!(caps.length(0), 7);
```

## Example: Look-behind and named groups

```rust
use chainrex::Regex;

let re = Regex::new(r"(?<=frame\.)(?P<number>\d+)(?=\.exr$)").unwrap();
let caps = re.captures("shot/frame.0042.exr").unwrap().expect("a frame number");
assert_eq!(caps.named_group("number"), "0042");
assert_eq!(caps.pre(), "shot/frame.");
```

## Example: Conditionals

`(?(name)yes|no)` picks a branch depending on whether a group took part in the match:

```rust
use chainrex::Regex;

let re = Regex::new(r"^(?P<open><)?\w+(?(open)>)$").unwrap();
assert!(re.is_match("<tag>").unwrap());
assert!(re.is_match("tag").unwrap());
assert!(!re.is_match("<tag").unwrap());
```

## Example: Searching backwards

With [`Flags::REVERSE`] the candidate positions are tried from the end of the range, and the
pattern is matched right to left, so the last match is found first:

```rust
use chainrex::{Flags, Regex};

let re = Regex::new(r"\d+").unwrap();
let caps = re.search("12 ab 345 cd", Flags::REVERSE).unwrap().unwrap();
assert_eq!(caps.group(0), "345");
```

# Syntax

`.`
: any character except `\n` and `\r` (any character with the `s` flag) \
`^` `$`
: start and end of text, or of a line with the `m` flag \
`[...]` `[^...]`
: character class, with ranges such as `a-z` and the escapes below \
`*` `+` `?` `{n}` `{n,}` `{,m}` `{n,m}`
: repeats; add `?` for the lazy version \
`a|b`
: ordered alternation, the first branch that leads to a match wins

Escapes:

`\w` `\d` `\s` `\h` `\l` `\u`
: word character (ASCII letter or `_`, digits are not included), digit, space, hex digit, letter
  and uppercase letter; the uppercase escapes (`\W`, `\D`, `\S`, `\H`, `\L`) are the inverses,
  except `\U` which is a lowercase letter \
`\b` `\B` `\<` `\>`
: word boundary, not a word boundary, start of word, end of word \
`\A` `\Z` `\z`
: start of text, end of text allowing one trailing newline, end of text \
`\xHH` `\x{H...}` `\uHHHH` `\u{H...}` `\UHHHHHHHH` `\0OOO` `\cX`
: codepoint escapes \
`\n` `\t` `\r` `\f` `\v` `\a`
: control characters

Groups:

`(exp)` `(?:exp)`
: capturing and non-capturing groups \
`(?P<name>exp)` `(?<name>exp)`
: named capture group \
`\1` ... `\9` `(?P=name)`
: backreferences \
`(?=exp)` `(?!exp)` `(?<=exp)` `(?<!exp)`
: look-ahead and look-behind, positive and negative \
`(?(1)yes|no)` `(?(name)yes|no)`
: conditional on whether a group participated in the match \
`(?ims-ims:exp)` `(?ims)`
: flags for a group, or for the rest of the branch; an uppercase letter turns a flag off \
`(?#comment)`
: ignored

Substitution templates use `\N`, `\&`, `` \` ``, `\'` and `\g<name>`, see [`Expander`].
*/

#![doc(html_root_url = "https://docs.rs/chainrex/0.1.0")]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![warn(clippy::pedantic)]
#![allow(clippy::if_not_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_else)]
#![allow(clippy::similar_names)]
#![allow(clippy::struct_excessive_bools)]

use bitflags::bitflags;
use log::{debug, log_enabled, trace, Level};
use std::borrow::Cow;
use std::fmt;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;
use std::ops::{Index, Range};
use std::slice::ChunksExact;
use std::str::FromStr;
use std::sync::Arc;

mod analyze;
mod charclass;
mod compile;
mod error;
mod expand;
mod parse;
mod replacer;
mod utf8util;
mod vm;

use crate::analyze::analyze;
use crate::compile::compile;
use crate::parse::NamedGroups;
use crate::utf8util::next_codepoint_ix;
use crate::vm::{Prog, Session, DEFAULT_MAX_DEPTH};

pub use crate::charclass::ClassKind;
pub use crate::error::{CompileError, Error, ParseError, Result, RuntimeError};
pub use crate::expand::Expander;
pub use crate::parse::{
    Assertion, ClassItem, Expr, ExprTree, GroupKind, LookAround, Switch, Switches,
};
pub use crate::replacer::{NoExpand, Replacer, ReplacerRef};

const MAX_RECURSION: usize = 64;

bitflags! {
    /// Flags controlling a single matching call.
    ///
    /// The flags given to a call are combined with the defaults set on the [`RegexBuilder`], and
    /// groups in the pattern can switch `CASE_INSENSITIVE`, `MULTI_LINE` and
    /// `DOT_MATCHES_NEW_LINE` for their body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Compare ASCII letters without regard to case
        const CASE_INSENSITIVE = 0x1;
        /// Scan from the end of the range and match the pattern right to left. Look-ahead and
        /// look-behind swap directions along with it.
        const REVERSE = 0x8;
        /// `^` and `$` also match at line terminators
        const MULTI_LINE = 0x10;
        /// `.` also matches `\n` and `\r`
        const DOT_MATCHES_NEW_LINE = 0x40;
    }
}

// the public API

/// A compiled regular expression.
///
/// Cloning is cheap: clones share the compiled tree, which is never mutated. [`Regex::set`]
/// replaces the tree of one value and leaves its clones alone.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: String,
    inner: Option<Arc<Inner>>,
    options: RegexOptions,
}

#[derive(Debug)]
struct Inner {
    prog: Prog,
    named_groups: NamedGroups,
    n_groups: usize,
}

impl Inner {
    fn compile(pattern: &str) -> Result<Inner> {
        let tree = Expr::parse_tree(pattern)?;
        let info = analyze(&tree)?;
        let prog = compile(&info, tree.n_groups);
        debug!(
            "compiled {:?}: {} nodes, {} groups",
            pattern,
            prog.nodes.len(),
            tree.n_groups
        );
        if log_enabled!(Level::Trace) {
            trace!("match tree:\n{}", prog);
        }
        Ok(Inner {
            prog,
            named_groups: tree.named_groups,
            n_groups: tree.n_groups,
        })
    }
}

impl Regex {
    /// Parse and compile a regex with default options, see [`RegexBuilder`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    #[inline]
    pub fn new(re: impl Into<String>) -> Result<Regex> {
        RegexBuilder::new().build(re)
    }

    fn new_with_options(pattern: String, options: RegexOptions) -> Result<Regex> {
        let inner = Inner::compile(&pattern)?;
        Ok(Regex {
            pattern,
            inner: Some(Arc::new(inner)),
            options,
        })
    }

    /// Replace the pattern of this regex, keeping its options.
    ///
    /// If the new pattern does not compile, the error is returned and the regex is left invalid:
    /// [`Regex::is_valid`] returns `false` and matching fails with
    /// [`RuntimeError::InvalidRegex`] until a valid pattern is set.
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let mut re = Regex::new("a+").unwrap();
    /// assert!(re.set("(b").is_err());
    /// assert!(!re.is_valid());
    /// re.set("b+").unwrap();
    /// assert!(re.is_match("abba").unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    pub fn set(&mut self, re: impl Into<String>) -> Result<()> {
        self.pattern = re.into();
        self.inner = None;
        let inner = Inner::compile(&self.pattern)?;
        self.inner = Some(Arc::new(inner));
        Ok(())
    }

    /// Whether this regex holds a compiled pattern.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the pattern string this regex was created from.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    fn inner(&self) -> Result<&Inner> {
        self.inner
            .as_deref()
            .ok_or(Error::RuntimeError(RuntimeError::InvalidRegex))
    }

    pub(crate) fn named_groups(&self) -> Option<&NamedGroups> {
        self.inner.as_deref().map(|inner| &inner.named_groups)
    }

    fn run<'r, 't>(
        &'r self,
        text: &'t str,
        range: Range<usize>,
        flags: Flags,
        anchored: bool,
    ) -> Result<Option<Captures<'r, 't>>> {
        let inner = self.inner()?;
        if range.start > range.end || range.end > text.len() {
            return Err(Error::RuntimeError(RuntimeError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: text.len(),
            }));
        }
        let flags = flags | self.options.flags;
        let mut session = Session::new(&inner.prog, text, flags, self.options.max_depth);
        let saves = session.run(range, anchored)?;
        Ok(saves.map(|saves| Captures {
            text,
            saves,
            named_groups: &inner.named_groups,
        }))
    }

    /// Search for the first match in `text`, trying every start position.
    ///
    /// With [`Flags::REVERSE`] the positions are tried from the end of the text, and the match
    /// found is the one that ends last.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] if the regex is invalid or the matcher nests too deep.
    #[inline]
    pub fn search<'r, 't>(&'r self, text: &'t str, flags: Flags) -> Result<Option<Captures<'r, 't>>> {
        self.search_within_range(text, 0..text.len(), flags)
    }

    /// Search for the first match starting in `range` (ending in `range` when searching in
    /// reverse). Forward, `range.end` itself is not a start position; in reverse both ends are
    /// tried as match ends. A range starting at the end of the text never matches.
    ///
    /// The pattern sees the whole text, so look-behind and `^` can look before `range.start`:
    ///
    /// ```rust
    /// # use chainrex::{Flags, Regex};
    /// let re = Regex::new(r"(?<=a)b").unwrap();
    /// let caps = re.search_within_range("abab", 1..4, Flags::empty()).unwrap().unwrap();
    /// assert_eq!(caps.offset(0), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RangeOutOfBounds`] if `range` does not lie within `text`, and
    /// other [`Error::RuntimeError`]s as for [`Regex::search`].
    #[inline]
    pub fn search_within_range<'r, 't>(
        &'r self,
        text: &'t str,
        range: impl Into<Range<usize>>,
        flags: Flags,
    ) -> Result<Option<Captures<'r, 't>>> {
        self.run(text, range.into(), flags, false)
    }

    /// Match the pattern at the start of `text` only (at the end with [`Flags::REVERSE`]).
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] if the regex is invalid or the matcher nests too deep.
    #[inline]
    pub fn match_anchored<'r, 't>(
        &'r self,
        text: &'t str,
        flags: Flags,
    ) -> Result<Option<Captures<'r, 't>>> {
        self.match_within_range(text, 0..text.len(), flags)
    }

    /// Match the pattern at `range.start` only (at `range.end` with [`Flags::REVERSE`]).
    ///
    /// ```rust
    /// # use chainrex::{Flags, Regex};
    /// let re = Regex::new(r"\d+").unwrap();
    /// assert!(re.match_within_range("ab12", 0..4, Flags::empty()).unwrap().is_none());
    /// let caps = re.match_within_range("ab12", 2..4, Flags::empty()).unwrap().unwrap();
    /// assert_eq!(caps.group(0), "12");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RangeOutOfBounds`] if `range` does not lie within `text`, and
    /// other [`Error::RuntimeError`]s as for [`Regex::match_anchored`].
    #[inline]
    pub fn match_within_range<'r, 't>(
        &'r self,
        text: &'t str,
        range: impl Into<Range<usize>>,
        flags: Flags,
    ) -> Result<Option<Captures<'r, 't>>> {
        self.run(text, range.into(), flags, true)
    }

    /// Check if the regex matches the input text.
    ///
    /// # Example
    ///
    /// Test if some text contains the same word twice:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(\w+) \1").unwrap();
    /// assert!(re.is_match("mirror mirror on the wall").unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn is_match(&self, text: &str) -> Result<bool> {
        Ok(self.search(text, Flags::empty())?.is_some())
    }

    /// Returns an iterator for each successive non-overlapping match in `text`.
    ///
    /// If you have capturing groups in your regex that you want to extract, use the [`Regex::captures_iter()`] method.
    ///
    /// # Example
    ///
    /// Find every amount that follows a dollar sign:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(?<=\$)\d+").unwrap();
    /// let mut matches = re.find_iter("$12 then 7 then $40");
    /// assert_eq!(matches.next().unwrap().unwrap().as_str(), "12");
    /// assert_eq!(matches.next().unwrap().unwrap().as_str(), "40");
    /// assert!(matches.next().is_none());
    /// ```
    #[must_use]
    #[inline]
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches {
            re: self,
            text,
            last_end: 0,
            last_match: None,
        }
    }

    /// Find the first match in the input text.
    ///
    /// If you have capturing groups in your regex that you want to extract, use the [`Regex::captures()`] method.
    ///
    /// # Example
    ///
    /// Find the extension of a file name:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(?<=\.)[a-z]+$").unwrap();
    /// assert_eq!(re.find("frame.0042.exr").unwrap().unwrap().as_str(), "exr");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn find<'t>(&self, text: &'t str) -> Result<Option<Match<'t>>> {
        Ok(self.captures(text)?.map(|caps| caps.whole()))
    }

    /// Returns an iterator over all the non-overlapping capture groups matched in `text`.
    ///
    /// # Examples
    ///
    /// Finding all matches and capturing parts of each:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(\d{4})-(\d{2})").unwrap();
    /// let text = "It was between 2018-04 and 2020-01";
    /// let mut all_captures = re.captures_iter(text);
    ///
    /// let first = all_captures.next().unwrap().unwrap();
    /// assert_eq!(first.get(1).unwrap().as_str(), "2018");
    /// assert_eq!(first.get(2).unwrap().as_str(), "04");
    /// assert_eq!(first.get(0).unwrap().as_str(), "2018-04");
    ///
    /// let second = all_captures.next().unwrap().unwrap();
    /// assert_eq!(second.get(1).unwrap().as_str(), "2020");
    /// assert_eq!(second.get(2).unwrap().as_str(), "01");
    /// assert_eq!(second.get(0).unwrap().as_str(), "2020-01");
    ///
    /// assert!(all_captures.next().is_none());
    /// ```
    #[must_use]
    #[inline]
    pub fn captures_iter<'r, 't>(&'r self, text: &'t str) -> CaptureMatches<'r, 't> {
        CaptureMatches(self.find_iter(text))
    }

    /// Returns the capture groups for the first match in `text`.
    ///
    /// If no match is found, then `Ok(None)` is returned.
    ///
    /// # Examples
    ///
    /// Finding matches and capturing parts of the match:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap();
    /// let text = "The date was 2018-04-07";
    /// let captures = re.captures(text).unwrap().unwrap();
    ///
    /// assert_eq!(captures.get(1).unwrap().as_str(), "2018");
    /// assert_eq!(captures.get(2).unwrap().as_str(), "04");
    /// assert_eq!(captures.get(3).unwrap().as_str(), "07");
    /// assert_eq!(captures.get(0).unwrap().as_str(), "2018-04-07");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn captures<'r, 't>(&'r self, text: &'t str) -> Result<Option<Captures<'r, 't>>> {
        self.captures_within_range(text, 0..text.len())
    }

    /// Returns the capture groups for the first match in `text`
    /// starting within the specified `range`.
    /// The `start` and `end` of `range` are treated as byte positions in `text`.
    ///
    /// # Example
    ///
    /// Finding captures within a range:
    ///
    /// ```
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"\<(\w+)\>").unwrap();
    /// let text = "The quick brown fox";
    ///
    /// let captures = re.captures_within_range(text, 1..11).unwrap().unwrap();
    /// let group = captures.get(1).unwrap();
    /// assert_eq!(group.as_str(), "quick");
    /// assert_eq!(group.start(), 4);
    /// assert_eq!(group.end(), 9);
    ///
    /// let captures = re.captures_within_range(text, 5..9).unwrap();
    /// assert!(captures.is_none());
    /// ```
    ///
    /// Note that this is not the same as passing a slice of the string, because word boundaries
    /// and look-around still see the text around the range:
    ///
    /// ```
    /// # use chainrex::Regex;
    /// # let re = Regex::new(r"\<(\w+)\>").unwrap();
    /// # let text = "The quick brown fox";
    /// let captures = re.captures(&text[5..11]).unwrap().unwrap();
    /// assert_eq!(&captures[1], "uick");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn captures_within_range<'r, 't>(
        &'r self,
        text: &'t str,
        range: impl Into<Range<usize>>,
    ) -> Result<Option<Captures<'r, 't>>> {
        self.search_within_range(text, range, Flags::empty())
    }

    /// Returns the number of captures, including the implicit capture of the entire expression.
    ///
    /// An invalid regex has no captures.
    #[must_use]
    #[inline]
    pub fn captures_len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.n_groups + 1)
    }

    /// Returns an iterator over the capture names.
    ///
    /// This method allocate and create a new [`CaptureNames`] every time it is called.
    #[must_use]
    #[inline]
    pub fn capture_names(&self) -> CaptureNames<'_> {
        let mut names = vec![None; self.captures_len()];
        if let Some(named_groups) = self.named_groups() {
            for (name, &i) in named_groups {
                names[i] = Some(name.as_str());
            }
        }
        CaptureNames(names.into_iter())
    }

    // for debugging only
    #[doc(hidden)]
    #[must_use]
    pub fn debug_tree(&self) -> String {
        match self.inner {
            Some(ref inner) => inner.prog.to_string(),
            None => String::new(),
        }
    }

    /// Expand a substitution template for a match of this regex.
    ///
    /// Returns `None` if the template refers to a group that does not exist or did not take part
    /// in the match. See [`Expander`] for the template syntax.
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(\w+)@(\w+)").unwrap();
    /// let caps = re.captures("mail bob@example now").unwrap().unwrap();
    /// assert_eq!(re.substitute_template(&caps, r"\2: \1").as_deref(), Some("example: bob"));
    /// assert_eq!(re.substitute_template(&caps, r"\3"), None);
    /// ```
    #[must_use]
    pub fn substitute_template(&self, caps: &Captures<'_, '_>, template: &str) -> Option<String> {
        Expander.expansion(template, caps)
    }

    /// Replace up to `max_count` matches in `text` with the expansion of `template`.
    ///
    /// A negative `max_count` replaces all matches and zero replaces none. Where the template
    /// cannot be expanded for a match, it is inserted as it is.
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(\d+)").unwrap();
    /// assert_eq!(re.substitute("1 22 333", r"<\1>", 2).unwrap(), "<1> <22> 333");
    /// assert_eq!(re.substitute("1 22 333", r"<\1>", -1).unwrap(), "<1> <22> <333>");
    /// assert_eq!(re.substitute("1 22 333", r"<\1>", 0).unwrap(), "1 22 333");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    pub fn substitute<'t>(
        &self,
        text: &'t str,
        template: &str,
        max_count: isize,
    ) -> Result<Cow<'t, str>> {
        let limit = match usize::try_from(max_count) {
            Ok(0) => return Ok(Cow::Borrowed(text)),
            Ok(n) => NonZeroUsize::new(n),
            Err(_) => None,
        };
        self.replacen(text, limit, template)
    }

    /// Replaces the leftmost-first match with the replacement provided.
    /// The replacement can be a template string (where `\N`, `\g<name>` and the other references
    /// described in [`Expander`] are expanded) or a function that takes the matches'
    /// `Captures` and returns the replaced string.
    ///
    /// If no match is found, then a copy of the string is returned unchanged.
    ///
    /// # Examples
    ///
    /// Note that this function is polymorphic with respect to the replacement.
    /// In typical usage, this can just be a normal string:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new("[^01]+").unwrap();
    /// assert_eq!(re.replace("1078910", "").unwrap(), "1010");
    /// ```
    ///
    /// But anything satisfying the `Replacer` trait will work. For example,
    /// a closure of type `|&Captures| -> String` provides direct access to the
    /// captures corresponding to a match:
    ///
    /// ```rust
    /// # use chainrex::{Regex, Captures};
    /// let re = Regex::new(r"([^,\s]+),\s+(\S+)").unwrap();
    /// let result = re.replace("Springsteen, Bruce", |caps: &Captures| {
    ///     format!("{} {}", &caps[2], &caps[1])
    /// });
    /// assert_eq!(result.unwrap(), "Bruce Springsteen");
    /// ```
    ///
    /// The same with a template and named groups:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// let re = Regex::new(r"(?P<last>[^,\s]+),\s+(?P<first>\S+)").unwrap();
    /// let result = re.replace("Springsteen, Bruce", r"\g<first> \g<last>");
    /// assert_eq!(result.unwrap(), "Bruce Springsteen");
    /// ```
    ///
    /// Finally, sometimes you just want to replace a literal string with no
    /// regard for capturing group expansion. This can be done by wrapping a
    /// string with `NoExpand`:
    ///
    /// ```rust
    /// # use chainrex::Regex;
    /// use chainrex::NoExpand;
    ///
    /// let re = Regex::new(r"(?P<last>[^,\s]+),\s+(\S+)").unwrap();
    /// let result = re.replace("Springsteen, Bruce", NoExpand(r"\2 \g<last>"));
    /// assert_eq!(result.unwrap(), r"\2 \g<last>");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn replace<'t, R: Replacer>(&self, text: &'t str, rep: R) -> Result<Cow<'t, str>> {
        self.replacen(text, NonZeroUsize::new(1), rep)
    }

    /// Replaces all non-overlapping matches in `text` with the replacement
    /// provided. This is the same as calling `replacen` with `limit` set to
    /// `None`.
    ///
    /// See the documentation for `replace` for details on how to access
    /// capturing group matches in the replacement string.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn replace_all<'t, R: Replacer>(&self, text: &'t str, rep: R) -> Result<Cow<'t, str>> {
        self.replacen(text, None, rep)
    }

    /// Replaces at most `limit` non-overlapping matches in `text` with the
    /// replacement provided. If `limit` is `None`, then all non-overlapping matches
    /// are replaced.
    ///
    /// See the documentation for `replace` for details on how to access
    /// capturing group matches in the replacement string.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    pub fn replacen<'t, R: Replacer>(
        &self,
        text: &'t str,
        limit: Option<NonZeroUsize>,
        mut rep: R,
    ) -> Result<Cow<'t, str>> {
        // without expansions only the match positions are needed
        if let Some(rep) = rep.no_expansion() {
            let mut it = self.find_iter(text).enumerate().peekable();
            if it.peek().is_none() {
                return Ok(Cow::Borrowed(text));
            }
            let mut new = String::with_capacity(text.len());
            let mut last_match = 0;
            for (i, m) in it {
                if limit.map_or(false, |limit| i >= limit.get()) {
                    break;
                }
                let m = m?;
                new.push_str(&text[last_match..m.start()]);
                new.push_str(&rep);
                last_match = m.end();
            }
            new.push_str(&text[last_match..]);
            return Ok(Cow::Owned(new));
        }

        let mut it = self.captures_iter(text).enumerate().peekable();
        if it.peek().is_none() {
            return Ok(Cow::Borrowed(text));
        }
        let mut new = String::with_capacity(text.len());
        let mut last_match = 0;
        for (i, cap) in it {
            if limit.map_or(false, |limit| i >= limit.get()) {
                break;
            }
            let cap = cap?;
            let m = cap.whole();
            new.push_str(&text[last_match..m.start()]);
            rep.replace_append(&cap, &mut new);
            last_match = m.end();
        }
        new.push_str(&text[last_match..]);
        Ok(Cow::Owned(new))
    }
}

impl FromStr for Regex {
    type Err = Error;

    /// Attempts to parse a string into a regular expression
    fn from_str(s: &str) -> Result<Regex> {
        Regex::new(s)
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[derive(Copy, Clone, Debug)]
struct RegexOptions {
    flags: Flags,
    max_depth: usize,
}

impl Default for RegexOptions {
    fn default() -> Self {
        RegexOptions {
            flags: Flags::empty(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A builder for a `Regex` to allow configuring options.
#[derive(Debug, Copy, Clone, Default)]
pub struct RegexBuilder(RegexOptions);

impl RegexBuilder {
    /// Create a new regex builder with default options.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [`Regex`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    #[inline]
    pub fn build(&self, pattern: impl Into<String>) -> Result<Regex> {
        Regex::new_with_options(pattern.into(), self.0)
    }

    fn flag(&mut self, flag: Flags, yes: bool) -> &mut Self {
        self.0.flags.set(flag, yes);
        self
    }

    /// Match ASCII letters without regard to case in every call, like `(?i)`.
    #[inline]
    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.flag(Flags::CASE_INSENSITIVE, yes)
    }

    /// Let `^` and `$` match at line terminators in every call, like `(?m)`.
    #[inline]
    pub fn multi_line(&mut self, yes: bool) -> &mut Self {
        self.flag(Flags::MULTI_LINE, yes)
    }

    /// Let `.` match `\n` and `\r` in every call, like `(?s)`.
    #[inline]
    pub fn dot_matches_new_line(&mut self, yes: bool) -> &mut Self {
        self.flag(Flags::DOT_MATCHES_NEW_LINE, yes)
    }

    /// Limit the nesting depth of the matcher. If this limit is exceeded, execution returns an
    /// [`Error::RuntimeError`] with [`RuntimeError::StackOverflow`].
    ///
    /// The depth grows with the structure of the pattern rather than the length of the input:
    /// each node and each group close along the current path counts once. The default fits a
    /// 2 MiB thread stack; raise it only when the matching thread has more room.
    ///
    /// Default is `384`.
    #[inline]
    pub fn max_depth(&mut self, limit: usize) -> &mut Self {
        self.0.max_depth = limit;
        self
    }
}

/// A single match of a regex or group in an input text
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    /// Returns the starting byte offset of the match in the text.
    #[must_use]
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the ending byte offset of the match in the text.
    #[must_use]
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the range over the starting and ending byte offsets of the match in text.
    #[must_use]
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns the matched text.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }

    /// Returns the length, in bytes, of this match.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.range().len()
    }

    /// Returns true if and only if this match has a length of zero.
    ///
    /// Note that an empty match can only occur when the regex itself can match the empty string.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range().is_empty()
    }
}

impl<'t> AsRef<str> for Match<'t> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<'t> From<Match<'t>> for Range<usize> {
    fn from(m: Match<'t>) -> Range<usize> {
        m.range()
    }
}

/// An iterator over all non-overlapping matches for a particular string.
///
/// The iterator yields a `Result<Match>`. The iterator stops when no more
/// matches can be found.
///
/// `'r` is the lifetime of the compiled regular expression and `'t` is the
/// lifetime of the matched string.
#[derive(Debug, Clone)]
pub struct Matches<'r, 't> {
    re: &'r Regex,
    text: &'t str,
    last_end: usize,
    last_match: Option<usize>,
}

impl<'r, 't> Matches<'r, 't> {
    /// Return the text being searched.
    #[must_use]
    #[inline]
    pub fn text(&self) -> &'t str {
        self.text
    }

    /// Return the underlying regex.
    #[must_use]
    #[inline]
    pub fn regex(&self) -> &'r Regex {
        self.re
    }

    fn next_captures(&mut self) -> Option<Result<Captures<'r, 't>>> {
        if self.last_end > self.text.len() {
            return None;
        }

        let captures = match self
            .re
            .captures_within_range(self.text, self.last_end..self.text.len())
        {
            Err(error) => return Some(Err(error)),
            Ok(None) => return None,
            Ok(Some(captures)) => captures,
        };

        let mat = captures.whole();
        if mat.start == mat.end {
            // This is an empty match. To ensure we make progress, start
            // the next search at the smallest possible starting position
            // of the next match following this one.
            self.last_end = if mat.end < self.text.len() {
                next_codepoint_ix(self.text, mat.end)
            } else {
                mat.end + 1
            };
            // Don't accept empty matches immediately following a match.
            // Just move on to the next match.
            if Some(mat.end) == self.last_match {
                return self.next_captures();
            }
        } else {
            self.last_end = mat.end;
        }

        self.last_match = Some(mat.end);

        Some(Ok(captures))
    }
}

impl<'r, 't> Iterator for Matches<'r, 't> {
    type Item = Result<Match<'t>>;

    /// Adapted from the `regex` crate. Searches from the end of the last match repeatedly.
    /// Ignores empty matches immediately after a match.
    fn next(&mut self) -> Option<Self::Item> {
        self.next_captures()
            .map(|captures| captures.map(|caps| caps.whole()))
    }
}

impl<'r, 't> FusedIterator for Matches<'r, 't> {}

/// An iterator that yields all non-overlapping capture groups matching a
/// particular regular expression.
///
/// The iterator yields a `Result<Captures>`. The iterator stops when no
/// more matches can be found.
///
/// `'r` is the lifetime of the compiled regular expression and `'t` is the
/// lifetime of the matched string.
#[derive(Debug, Clone)]
pub struct CaptureMatches<'r, 't>(Matches<'r, 't>);

impl<'r, 't> CaptureMatches<'r, 't> {
    /// Return the text being searched.
    #[must_use]
    #[inline]
    pub fn text(&self) -> &'t str {
        self.0.text
    }

    /// Return the underlying regex.
    #[must_use]
    #[inline]
    pub fn regex(&self) -> &'r Regex {
        self.0.re
    }
}

impl<'r, 't> Iterator for CaptureMatches<'r, 't> {
    type Item = Result<Captures<'r, 't>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_captures()
    }
}

impl<'r, 't> FusedIterator for CaptureMatches<'r, 't> {}

impl<'r, 't> From<Matches<'r, 't>> for CaptureMatches<'r, 't> {
    fn from(value: Matches<'r, 't>) -> Self {
        CaptureMatches(value)
    }
}

impl<'r, 't> From<CaptureMatches<'r, 't>> for Matches<'r, 't> {
    fn from(value: CaptureMatches<'r, 't>) -> Self {
        value.0
    }
}

/// A set of capture groups found for a regex.
///
/// Group 0 is the whole match and is always set.
#[derive(Debug, Clone)]
pub struct Captures<'r, 't> {
    text: &'t str,
    saves: Vec<usize>,
    named_groups: &'r NamedGroups,
}

#[allow(clippy::len_without_is_empty)] // follow regex's API
impl<'r, 't> Captures<'r, 't> {
    /// Get the capture group by its index in the regex.
    ///
    /// If there is no match for that group or the index does not correspond to a group, `None` is
    /// returned. The index 0 returns the whole match.
    #[must_use]
    #[inline]
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let slot = i.saturating_mul(2);
        if slot >= self.saves.len() {
            return None;
        }
        let (lo, hi) = (self.saves[slot], self.saves[slot + 1]);
        if lo == usize::MAX || hi == usize::MAX {
            return None;
        }
        Some(Match {
            text: self.text,
            start: lo,
            end: hi,
        })
    }

    fn whole(&self) -> Match<'t> {
        Match {
            text: self.text,
            start: self.saves[0],
            end: self.saves[1],
        }
    }

    /// Returns the match for a named capture group.  Returns `None` the capture
    /// group did not match or if there is no group with the given name.
    #[must_use]
    #[inline]
    pub fn name(&self, name: &str) -> Option<Match<'t>> {
        self.named_groups.get(name).and_then(|i| self.get(*i))
    }

    /// Whether group `i` took part in the match.
    #[must_use]
    #[inline]
    pub fn has_group(&self, i: usize) -> bool {
        self.get(i).is_some()
    }

    /// Whether the group called `name` exists and took part in the match.
    #[must_use]
    #[inline]
    pub fn has_named_group(&self, name: &str) -> bool {
        self.name(name).is_some()
    }

    /// The text of group `i`, or the empty string if it did not take part in the match.
    #[must_use]
    #[inline]
    pub fn group(&self, i: usize) -> &'t str {
        self.get(i).map_or("", |m| m.as_str())
    }

    /// The text of the group called `name`, or the empty string if it did not take part in the
    /// match.
    #[must_use]
    #[inline]
    pub fn named_group(&self, name: &str) -> &'t str {
        self.name(name).map_or("", |m| m.as_str())
    }

    /// Byte offset in the text where group `i` starts, or 0 if it did not take part in the match.
    #[must_use]
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.get(i).map_or(0, |m| m.start())
    }

    /// Length in bytes of group `i`, or 0 if it did not take part in the match.
    #[must_use]
    #[inline]
    pub fn length(&self, i: usize) -> usize {
        self.get(i).map_or(0, |m| m.len())
    }

    /// The text before the whole match.
    #[must_use]
    #[inline]
    pub fn pre(&self) -> &'t str {
        &self.text[..self.saves[0]]
    }

    /// The text after the whole match.
    #[must_use]
    #[inline]
    pub fn post(&self) -> &'t str {
        &self.text[self.saves[1]..]
    }

    pub(crate) fn named_groups(&self) -> &NamedGroups {
        self.named_groups
    }

    /// Expands the references in `template` (see [`Expander`]) and appends the result to `dst`.
    ///
    /// Returns `false`, leaving `dst` unchanged, if the template refers to a group that does not
    /// exist or did not take part in the match.
    #[inline]
    pub fn expand(&self, template: &str, dst: &mut String) -> bool {
        Expander.append_expansion(dst, template, self)
    }

    /// Expands the references in `template`, or returns `None` if one cannot be resolved.
    #[must_use]
    #[inline]
    pub fn substitute(&self, template: &str) -> Option<String> {
        Expander.expansion(template, self)
    }

    /// Iterate over the captured groups in order in which they appeared in the regex. The first
    /// capture corresponds to the whole match.
    #[must_use]
    #[inline]
    pub fn iter<'c>(&'c self) -> SubCaptureMatches<'c, 't> {
        SubCaptureMatches(self.saves.chunks_exact(2), self.text)
    }

    /// How many groups the regex has. This is always at least 1 because group 0 returns the
    /// whole match.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.saves.len() / 2
    }
}

impl<'r, 't, 'c> IntoIterator for &'c Captures<'r, 't> {
    type IntoIter = SubCaptureMatches<'c, 't>;
    type Item = std::option::Option<Match<'t>>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Get a group by index.
///
/// `'t` is the lifetime of the matched text.
///
/// The text can't outlive the `Captures` object if this method is
/// used, because of how `Index` is defined (normally `a[i]` is part
/// of `a` and can't outlive it); to do that, use `get()` instead.
///
/// # Panics
///
/// If there is no group at the given index.
impl<'r, 't> Index<usize> for Captures<'r, 't> {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        self.get(i)
            .map_or_else(|| panic!("no group at index '{i}'"), |m| m.as_str())
    }
}

/// Get a group by name.
///
/// `'t` is the lifetime of the matched text and `'i` is the lifetime
/// of the group name (the index).
///
/// The text can't outlive the `Captures` object if this method is
/// used, because of how `Index` is defined (normally `a[i]` is part
/// of `a` and can't outlive it); to do that, use `name` instead.
///
/// # Panics
///
/// If there is no group named by the given value.
impl<'r, 't, 'i> Index<&'i str> for Captures<'r, 't> {
    type Output = str;

    fn index<'a>(&'a self, name: &'i str) -> &'a str {
        self.name(name)
            .map_or_else(|| panic!("no group named '{name}'"), |m| m.as_str())
    }
}

/// Iterator for captured groups in order in which they appear in the regex.
#[derive(Debug)]
pub struct SubCaptureMatches<'c, 't>(ChunksExact<'c, usize>, &'t str);

impl<'c, 't> SubCaptureMatches<'c, 't> {
    fn get(&self, span: &[usize]) -> Option<Match<'t>> {
        match *span {
            [start, end] if start != usize::MAX && end != usize::MAX => Some(Match {
                text: self.1,
                start,
                end,
            }),
            _ => None,
        }
    }
}

impl<'c, 't> Iterator for SubCaptureMatches<'c, 't> {
    type Item = Option<Match<'t>>;

    fn next(&mut self) -> Option<Option<Match<'t>>> {
        let span = self.0.next()?;
        Some(self.get(span))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }

    fn count(self) -> usize {
        self.0.count()
    }
}

impl<'c, 't> DoubleEndedIterator for SubCaptureMatches<'c, 't> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let span = self.0.next_back()?;
        Some(self.get(span))
    }
}

impl<'c, 't> ExactSizeIterator for SubCaptureMatches<'c, 't> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'c, 't> FusedIterator for SubCaptureMatches<'c, 't> {}

/// An iterator over capture names in a [`Regex`].  The iterator
/// returns the name of each group, or `None` if the group has
/// no name.  Because capture group 0 cannot have a name, the
/// first item returned is always `None`.
#[derive(Debug, Clone)]
pub struct CaptureNames<'r>(std::vec::IntoIter<Option<&'r str>>);

impl<'r> Iterator for CaptureNames<'r> {
    type Item = Option<&'r str>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }

    fn count(self) -> usize {
        self.0.count()
    }
}

impl<'r> DoubleEndedIterator for CaptureNames<'r> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back()
    }
}

impl<'r> ExactSizeIterator for CaptureNames<'r> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'r> FusedIterator for CaptureNames<'r> {}

#[cfg(test)]
mod tests {
    use crate::{Error, Flags, Regex, RegexBuilder, RuntimeError};
    use matches::assert_matches;

    #[test]
    fn from_str() {
        let s = r"(a+)b\1";
        let regex = s.parse::<Regex>().unwrap();
        assert_eq!(regex.as_str(), s);
        assert_eq!(regex.to_string(), s);
    }

    #[test]
    fn send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Regex>();
    }

    #[test]
    fn failed_set_invalidates() {
        let mut regex = Regex::new("a").unwrap();
        let clone = regex.clone();
        assert!(regex.set("a(").is_err());
        assert!(!regex.is_valid());
        assert_eq!(regex.as_str(), "a(");
        assert_eq!(regex.captures_len(), 0);
        assert_eq!(regex.debug_tree(), "");
        assert_matches!(
            regex.is_match("a"),
            Err(Error::RuntimeError(RuntimeError::InvalidRegex))
        );
        // the clone keeps its own tree
        assert!(clone.is_match("a").unwrap());
    }

    #[test]
    fn range_is_checked() {
        let regex = Regex::new("a").unwrap();
        assert_matches!(
            regex.search_within_range("abc", 2..4, Flags::empty()),
            Err(Error::RuntimeError(RuntimeError::RangeOutOfBounds {
                start: 2,
                end: 4,
                len: 3
            }))
        );
        assert_matches!(
            regex.search_within_range("abc", 3..3, Flags::empty()),
            Ok(None)
        );
    }

    #[test]
    fn builder_flags_apply_to_every_call() {
        let regex = RegexBuilder::new()
            .case_insensitive(true)
            .multi_line(true)
            .build("^b.")
            .unwrap();
        assert_eq!(regex.find("a\nBC").unwrap().unwrap().as_str(), "BC");
        let regex = RegexBuilder::new()
            .dot_matches_new_line(true)
            .build("a.b")
            .unwrap();
        assert!(regex.is_match("a\nb").unwrap());
    }

    #[test]
    fn builder_depth_limit() {
        let regex = RegexBuilder::new().max_depth(3).build("((((a))))").unwrap();
        assert_matches!(
            regex.is_match("a"),
            Err(Error::RuntimeError(RuntimeError::StackOverflow))
        );
    }

    #[test]
    fn capture_names() {
        let regex = Regex::new("(?P<y>a)(b)(?<z>c)").unwrap();
        let names: Vec<_> = regex.capture_names().collect();
        assert_eq!(names, vec![None, Some("y"), None, Some("z")]);
    }

    #[test]
    fn captures_accessors() {
        let regex = Regex::new(r"(?P<word>\w+)(x)?").unwrap();
        let caps = regex.captures("  hello  ").unwrap().unwrap();
        assert_eq!(caps.len(), 3);
        assert!(caps.has_group(1));
        assert!(!caps.has_group(2));
        assert!(!caps.has_group(3));
        assert!(caps.has_named_group("word"));
        assert!(!caps.has_named_group("nope"));
        assert_eq!(caps.group(1), "hello");
        assert_eq!(caps.group(2), "");
        assert_eq!(caps.named_group("word"), "hello");
        assert_eq!(caps.offset(1), 2);
        assert_eq!(caps.length(1), 5);
        assert_eq!(caps.offset(2), 0);
        assert_eq!(caps.length(2), 0);
        assert_eq!(caps.pre(), "  ");
        assert_eq!(caps.post(), "  ");
        assert_eq!(&caps["word"], "hello");
        let groups: Vec<_> = caps.iter().map(|m| m.map(|m| m.as_str())).collect();
        assert_eq!(groups, vec![Some("hello"), Some("hello"), None]);
    }

    #[test]
    fn debug_tree_lists_nodes() {
        let regex = Regex::new("a(b)").unwrap();
        let dump = regex.debug_tree();
        assert!(dump.starts_with("root: "));
        assert_eq!(dump.lines().count(), 4);
    }
}
