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

//! A regex parser yielding an AST.
//!
//! The grammar is parsed by recursive descent. Each `parse_*` method takes the byte index where
//! its construct starts and returns the index just past it together with the parsed [`Expr`].

use compact_str::CompactString;
use std::collections::HashMap;
use std::str::FromStr;

use crate::charclass::{is_special_byte, ClassKind};
use crate::utf8util::codepoint_len;
use crate::Error;
use crate::Flags;
use crate::ParseError;
use crate::Result;
use crate::MAX_RECURSION;

/// Mapping from group name to group index.
pub(crate) type NamedGroups = HashMap<String, usize>;

/// Regular expression AST. This is public for now but may change.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expr {
    /// An empty expression, e.g. the last branch in `(a|)`
    Empty,
    /// Any character, `.`
    Any,
    /// A run of literal text
    Literal(CompactString),
    /// A predefined class such as `\w`, possibly inverted
    Class {
        /// Which class
        kind: ClassKind,
        /// Whether the class is inverted (`\W`)
        invert: bool,
    },
    /// A bracket class `[...]`
    Bracket {
        /// The alternatives of the class, tried in order
        items: Vec<ClassItem>,
        /// Whether the class is negated (`[^...]`)
        invert: bool,
    },
    /// An assertion
    Assertion(Assertion),
    /// Concatenation of multiple expressions, must match in order, e.g. `a.` is a concatenation of
    /// the literal `a` and `.` for any character
    Concat(Vec<Expr>),
    /// Alternative of multiple expressions, one of them must match, e.g. `a|b` is an alternative
    /// where either the literal `a` or `b` must match
    Alt(Vec<Expr>),
    /// A group, which may capture, look around or only scope flags
    Group {
        /// The body of the group
        child: Box<Expr>,
        /// What kind of group this is
        kind: GroupKind,
        /// Flag changes applied to the body
        switches: Switches,
    },
    /// Repeat of an expression, e.g. `a*` or `a+` or `a{1,3}`
    Repeat {
        /// The expression that is being repeated
        child: Box<Expr>,
        /// The minimum number of repetitions
        lo: usize,
        /// The maximum number of repetitions (or `usize::MAX`)
        hi: usize,
        /// Greedy means as much as possible is matched, e.g. `.*b` would match all of `abab`.
        /// Non-greedy means as little as possible, e.g. `.*?b` would match only `ab` in `abab`.
        greedy: bool,
    },
    /// Back reference to a capture group, e.g. `\1` in `(abc|def)\1` references the captured group
    /// and the whole regex matches either `abcabc` or `defdef`.
    Backref(usize),
    /// Conditional on whether a capture group participated in the match so far
    Conditional {
        /// The group being tested
        group: usize,
        /// What to match if the group is set
        yes: Box<Expr>,
        /// What to match otherwise; [`Expr::Empty`] when absent
        no: Box<Expr>,
    },
}

/// The kind of a parenthesized group.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum GroupKind {
    /// Capturing group with its index (starting at 1) and optional name
    Capture {
        /// Group index
        index: usize,
        /// Group name given with `(?P<name>...)`
        name: Option<String>,
    },
    /// Non-capturing group, `(?:...)` or a flag group
    NonCapture,
    /// Look-around, `(?=...)` and friends
    LookAround(LookAround),
}

/// Type of look-around assertion as used for a look-around expression.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LookAround {
    /// Look-ahead assertion, e.g. `(?=a)`
    LookAhead,
    /// Negative look-ahead assertion, e.g. `(?!a)`
    LookAheadNeg,
    /// Look-behind assertion, e.g. `(?<=a)`
    LookBehind,
    /// Negative look-behind assertion, e.g. `(?<!a)`
    LookBehindNeg,
}

impl LookAround {
    /// Whether the body is matched right to left.
    pub(crate) fn is_behind(self) -> bool {
        matches!(self, LookAround::LookBehind | LookAround::LookBehindNeg)
    }

    /// Whether the look-around succeeds when its body fails.
    pub(crate) fn is_negative(self) -> bool {
        matches!(self, LookAround::LookAheadNeg | LookAround::LookBehindNeg)
    }
}

/// Type of assertions
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Assertion {
    /// `^`: start of text, or of a line in multi-line mode
    StartLine,
    /// `$`: end of text, or of a line in multi-line mode
    EndLine,
    /// `\A`: start of text
    StartText,
    /// `\Z`: end of text, allowing one trailing line terminator
    EndTextOptionalNewline,
    /// `\z`: absolute end of text
    EndText,
    /// `\<`: start of a word
    WordStart,
    /// `\>`: end of a word
    WordEnd,
    /// `\b`: word boundary
    WordBoundary,
    /// `\B`: not a word boundary
    NotWordBoundary,
}

/// One alternative inside a bracket class.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ClassItem {
    /// A single character
    Char(char),
    /// An inclusive range of characters, e.g. `a-z`
    Range(char, char),
    /// A predefined class with its inversion bit, e.g. `\d` or `\S`
    Class(ClassKind, bool),
}

/// Three-valued flag setting of a group.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Switch {
    /// Keep the value of the enclosing scope
    #[default]
    Inherit,
    /// Turn the flag on
    On,
    /// Turn the flag off
    Off,
}

impl Switch {
    fn apply(self, flags: Flags, flag: Flags) -> Flags {
        match self {
            Switch::Inherit => flags,
            Switch::On => flags | flag,
            Switch::Off => flags - flag,
        }
    }
}

/// Flag changes of a group: `i`, `m` and `s`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Switches {
    /// `i`
    pub case_insensitive: Switch,
    /// `m`
    pub multi_line: Switch,
    /// `s`
    pub dot_matches_new_line: Switch,
}

impl Switches {
    /// Combine these switches with the flags of the enclosing scope.
    #[must_use]
    pub fn apply(self, flags: Flags) -> Flags {
        let flags = self.case_insensitive.apply(flags, Flags::CASE_INSENSITIVE);
        let flags = self.multi_line.apply(flags, Flags::MULTI_LINE);
        self.dot_matches_new_line
            .apply(flags, Flags::DOT_MATCHES_NEW_LINE)
    }

    pub(crate) fn is_inherit(self) -> bool {
        self == Switches::default()
    }
}

/// Result of parsing a regex pattern string.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExprTree {
    /// The root expression
    pub expr: Expr,
    /// Mapping from group name to group index
    pub named_groups: HashMap<String, usize>,
    /// Number of capture groups, not counting the whole match
    pub n_groups: usize,
}

impl Expr {
    /// Parse the regex and return an expression (AST) together with its group table.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::ParseError`] with the byte position of the offending construct.
    pub fn parse_tree(re: &str) -> Result<ExprTree> {
        Parser::parse(re)
    }

    pub(crate) fn is_repeatable(&self) -> bool {
        !matches!(self, Expr::Empty)
    }
}

struct Parser<'a> {
    re: &'a str,
    named_groups: NamedGroups,
    curr_group: usize,
}

impl<'a> Parser<'a> {
    fn parse(re: &str) -> Result<ExprTree> {
        let mut p = Parser {
            re,
            named_groups: NamedGroups::new(),
            curr_group: 0,
        };
        let (ix, expr) = p.parse_re(0, 0)?;
        if ix < re.len() {
            // the top-level expression only stops early at a stray `)`
            return Err(Error::ParseError(ix, ParseError::UnmatchedCloseParen));
        }
        Ok(ExprTree {
            expr,
            named_groups: p.named_groups,
            n_groups: p.curr_group,
        })
    }

    fn byte(&self, ix: usize) -> Option<u8> {
        self.re.as_bytes().get(ix).copied()
    }

    fn parse_re(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let (ix, child) = self.parse_branch(ix, depth)?;
        let mut ix = ix;
        if self.byte(ix) != Some(b'|') {
            return Ok((ix, child));
        }
        let mut children = vec![child];
        while self.byte(ix) == Some(b'|') {
            let (next, child) = self.parse_branch(ix + 1, depth)?;
            children.push(child);
            ix = next;
        }
        Ok((ix, Expr::Alt(children)))
    }

    fn parse_branch(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        if depth >= MAX_RECURSION {
            return Err(Error::ParseError(ix, ParseError::RecursionExceeded));
        }
        let mut children = Vec::new();
        let mut ix = ix;
        while let Some(b) = self.byte(ix) {
            if b == b'|' || b == b')' {
                break;
            }
            if self.re[ix..].starts_with("(?#") {
                ix = self.skip_comment(ix)?;
                continue;
            }
            if self.is_flag_group(ix) {
                let (next, switches, terminator) = self.parse_flags(ix)?;
                if terminator == b')' {
                    // a bare toggle holds for the rest of the branch, which ends with its group
                    let (next, rest) = self.parse_branch(next, depth + 1)?;
                    children.push(Expr::Group {
                        child: Box::new(rest),
                        kind: GroupKind::NonCapture,
                        switches,
                    });
                    ix = next;
                    break;
                }
            }
            let (next, child) = self.parse_piece(ix, depth)?;
            children.push(child);
            ix = next;
        }
        let expr = match children.len() {
            0 => Expr::Empty,
            1 => children.pop().unwrap_or(Expr::Empty),
            _ => Expr::Concat(children),
        };
        Ok((ix, expr))
    }

    fn skip_comment(&self, ix: usize) -> Result<usize> {
        match self.re[ix..].find(')') {
            Some(off) => Ok(ix + off + 1),
            None => Err(Error::ParseError(ix, ParseError::UnclosedOpenParen)),
        }
    }

    fn parse_piece(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let (ix, child) = self.parse_atom(ix, depth)?;
        let (lo, hi, next) = match self.byte(ix) {
            Some(b'*') => (0, usize::MAX, ix + 1),
            Some(b'+') => (1, usize::MAX, ix + 1),
            Some(b'?') => (0, 1, ix + 1),
            Some(b'{') => self.parse_repeat_counts(ix)?,
            _ => return Ok((ix, child)),
        };
        if !child.is_repeatable() {
            return Err(Error::ParseError(ix, ParseError::TargetNotRepeatable));
        }
        let (next, greedy) = if self.byte(next) == Some(b'?') {
            (next + 1, false)
        } else {
            (next, true)
        };
        Ok((
            next,
            Expr::Repeat {
                child: Box::new(child),
                lo,
                hi,
                greedy,
            },
        ))
    }

    // `{m}`, `{m,}`, `{m,n}`, `{,n}` and `{}`; returns (lo, hi, index after `}`)
    fn parse_repeat_counts(&self, ix: usize) -> Result<(usize, usize, usize)> {
        let err = || Error::ParseError(ix, ParseError::InvalidRepeat);
        let close = self.re[ix..].find('}').ok_or_else(err)? + ix;
        let body = &self.re[ix + 1..close];
        let parse_count = |s: &str, default: usize| -> Result<usize> {
            if s.is_empty() {
                Ok(default)
            } else if s.bytes().all(|b| b.is_ascii_digit()) {
                usize::from_str(s).map_err(|_| err())
            } else {
                Err(err())
            }
        };
        let (lo, hi) = match body.find(',') {
            Some(comma) => (
                parse_count(&body[..comma], 0)?,
                parse_count(&body[comma + 1..], usize::MAX)?,
            ),
            None if body.is_empty() => (0, usize::MAX),
            None => {
                let n = parse_count(body, 0)?;
                (n, n)
            }
        };
        if lo > hi || hi == 0 {
            return Err(err());
        }
        Ok((lo, hi, close + 1))
    }

    fn parse_atom(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let b = match self.byte(ix) {
            Some(b) => b,
            None => return Ok((ix, Expr::Empty)),
        };
        match b {
            b'.' => Ok((ix + 1, Expr::Any)),
            b'^' => Ok((ix + 1, Expr::Assertion(Assertion::StartLine))),
            b'$' => Ok((ix + 1, Expr::Assertion(Assertion::EndLine))),
            b'(' => self.parse_paren(ix, depth),
            b'[' => self.parse_class(ix),
            b'\\' => self.parse_escape(ix),
            b'*' | b'+' | b'?' | b'{' => {
                Err(Error::ParseError(ix, ParseError::TargetNotRepeatable))
            }
            b']' | b'}' => Err(Error::ParseError(ix, ParseError::UnmatchedBracket)),
            b')' => Err(Error::ParseError(ix, ParseError::UnmatchedCloseParen)),
            _ => Ok(self.parse_literal_run(ix)),
        }
    }

    fn parse_literal_run(&self, ix: usize) -> (usize, Expr) {
        let mut end = ix;
        let mut last = ix;
        while let Some(b) = self.byte(end) {
            if b == b'\\' || is_special_byte(b) {
                break;
            }
            last = end;
            end += codepoint_len(b);
        }
        // leave the last character for a following repeat operator
        if last > ix && matches!(self.byte(end), Some(b'*' | b'+' | b'?' | b'{')) {
            end = last;
        }
        (end, Expr::Literal(CompactString::new(&self.re[ix..end])))
    }

    fn parse_escape(&mut self, ix: usize) -> Result<(usize, Expr)> {
        let b = self
            .byte(ix + 1)
            .ok_or(Error::ParseError(ix, ParseError::TrailingBackslash))?;
        let end = ix + 2;
        if let Some((end, c)) = self.parse_unicode_escape(ix)? {
            return Ok((end, make_char(c)));
        }
        if let Some((kind, invert)) = ClassKind::from_escape(b) {
            return Ok((end, Expr::Class { kind, invert }));
        }
        let assertion = match b {
            b'b' => Some(Assertion::WordBoundary),
            b'B' => Some(Assertion::NotWordBoundary),
            b'<' => Some(Assertion::WordStart),
            b'>' => Some(Assertion::WordEnd),
            b'A' => Some(Assertion::StartText),
            b'Z' => Some(Assertion::EndTextOptionalNewline),
            b'z' => Some(Assertion::EndText),
            _ => None,
        };
        if let Some(assertion) = assertion {
            return Ok((end, Expr::Assertion(assertion)));
        }
        if (b'1'..=b'9').contains(&b) {
            return Ok((end, Expr::Backref(usize::from(b - b'0'))));
        }
        let (end, c) = self.parse_char_escape(ix, false)?;
        Ok((end, make_char(c)))
    }

    // `\uXXXX`, `\u{X...}` and `\UXXXXXXXX`; `None` when the escape is a class instead
    fn parse_unicode_escape(&self, ix: usize) -> Result<Option<(usize, char)>> {
        let start = ix + 2;
        match self.byte(ix + 1) {
            Some(b'u') if self.byte(start) == Some(b'{') => {
                self.parse_braced_codepoint(start).map(Some)
            }
            Some(b'u') => Ok(self.parse_fixed_hex(start, 4)),
            Some(b'U') => Ok(self.parse_fixed_hex(start, 8)),
            _ => Ok(None),
        }
    }

    fn parse_fixed_hex(&self, ix: usize, digits: usize) -> Option<(usize, char)> {
        let s = self.re.get(ix..ix + digits)?;
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let cp = u32::from_str_radix(s, 16).ok()?;
        char::from_u32(cp).map(|c| (ix + digits, c))
    }

    // `{X...}` starting at the brace
    fn parse_braced_codepoint(&self, ix: usize) -> Result<(usize, char)> {
        let close = self.re[ix..]
            .find('}')
            .ok_or(Error::ParseError(ix, ParseError::InvalidHex))?
            + ix;
        let hex = &self.re[ix + 1..close];
        if hex.is_empty() || hex.len() > 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::ParseError(ix, ParseError::InvalidHex));
        }
        let cp = u32::from_str_radix(hex, 16)
            .map_err(|_| Error::ParseError(ix, ParseError::InvalidHex))?;
        let c = char::from_u32(cp)
            .ok_or(Error::ParseError(ix, ParseError::InvalidCodepointValue))?;
        Ok((close + 1, c))
    }

    // Escapes that denote a single character. `ix` points at the backslash.
    fn parse_char_escape(&self, ix: usize, in_class: bool) -> Result<(usize, char)> {
        let b = self
            .byte(ix + 1)
            .ok_or(Error::ParseError(ix, ParseError::TrailingBackslash))?;
        let end = ix + 2;
        let c = match b {
            b't' => '\t',
            b'n' => '\n',
            b'r' => '\r',
            b'f' => '\x0c',
            b'v' => '\x0b',
            b'a' => '\x07',
            b'b' if in_class => '\x08',
            b'c' => {
                return match self.byte(end) {
                    Some(c @ b'@'..=b'_') => Ok((end + 1, char::from(c - b'@'))),
                    _ => Err(Error::ParseError(
                        ix,
                        ParseError::InvalidEscape("\\c".to_string()),
                    )),
                };
            }
            b'x' => return self.parse_hex_escape(end),
            b'0' => return Ok(self.parse_octal(end, 3, 0)),
            b'1'..=b'7' if in_class => return Ok(self.parse_octal(ix + 1, 3, 0)),
            _ if b.is_ascii_punctuation() => char::from(b),
            _ => {
                let c = self.re[ix + 1..].chars().next().unwrap_or('\\');
                return Err(Error::ParseError(
                    ix,
                    ParseError::InvalidEscape(format!("\\{}", c)),
                ));
            }
        };
        Ok((end, c))
    }

    // after `\x`: `{X...}` or one or two hex digits
    fn parse_hex_escape(&self, ix: usize) -> Result<(usize, char)> {
        if self.byte(ix) == Some(b'{') {
            return self.parse_braced_codepoint(ix);
        }
        let digits = self.re.as_bytes()[ix..]
            .iter()
            .take(2)
            .take_while(|b| b.is_ascii_hexdigit())
            .count();
        if digits == 0 {
            return Err(Error::ParseError(ix, ParseError::InvalidHex));
        }
        let cp = u32::from_str_radix(&self.re[ix..ix + digits], 16)
            .map_err(|_| Error::ParseError(ix, ParseError::InvalidHex))?;
        let c = char::from_u32(cp)
            .ok_or(Error::ParseError(ix, ParseError::InvalidCodepointValue))?;
        Ok((ix + digits, c))
    }

    // up to `max` octal digits starting at `ix`, accumulated onto `value`
    fn parse_octal(&self, ix: usize, max: usize, value: u32) -> (usize, char) {
        let mut ix = ix;
        let mut value = value;
        for _ in 0..max {
            match self.byte(ix) {
                Some(b @ b'0'..=b'7') => {
                    value = value * 8 + u32::from(b - b'0');
                    ix += 1;
                }
                _ => break,
            }
        }
        // at most three octal digits, so always a valid scalar value
        (ix, char::from_u32(value).unwrap_or('\0'))
    }

    fn parse_class(&mut self, ix: usize) -> Result<(usize, Expr)> {
        let start = ix;
        let mut ix = ix + 1;
        let mut invert = false;
        if self.byte(ix) == Some(b'^') {
            invert = true;
            ix += 1;
        }
        let mut items = Vec::new();
        if let Some(b @ (b']' | b'-')) = self.byte(ix) {
            items.push(ClassItem::Char(char::from(b)));
            ix += 1;
        }
        loop {
            match self.byte(ix) {
                None => return Err(Error::ParseError(start, ParseError::UnclosedBracket)),
                Some(b']') => {
                    ix += 1;
                    break;
                }
                Some(_) => {}
            }
            let (next, item) = self.parse_class_atom(ix)?;
            ix = next;
            if let ClassItem::Char(lo) = item {
                if self.byte(ix) == Some(b'-') && !matches!(self.byte(ix + 1), None | Some(b']')) {
                    let (next, hi) = self.parse_class_atom(ix + 1)?;
                    let hi = match hi {
                        ClassItem::Char(hi) if lo <= hi => hi,
                        _ => return Err(Error::ParseError(ix, ParseError::InvalidClass)),
                    };
                    items.push(ClassItem::Range(lo, hi));
                    ix = next;
                    continue;
                }
            }
            items.push(item);
        }
        Ok((ix, Expr::Bracket { items, invert }))
    }

    fn parse_class_atom(&self, ix: usize) -> Result<(usize, ClassItem)> {
        if self.byte(ix) != Some(b'\\') {
            let c = self.re[ix..]
                .chars()
                .next()
                .ok_or(Error::ParseError(ix, ParseError::UnclosedBracket))?;
            return Ok((ix + c.len_utf8(), ClassItem::Char(c)));
        }
        let b = self
            .byte(ix + 1)
            .ok_or(Error::ParseError(ix, ParseError::TrailingBackslash))?;
        if let Some((end, c)) = self.parse_unicode_escape(ix)? {
            return Ok((end, ClassItem::Char(c)));
        }
        if let Some((kind, invert)) = ClassKind::from_escape(b) {
            return Ok((ix + 2, ClassItem::Class(kind, invert)));
        }
        let (end, c) = self.parse_char_escape(ix, true)?;
        Ok((end, ClassItem::Char(c)))
    }

    fn is_flag_group(&self, ix: usize) -> bool {
        self.re[ix..].starts_with("(?")
            && matches!(
                self.byte(ix + 2),
                Some(b'i' | b'm' | b's' | b'I' | b'M' | b'S' | b'-')
            )
    }

    // `(?` flags [`-` flags] followed by `:` or `)`; returns the index after the terminator
    fn parse_flags(&self, ix: usize) -> Result<(usize, Switches, u8)> {
        let mut switches = Switches::default();
        let mut negate = false;
        let mut seen = false;
        let mut i = ix + 2;
        loop {
            let b = self
                .byte(i)
                .ok_or(Error::ParseError(ix, ParseError::UnclosedOpenParen))?;
            let on = if negate { Switch::Off } else { Switch::On };
            match b {
                b':' | b')' if seen => return Ok((i + 1, switches, b)),
                b'-' if !negate => negate = true,
                b'i' => switches.case_insensitive = on,
                b'm' => switches.multi_line = on,
                b's' => switches.dot_matches_new_line = on,
                b'I' => switches.case_insensitive = Switch::Off,
                b'M' => switches.multi_line = Switch::Off,
                b'S' => switches.dot_matches_new_line = Switch::Off,
                _ => {
                    let c = self.re[i..].chars().next().unwrap_or('?');
                    return Err(Error::ParseError(i, ParseError::UnknownFlag(c.to_string())));
                }
            }
            seen |= b != b'-';
            i += 1;
        }
    }

    fn parse_paren(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let re = self.re;
        let rest = &re[ix + 1..];
        let (body, kind, switches) = if !rest.starts_with('?') {
            self.curr_group += 1;
            let kind = GroupKind::Capture {
                index: self.curr_group,
                name: None,
            };
            (ix + 1, kind, Switches::default())
        } else if rest.starts_with("?:") {
            (ix + 3, GroupKind::NonCapture, Switches::default())
        } else if rest.starts_with("?=") {
            (ix + 3, GroupKind::LookAround(LookAround::LookAhead), Switches::default())
        } else if rest.starts_with("?!") {
            (ix + 3, GroupKind::LookAround(LookAround::LookAheadNeg), Switches::default())
        } else if rest.starts_with("?<=") {
            (ix + 4, GroupKind::LookAround(LookAround::LookBehind), Switches::default())
        } else if rest.starts_with("?<!") {
            (ix + 4, GroupKind::LookAround(LookAround::LookBehindNeg), Switches::default())
        } else if rest.starts_with("?P<") || rest.starts_with("?<") {
            let name_start = ix + if rest.starts_with("?P<") { 4 } else { 3 };
            let (body, name) = self.parse_group_name(name_start, b'>')?;
            if self.named_groups.contains_key(name) {
                return Err(Error::ParseError(
                    name_start,
                    ParseError::DuplicateGroupName(name.to_string()),
                ));
            }
            self.curr_group += 1;
            self.named_groups.insert(name.to_string(), self.curr_group);
            let kind = GroupKind::Capture {
                index: self.curr_group,
                name: Some(name.to_string()),
            };
            (body, kind, Switches::default())
        } else if rest.starts_with("?P=") {
            let name_start = ix + 4;
            let (end, name) = self.parse_group_name(name_start, b')')?;
            let group = self.resolve_name(name_start, name)?;
            return Ok((end, Expr::Backref(group)));
        } else if rest.starts_with("?(") {
            return self.parse_conditional(ix, depth);
        } else if self.is_flag_group(ix) {
            let (body, switches, terminator) = self.parse_flags(ix)?;
            if terminator == b')' {
                return Ok((body, Expr::Empty));
            }
            (body, GroupKind::NonCapture, switches)
        } else {
            let modifier = rest[1..].chars().next().map_or_else(String::new, String::from);
            return Err(Error::ParseError(
                ix,
                ParseError::UnknownGroupModifier(modifier),
            ));
        };
        let (end, child) = self.parse_re(body, depth + 1)?;
        if self.byte(end) != Some(b')') {
            return Err(Error::ParseError(ix, ParseError::UnclosedOpenParen));
        }
        Ok((
            end + 1,
            Expr::Group {
                child: Box::new(child),
                kind,
                switches,
            },
        ))
    }

    // a group name terminated by `terminator`; returns the index after the terminator
    fn parse_group_name(&self, ix: usize, terminator: u8) -> Result<(usize, &'a str)> {
        let re: &'a str = self.re;
        let len = re[ix..]
            .find(char::from(terminator))
            .ok_or(Error::ParseError(ix, ParseError::InvalidGroupName))?;
        let name = &re[ix..ix + len];
        let valid = name
            .chars()
            .next()
            .map_or(false, |c| c == '_' || c.is_alphabetic())
            && name.chars().all(|c| c == '_' || c.is_alphanumeric());
        if !valid {
            return Err(Error::ParseError(ix, ParseError::InvalidGroupName));
        }
        Ok((ix + len + 1, name))
    }

    fn resolve_name(&self, ix: usize, name: &str) -> Result<usize> {
        self.named_groups.get(name).copied().ok_or_else(|| {
            Error::ParseError(ix, ParseError::InvalidGroupNameBackref(name.to_string()))
        })
    }

    // `(?(cond)yes|no)`
    fn parse_conditional(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let cond_start = ix + 3;
        let close = self.re[cond_start..]
            .find(')')
            .ok_or(Error::ParseError(ix, ParseError::UnclosedOpenParen))?
            + cond_start;
        let cond = &self.re[cond_start..close];
        let group = if cond.is_empty() {
            return Err(Error::ParseError(cond_start, ParseError::InvalidConditional));
        } else if cond.bytes().all(|b| b.is_ascii_digit()) {
            usize::from_str(cond)
                .map_err(|_| Error::ParseError(cond_start, ParseError::InvalidConditional))?
        } else {
            self.resolve_name(cond_start, cond)?
        };
        let (end, body) = self.parse_re(close + 1, depth + 1)?;
        if self.byte(end) != Some(b')') {
            return Err(Error::ParseError(ix, ParseError::UnclosedOpenParen));
        }
        let (yes, no) = match body {
            Expr::Alt(mut branches) => {
                if branches.len() > 2 {
                    return Err(Error::ParseError(ix, ParseError::InvalidConditional));
                }
                let no = branches.pop().unwrap_or(Expr::Empty);
                let yes = branches.pop().unwrap_or(Expr::Empty);
                (yes, no)
            }
            body => (body, Expr::Empty),
        };
        Ok((
            end + 1,
            Expr::Conditional {
                group,
                yes: Box::new(yes),
                no: Box::new(no),
            },
        ))
    }
}

fn make_char(c: char) -> Expr {
    let mut buf = [0; 4];
    Expr::Literal(CompactString::new(c.encode_utf8(&mut buf)))
}

#[cfg(test)]
pub(crate) fn make_literal(s: &str) -> Expr {
    Expr::Literal(CompactString::new(s))
}

#[cfg(test)]
mod tests {
    use matches::assert_matches;

    use super::*;
    use crate::charclass::ClassKind;

    fn p(s: &str) -> Expr {
        Expr::parse_tree(s).unwrap().expr
    }

    #[cfg_attr(feature = "track_caller", track_caller)]
    fn fail(s: &str) -> ParseError {
        match Expr::parse_tree(s) {
            Err(Error::ParseError(_, e)) => e,
            other => panic!("expected parse error for {:?}, got {:?}", s, other),
        }
    }

    fn group(child: Expr, index: usize) -> Expr {
        Expr::Group {
            child: Box::new(child),
            kind: GroupKind::Capture { index, name: None },
            switches: Switches::default(),
        }
    }

    fn repeat(child: Expr, lo: usize, hi: usize, greedy: bool) -> Expr {
        Expr::Repeat {
            child: Box::new(child),
            lo,
            hi,
            greedy,
        }
    }

    #[test]
    fn empty() {
        assert_eq!(p(""), Expr::Empty);
    }

    #[test]
    fn literal_run() {
        assert_eq!(p("hello"), make_literal("hello"));
        assert_eq!(p("明日は"), make_literal("明日は"));
    }

    #[test]
    fn literal_run_backs_up_before_repeat() {
        assert_eq!(
            p("aaa*"),
            Expr::Concat(vec![
                make_literal("aa"),
                repeat(make_literal("a"), 0, usize::MAX, true)
            ])
        );
        assert_eq!(
            p("日本?"),
            Expr::Concat(vec![make_literal("日"), repeat(make_literal("本"), 0, 1, true)])
        );
    }

    #[test]
    fn any_and_anchors() {
        assert_eq!(
            p("^.$"),
            Expr::Concat(vec![
                Expr::Assertion(Assertion::StartLine),
                Expr::Any,
                Expr::Assertion(Assertion::EndLine),
            ])
        );
    }

    #[test]
    fn alt() {
        assert_eq!(
            p("a|b|"),
            Expr::Alt(vec![make_literal("a"), make_literal("b"), Expr::Empty])
        );
    }

    #[test]
    fn repeats() {
        assert_eq!(p("a*"), repeat(make_literal("a"), 0, usize::MAX, true));
        assert_eq!(p("a+?"), repeat(make_literal("a"), 1, usize::MAX, false));
        assert_eq!(p("a??"), repeat(make_literal("a"), 0, 1, false));
        assert_eq!(p("a{3}"), repeat(make_literal("a"), 3, 3, true));
        assert_eq!(p("a{2,}"), repeat(make_literal("a"), 2, usize::MAX, true));
        assert_eq!(p("a{2,5}?"), repeat(make_literal("a"), 2, 5, false));
        assert_eq!(p("a{,3}"), repeat(make_literal("a"), 0, 3, true));
        assert_eq!(p("a{}"), repeat(make_literal("a"), 0, usize::MAX, true));
    }

    #[test]
    fn invalid_repeats() {
        assert_eq!(fail("a{0}"), ParseError::InvalidRepeat);
        assert_eq!(fail("a{0,0}"), ParseError::InvalidRepeat);
        assert_eq!(fail("a{,0}"), ParseError::InvalidRepeat);
        assert_eq!(fail("a{3,2}"), ParseError::InvalidRepeat);
        assert_eq!(fail("a{x}"), ParseError::InvalidRepeat);
        assert_eq!(fail("a{2"), ParseError::InvalidRepeat);
        assert_eq!(fail("a{99999999999999999999999}"), ParseError::InvalidRepeat);
        assert_eq!(fail("*a"), ParseError::TargetNotRepeatable);
        assert_eq!(fail("a**"), ParseError::TargetNotRepeatable);
        assert_eq!(fail("(?i)*"), ParseError::TargetNotRepeatable);
    }

    #[test]
    fn classes() {
        assert_eq!(
            p(r"\w\S"),
            Expr::Concat(vec![
                Expr::Class {
                    kind: ClassKind::Word,
                    invert: false
                },
                Expr::Class {
                    kind: ClassKind::Space,
                    invert: true
                },
            ])
        );
        assert_eq!(
            p(r"\U"),
            Expr::Class {
                kind: ClassKind::Lower,
                invert: false
            }
        );
    }

    #[test]
    fn assertions() {
        assert_eq!(p(r"\<"), Expr::Assertion(Assertion::WordStart));
        assert_eq!(p(r"\>"), Expr::Assertion(Assertion::WordEnd));
        assert_eq!(p(r"\Z"), Expr::Assertion(Assertion::EndTextOptionalNewline));
        assert_eq!(p(r"\z"), Expr::Assertion(Assertion::EndText));
        assert_eq!(p(r"\B"), Expr::Assertion(Assertion::NotWordBoundary));
    }

    #[test]
    fn char_escapes() {
        assert_eq!(p(r"\t"), make_literal("\t"));
        assert_eq!(p(r"\x41"), make_literal("A"));
        assert_eq!(p(r"\x7"), make_literal("\x07"));
        assert_eq!(p(r"\x{65E5}"), make_literal("日"));
        assert_eq!(p(r"\0101"), make_literal("A"));
        assert_eq!(p(r"\0"), make_literal("\0"));
        assert_eq!(p(r"\cJ"), make_literal("\n"));
        assert_eq!(p(r"\."), make_literal("."));
        assert_eq!(p(r"\-"), make_literal("-"));
    }

    #[test]
    fn unicode_escapes() {
        assert_eq!(p(r"明"), make_literal("明"));
        assert_eq!(p(r"\u{5F8C}"), make_literal("後"));
        assert_eq!(p(r"\U0000304C"), make_literal("が"));
        // not enough digits: a class followed by literal text
        assert_eq!(
            p(r"\u66"),
            Expr::Concat(vec![
                Expr::Class {
                    kind: ClassKind::Upper,
                    invert: false
                },
                make_literal("66"),
            ])
        );
        assert_eq!(fail(r"\u{D800}"), ParseError::InvalidCodepointValue);
        assert_eq!(fail(r"\u{}"), ParseError::InvalidHex);
    }

    #[test]
    fn invalid_escapes() {
        assert_eq!(fail("\\"), ParseError::TrailingBackslash);
        assert_eq!(fail(r"\q"), ParseError::InvalidEscape("\\q".to_string()));
        assert_eq!(fail(r"\xg"), ParseError::InvalidHex);
        assert_matches!(fail(r"\c1"), ParseError::InvalidEscape(_));
    }

    #[test]
    fn backrefs() {
        assert_eq!(
            p(r"(a)\1"),
            Expr::Concat(vec![group(make_literal("a"), 1), Expr::Backref(1)])
        );
    }

    #[test]
    fn brackets() {
        assert_eq!(
            p("[a-z_]"),
            Expr::Bracket {
                items: vec![ClassItem::Range('a', 'z'), ClassItem::Char('_')],
                invert: false
            }
        );
        assert_eq!(
            p("[^]-0-9]"),
            Expr::Bracket {
                items: vec![ClassItem::Char(']'), ClassItem::Char('-'), ClassItem::Range('0', '9')],
                invert: true
            }
        );
        assert_eq!(
            p("[a-]"),
            Expr::Bracket {
                items: vec![ClassItem::Char('a'), ClassItem::Char('-')],
                invert: false
            }
        );
        assert_eq!(
            p(r"[\d\b\101]"),
            Expr::Bracket {
                items: vec![
                    ClassItem::Class(ClassKind::Digit, false),
                    ClassItem::Char('\x08'),
                    ClassItem::Char('A')
                ],
                invert: false
            }
        );
        assert_eq!(
            p("[あ-ん]"),
            Expr::Bracket {
                items: vec![ClassItem::Range('あ', 'ん')],
                invert: false
            }
        );
    }

    #[test]
    fn invalid_brackets() {
        assert_eq!(fail("[ab"), ParseError::UnclosedBracket);
        assert_eq!(fail("[]"), ParseError::UnclosedBracket);
        assert_eq!(fail("[z-a]"), ParseError::InvalidClass);
        assert_eq!(fail(r"[a-\d]"), ParseError::InvalidClass);
        assert_eq!(fail("a]"), ParseError::UnmatchedBracket);
        assert_eq!(fail("a}"), ParseError::UnmatchedBracket);
    }

    #[test]
    fn groups() {
        assert_eq!(
            p("(a)(?:b)"),
            Expr::Concat(vec![
                group(make_literal("a"), 1),
                Expr::Group {
                    child: Box::new(make_literal("b")),
                    kind: GroupKind::NonCapture,
                    switches: Switches::default(),
                },
            ])
        );
        assert_eq!(fail("(a"), ParseError::UnclosedOpenParen);
        assert_eq!(fail("a)"), ParseError::UnmatchedCloseParen);
        assert_eq!(fail("(?x)"), ParseError::UnknownGroupModifier("x".to_string()));
    }

    #[test]
    fn lookarounds() {
        let tree = p("(?<!a)(?=b)");
        match tree {
            Expr::Concat(v) => {
                assert_matches!(
                    v[0],
                    Expr::Group {
                        kind: GroupKind::LookAround(LookAround::LookBehindNeg),
                        ..
                    }
                );
                assert_matches!(
                    v[1],
                    Expr::Group {
                        kind: GroupKind::LookAround(LookAround::LookAhead),
                        ..
                    }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn named_groups() {
        let tree = Expr::parse_tree(r"(?P<first>a)(?<second>b)(?P=first)").unwrap();
        assert_eq!(tree.named_groups.get("first"), Some(&1));
        assert_eq!(tree.named_groups.get("second"), Some(&2));
        assert_eq!(tree.n_groups, 2);
        match tree.expr {
            Expr::Concat(v) => assert_eq!(v[2], Expr::Backref(1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn invalid_named_groups() {
        assert_eq!(fail("(?P<>a)"), ParseError::InvalidGroupName);
        assert_eq!(fail("(?P<1a>a)"), ParseError::InvalidGroupName);
        assert_eq!(
            fail("(?P<a>x)(?P<a>y)"),
            ParseError::DuplicateGroupName("a".to_string())
        );
        assert_eq!(
            fail("(?P=nope)(?P<nope>a)"),
            ParseError::InvalidGroupNameBackref("nope".to_string())
        );
    }

    #[test]
    fn comment_is_spliced_out() {
        assert_eq!(p("a(?#comment)b"), Expr::Concat(vec![make_literal("a"), make_literal("b")]));
        assert_eq!(fail("(?#open"), ParseError::UnclosedOpenParen);
    }

    #[test]
    fn scoped_flags() {
        let switches = Switches {
            case_insensitive: Switch::On,
            multi_line: Switch::Off,
            ..Switches::default()
        };
        assert_eq!(
            p("(?i-m:a)"),
            Expr::Group {
                child: Box::new(make_literal("a")),
                kind: GroupKind::NonCapture,
                switches,
            }
        );
        assert_eq!(fail("(?iq)"), ParseError::UnknownFlag("q".to_string()));
    }

    #[test]
    fn trailing_flags_scope_rest_of_branch() {
        let switches = Switches {
            case_insensitive: Switch::On,
            ..Switches::default()
        };
        assert_eq!(
            p("a(?i)bc|d"),
            Expr::Alt(vec![
                Expr::Concat(vec![
                    make_literal("a"),
                    Expr::Group {
                        child: Box::new(make_literal("bc")),
                        kind: GroupKind::NonCapture,
                        switches,
                    },
                ]),
                make_literal("d"),
            ])
        );
    }

    #[test]
    fn uppercase_flag_turns_off() {
        match p("(?I:a)") {
            Expr::Group { switches, .. } => assert_eq!(switches.case_insensitive, Switch::Off),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn conditionals() {
        assert_eq!(
            p("(a)?(?(1)b|c)"),
            Expr::Concat(vec![
                repeat(group(make_literal("a"), 1), 0, 1, true),
                Expr::Conditional {
                    group: 1,
                    yes: Box::new(make_literal("b")),
                    no: Box::new(make_literal("c")),
                },
            ])
        );
        match p("(?P<w>%)(?(w)x)") {
            Expr::Concat(v) => assert_eq!(
                v[1],
                Expr::Conditional {
                    group: 1,
                    yes: Box::new(make_literal("x")),
                    no: Box::new(Expr::Empty),
                }
            ),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(fail("(?(1)a|b|c)"), ParseError::InvalidConditional);
        assert_eq!(fail("(?()a)"), ParseError::InvalidConditional);
        assert_matches!(fail("(?(zz)a)"), ParseError::InvalidGroupNameBackref(_));
    }

    #[test]
    fn recursion_limit() {
        let deep = "(".repeat(200) + &")".repeat(200);
        assert_eq!(fail(&deep), ParseError::RecursionExceeded);
    }
}
