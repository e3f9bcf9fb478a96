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

use std::fmt;

/// Result type for this crate with specific error enum.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Byte offset into the pattern where a parse error was detected.
pub type ParseErrorPosition = usize;

/// An error as the result of parsing, compiling or running a regex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An error as a result of parsing a regex pattern, with the position where the error occurred
    ParseError(ParseErrorPosition, ParseError),
    /// An error as a result of compiling a regex
    CompileError(CompileError),
    /// An error as a result of running a regex
    RuntimeError(RuntimeError),
}

/// An error for the result of parsing a regex pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// Opening parenthesis without closing parenthesis, e.g. `(a|b`
    UnclosedOpenParen,
    /// Closing parenthesis without a matching opening one, e.g. `a)b`
    UnmatchedCloseParen,
    /// Opening bracket of a class without a closing bracket, e.g. `[ab`
    UnclosedBracket,
    /// Closing bracket or brace outside of a class or repeat, e.g. `a]`
    UnmatchedBracket,
    /// Invalid repeat syntax or counts
    InvalidRepeat,
    /// Repetition with nothing to repeat, e.g. `*a`
    TargetNotRepeatable,
    /// Pattern too deeply nested
    RecursionExceeded,
    /// Backslash without a following character
    TrailingBackslash,
    /// Invalid escape
    InvalidEscape(String),
    /// Invalid hex escape
    InvalidHex,
    /// Invalid codepoint for hex or unicode escape
    InvalidCodepointValue,
    /// Invalid character class
    InvalidClass,
    /// Unknown flag letter in a flag group
    UnknownFlag(String),
    /// Unknown modifier after `(?`
    UnknownGroupModifier(String),
    /// Invalid or empty group name
    InvalidGroupName,
    /// Group name used twice
    DuplicateGroupName(String),
    /// Backreference or condition naming a group that does not exist
    InvalidGroupNameBackref(String),
    /// Malformed conditional, e.g. more than two branches
    InvalidConditional,
}

/// An error as the result of compiling a regex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// Backreference or condition to a group that is not defined before it
    InvalidBackref(usize),
}

/// An error as the result of executing a regex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuntimeError {
    /// The regex holds no compiled pattern, e.g. after a failed [`Regex::set`](crate::Regex::set)
    InvalidRegex,
    /// The search range does not fit into the text
    RangeOutOfBounds {
        /// Start of the requested range
        start: usize,
        /// End of the requested range
        end: usize,
        /// Length of the text
        len: usize,
    },
    /// The matcher nested deeper than the configured limit, see
    /// [`RegexBuilder::max_depth`](crate::RegexBuilder::max_depth)
    StackOverflow,
}

impl ::std::error::Error for Error {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnclosedOpenParen => write!(f, "Opening parenthesis without closing parenthesis"),
            ParseError::UnmatchedCloseParen => write!(f, "Closing parenthesis without opening parenthesis"),
            ParseError::UnclosedBracket => write!(f, "Character class without closing bracket"),
            ParseError::UnmatchedBracket => write!(f, "Closing bracket or brace without opening one"),
            ParseError::InvalidRepeat => write!(f, "Invalid repeat syntax"),
            ParseError::TargetNotRepeatable => write!(f, "Target of repeat operator is invalid"),
            ParseError::RecursionExceeded => write!(f, "Pattern too deeply nested"),
            ParseError::TrailingBackslash => write!(f, "Backslash without following character"),
            ParseError::InvalidEscape(s) => write!(f, "Invalid escape: {}", s),
            ParseError::InvalidHex => write!(f, "Invalid hex escape"),
            ParseError::InvalidCodepointValue => write!(f, "Invalid codepoint for hex or unicode escape"),
            ParseError::InvalidClass => write!(f, "Invalid character class"),
            ParseError::UnknownFlag(s) => write!(f, "Unknown group flag: {}", s),
            ParseError::UnknownGroupModifier(s) => write!(f, "Unknown group modifier: {}", s),
            ParseError::InvalidGroupName => write!(f, "Could not parse group name"),
            ParseError::DuplicateGroupName(s) => write!(f, "Duplicate group name: {}", s),
            ParseError::InvalidGroupNameBackref(s) => write!(f, "Invalid group name in back reference: {}", s),
            ParseError::InvalidConditional => write!(f, "Conditional must have at most two branches"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidBackref(group) => {
                write!(f, "Invalid back reference to group {}", group)
            }
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::InvalidRegex => write!(f, "Regex holds no compiled pattern"),
            RuntimeError::RangeOutOfBounds { start, end, len } => write!(
                f,
                "Range {}..{} out of bounds for text of length {}",
                start, end, len
            ),
            RuntimeError::StackOverflow => write!(f, "Max stack size exceeded for backtracking"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ParseError(position, parse_error) => {
                write!(f, "Parsing error at position {}: {}", position, parse_error)
            }
            Error::CompileError(compile_error) => {
                write!(f, "Error compiling regex: {}", compile_error)
            }
            Error::RuntimeError(runtime_error) => {
                write!(f, "Error executing regex: {}", runtime_error)
            }
        }
    }
}

impl From<CompileError> for Error {
    fn from(compile_error: CompileError) -> Self {
        Error::CompileError(compile_error)
    }
}

impl From<RuntimeError> for Error {
    fn from(runtime_error: RuntimeError) -> Self {
        Error::RuntimeError(runtime_error)
    }
}
