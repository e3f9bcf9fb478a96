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

//! Byte classification table and the predefined character classes built on it.
//!
//! Every byte value maps to a set of [`ByteClass`] bits. Only ASCII bytes carry any bits, so a
//! codepoint outside ASCII never belongs to a predefined class, and the lead or continuation
//! byte of a multi-byte sequence is never a word character.

use bitflags::bitflags;

bitflags! {
    /// Classification bits of a single byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct ByteClass: u8 {
        /// `0-9`
        const DIGIT   = 0x02;
        /// `0-9`, `A-Z`, `a-z` and `_`
        const WORD    = 0x04;
        /// `0-9`, `A-F`, `a-f`
        const HEX     = 0x08;
        /// Space, tab, newline, carriage return, form feed, vertical tab
        const SPACE   = 0x10;
        /// Metacharacter of the pattern language
        const SPECIAL = 0x20;
        /// `A-Z`
        const UPPER   = 0x40;
        /// `a-z`
        const LOWER   = 0x80;
        /// `A-Z` and `a-z`
        const LETTER  = Self::UPPER.bits() | Self::LOWER.bits();
    }
}

static TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut b = 0;
    while b < 256 {
        let c = b as u8;
        let mut bits = 0;
        if c.is_ascii_lowercase() {
            bits |= ByteClass::LOWER.bits() | ByteClass::WORD.bits();
        }
        if c.is_ascii_uppercase() {
            bits |= ByteClass::UPPER.bits() | ByteClass::WORD.bits();
        }
        if c.is_ascii_digit() {
            bits |= ByteClass::DIGIT.bits() | ByteClass::HEX.bits();
        }
        if matches!(c, b'a'..=b'f' | b'A'..=b'F') {
            bits |= ByteClass::HEX.bits();
        }
        if c == b'_' {
            bits |= ByteClass::WORD.bits();
        }
        match c {
            b'\t' | b'\n' | b'\r' | 0x0c | 0x0b | b' ' => bits |= ByteClass::SPACE.bits(),
            b'(' | b')' | b'[' | b']' | b'{' | b'}' | b'*' | b'+' | b'?' | b'.' | b'^' | b'$'
            | b'|' => bits |= ByteClass::SPECIAL.bits(),
            _ => {}
        }
        table[b] = bits;
        b += 1;
    }
    table
}

/// Classification of one byte.
#[inline]
pub(crate) fn class_of(b: u8) -> ByteClass {
    ByteClass::from_bits_retain(TABLE[b as usize])
}

/// Classification of one codepoint; empty for anything outside ASCII.
#[inline]
pub(crate) fn class_of_char(c: char) -> ByteClass {
    if c.is_ascii() {
        class_of(c as u8)
    } else {
        ByteClass::empty()
    }
}

#[inline]
pub(crate) fn is_word_byte(b: u8) -> bool {
    class_of(b).contains(ByteClass::WORD)
}

#[inline]
pub(crate) fn is_special_byte(b: u8) -> bool {
    class_of(b).contains(ByteClass::SPECIAL)
}

/// A predefined character class, as written with a backslash escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// `\w`: word character
    Word,
    /// `\d`: decimal digit
    Digit,
    /// `\h`: hexadecimal digit
    Hex,
    /// `\l`: ASCII letter
    Letter,
    /// `\u`: uppercase ASCII letter (any letter when case-insensitive)
    Upper,
    /// `\U`: lowercase ASCII letter (any letter when case-insensitive)
    Lower,
    /// `\s`: whitespace
    Space,
}

impl ClassKind {
    fn bits(self, casei: bool) -> ByteClass {
        match self {
            ClassKind::Word => ByteClass::WORD,
            ClassKind::Digit => ByteClass::DIGIT,
            ClassKind::Hex => ByteClass::HEX,
            ClassKind::Letter => ByteClass::LETTER,
            ClassKind::Upper if casei => ByteClass::LETTER,
            ClassKind::Upper => ByteClass::UPPER,
            ClassKind::Lower if casei => ByteClass::LETTER,
            ClassKind::Lower => ByteClass::LOWER,
            ClassKind::Space => ByteClass::SPACE,
        }
    }

    /// Whether `c` belongs to the class.
    #[inline]
    pub(crate) fn matches(self, c: char, casei: bool) -> bool {
        class_of_char(c).intersects(self.bits(casei))
    }

    /// Map an escape letter to its class and inversion bit.
    pub(crate) fn from_escape(c: u8) -> Option<(ClassKind, bool)> {
        Some(match c {
            b'w' => (ClassKind::Word, false),
            b'W' => (ClassKind::Word, true),
            b'd' => (ClassKind::Digit, false),
            b'D' => (ClassKind::Digit, true),
            b'h' => (ClassKind::Hex, false),
            b'H' => (ClassKind::Hex, true),
            b'l' => (ClassKind::Letter, false),
            b'L' => (ClassKind::Letter, true),
            b'u' => (ClassKind::Upper, false),
            b'U' => (ClassKind::Lower, false),
            b's' => (ClassKind::Space, false),
            b'S' => (ClassKind::Space, true),
            _ => return None,
        })
    }
}
