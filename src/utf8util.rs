//! UTF-8 codec primitives used by the matcher.
//!
//! The decoders are strict: overlong forms, surrogates, values above `U+10FFFF` and truncated
//! sequences all decode to `None`.

#[inline]
pub(crate) fn codepoint_len(b: u8) -> usize {
    match b {
        b if b < 0x80 => 1,
        b if b < 0xe0 => 2,
        b if b < 0xf0 => 3,
        _ => 4,
    }
}

#[allow(clippy::cast_possible_wrap)]
#[inline]
fn is_utf8_first_byte(b: u8) -> bool {
    (b as i8) >= -0x40
}

/// Decode the codepoint starting at `ix`, returning it with its encoded length.
pub(crate) fn decode(bytes: &[u8], ix: usize) -> Option<(char, usize)> {
    let b0 = *bytes.get(ix)?;
    if b0 < 0x80 {
        return Some((char::from(b0), 1));
    }
    // continuation bytes, the overlong leads 0xc0/0xc1 and leads past U+10FFFF
    if !(0xc2..=0xf4).contains(&b0) {
        return None;
    }
    let len = codepoint_len(b0);
    let tail = bytes.get(ix + 1..ix + len)?;
    let mut cp = u32::from(b0) & (0x7f >> len);
    for &b in tail {
        if b & 0xc0 != 0x80 {
            return None;
        }
        cp = (cp << 6) | u32::from(b & 0x3f);
    }
    let min = match len {
        2 => 0x80,
        3 => 0x800,
        _ => 0x1_0000,
    };
    if cp < min {
        return None;
    }
    char::from_u32(cp).map(|c| (c, len))
}

/// Decode the codepoint ending at `ix`, returning it with its encoded length.
pub(crate) fn decode_before(bytes: &[u8], ix: usize) -> Option<(char, usize)> {
    let start = prev_codepoint_ix(bytes, ix)?;
    match decode(bytes, start) {
        Some((c, len)) if start + len == ix => Some((c, len)),
        _ => None,
    }
}

/// Start of the codepoint ending at `ix`, or `None` at the start of the text.
#[inline]
pub(crate) fn prev_codepoint_ix(s: impl AsRef<[u8]>, ix: usize) -> Option<usize> {
    let bytes = s.as_ref();
    let floor = ix.saturating_sub(4);
    (floor..ix).rev().find(|&i| is_utf8_first_byte(bytes[i]))
}

/// Index following the codepoint starting at `ix`. `ix` must be in bounds.
#[inline]
pub(crate) fn next_codepoint_ix(s: impl AsRef<[u8]>, ix: usize) -> usize {
    ix + codepoint_len(s.as_ref()[ix])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ascii_and_multibyte() {
        let s = "aé日😀";
        let b = s.as_bytes();
        assert_eq!(decode(b, 0), Some(('a', 1)));
        assert_eq!(decode(b, 1), Some(('é', 2)));
        assert_eq!(decode(b, 3), Some(('日', 3)));
        assert_eq!(decode(b, 6), Some(('😀', 4)));
        assert_eq!(decode(b, 10), None);
    }

    #[test]
    fn decode_rejects_malformed() {
        // continuation byte on its own
        assert_eq!(decode(&[0x80], 0), None);
        // overlong encodings of '/'
        assert_eq!(decode(&[0xc0, 0xaf], 0), None);
        assert_eq!(decode(&[0xe0, 0x80, 0xaf], 0), None);
        assert_eq!(decode(&[0xf0, 0x80, 0x80, 0xaf], 0), None);
        // surrogate U+D800
        assert_eq!(decode(&[0xed, 0xa0, 0x80], 0), None);
        // beyond U+10FFFF
        assert_eq!(decode(&[0xf4, 0x90, 0x80, 0x80], 0), None);
        // truncated
        assert_eq!(decode(&[0xe6, 0x97], 0), None);
        // bad continuation
        assert_eq!(decode(&[0xc3, 0x41], 0), None);
    }

    #[test]
    fn decode_backwards() {
        let s = "x日";
        let b = s.as_bytes();
        assert_eq!(decode_before(b, 4), Some(('日', 3)));
        assert_eq!(decode_before(b, 1), Some(('x', 1)));
        assert_eq!(decode_before(b, 0), None);
        // lands inside a codepoint
        assert_eq!(decode_before(b, 3), None);
    }

    #[test]
    fn step_over_codepoints() {
        let s = "a日b";
        assert_eq!(next_codepoint_ix(s, 0), 1);
        assert_eq!(next_codepoint_ix(s, 1), 4);
        assert_eq!(prev_codepoint_ix(s, 4), Some(1));
        assert_eq!(prev_codepoint_ix(s, 1), Some(0));
        assert_eq!(prev_codepoint_ix(s, 0), None);
    }
}
