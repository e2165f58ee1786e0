/// Character-offset helpers for UTF-8 strings.
///
/// DOM offsets count characters (Unicode scalar values), while `String`
/// indexes bytes. These helpers translate between the two so that every
/// accepted offset lands on a character boundary.

/// Number of characters in `s`.
///
/// ASCII-only input takes the byte length directly.
#[inline]
pub fn char_len(s: &str) -> usize {
    if s.is_ascii() {
        return s.len();
    }
    s.chars().count()
}

/// Byte index of the character at `offset`, or `None` when `offset` is past
/// the end. `offset == char_len(s)` maps to `s.len()`.
pub fn byte_index(s: &str, offset: usize) -> Option<usize> {
    if s.is_ascii() {
        return (offset <= s.len()).then_some(offset);
    }
    if offset == 0 {
        return Some(0);
    }
    let mut seen = 0usize;
    for (idx, _) in s.char_indices() {
        if seen == offset {
            return Some(idx);
        }
        seen += 1;
    }
    (seen == offset).then_some(s.len())
}

/// Split `s` at a character offset.
///
/// Returns `None` if `offset` exceeds the character length; never clamps.
pub fn split_at_char(s: &str, offset: usize) -> Option<(&str, &str)> {
    byte_index(s, offset).map(|idx| s.split_at(idx))
}

/// Slice up to `limit` characters of `s`, starting at character `start`.
///
/// A `start` past the end yields an empty slice.
pub fn char_slice(s: &str, start: usize, limit: usize) -> &str {
    let Some(from) = byte_index(s, start) else {
        return "";
    };
    let rest = &s[from..];
    let to = byte_index(rest, limit).unwrap_or(rest.len());
    &rest[..to]
}
