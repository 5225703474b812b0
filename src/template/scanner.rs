use crate::config::Dialect;

/// Lexical context of the byte under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    /// Inside a string or quoted identifier opened by the given byte.
    Quoted(u8),
    LineComment,
    BlockComment(u32),
    /// Postgres `$tag$ ... $tag$` body; the tag may be empty.
    DollarQuoted(String),
}

impl State {
    /// Whether a quote, comment or dollar-quote opens at `idx`.
    ///
    /// Returns the new state and how many bytes the opener spans.
    pub(super) fn opening(bytes: &[u8], idx: usize, dialect: Dialect) -> Option<(State, usize)> {
        match bytes[idx] {
            q @ (b'\'' | b'"' | b'`') => Some((State::Quoted(q), 1)),
            b'-' if pair(bytes, idx, b'-', b'-') => Some((State::LineComment, 2)),
            b'#' if dialect == Dialect::Mysql => Some((State::LineComment, 1)),
            b'/' if pair(bytes, idx, b'/', b'*') => Some((State::BlockComment(1), 2)),
            b'$' if dialect == Dialect::Postgres => dollar_tag(bytes, idx)
                .map(|tag| {
                    let width = tag.len() + 2;
                    (State::DollarQuoted(tag.to_owned()), width)
                }),
            _ => None,
        }
    }

    /// Consume input inside a non-`Normal` state; returns the bytes consumed.
    pub(super) fn skip(&mut self, bytes: &[u8], idx: usize, dialect: Dialect) -> usize {
        let b = bytes[idx];
        match self {
            State::Normal => 1,
            State::Quoted(q) => {
                let q = *q;
                if b == b'\\' && backslash_escapes(q, dialect) {
                    return 2;
                }
                if b == q {
                    if bytes.get(idx + 1) == Some(&q) {
                        return 2;
                    }
                    *self = State::Normal;
                }
                1
            }
            State::LineComment => {
                if b == b'\n' {
                    *self = State::Normal;
                }
                1
            }
            State::BlockComment(depth) => {
                if pair(bytes, idx, b'/', b'*') {
                    *depth += 1;
                    2
                } else if pair(bytes, idx, b'*', b'/') {
                    if *depth == 1 {
                        *self = State::Normal;
                    } else {
                        *depth -= 1;
                    }
                    2
                } else {
                    1
                }
            }
            State::DollarQuoted(tag) => {
                if dollar_tag(bytes, idx) == Some(tag.as_str()) {
                    let width = tag.len() + 2;
                    *self = State::Normal;
                    width
                } else {
                    1
                }
            }
        }
    }
}

/// MySQL strings (single or double quoted) take C-style backslash escapes.
fn backslash_escapes(quote: u8, dialect: Dialect) -> bool {
    dialect == Dialect::Mysql && quote != b'`'
}

fn pair(bytes: &[u8], idx: usize, first: u8, second: u8) -> bool {
    bytes.get(idx) == Some(&first) && bytes.get(idx + 1) == Some(&second)
}

/// The tag of a `$tag$` delimiter starting at `idx`.
///
/// Tags follow identifier rules, so `$1` is never mistaken for one.
fn dollar_tag(bytes: &[u8], idx: usize) -> Option<&str> {
    let start = idx + 1;
    let mut end = start;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'$' => return std::str::from_utf8(&bytes[start..end]).ok(),
            b'0'..=b'9' if end == start => return None,
            b if b.is_ascii_alphanumeric() || b == b'_' => end += 1,
            _ => return None,
        }
    }
    None
}

/// `::` cast operator at `idx`.
pub(super) fn is_cast(bytes: &[u8], idx: usize) -> bool {
    pair(bytes, idx, b':', b':')
}

/// Scan a named-parameter label starting at `start`; returns the end index and the label.
pub(super) fn scan_label(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    match bytes.get(start) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return None,
    }
    let end = bytes[start..]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .map_or(bytes.len(), |len| start + len);
    std::str::from_utf8(&bytes[start..end])
        .ok()
        .map(|label| (end, label))
}
