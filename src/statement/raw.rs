//! Substitution of neutral placeholders in raw SQL.
//!
//! Neutral tokens are positional `?` and named `:name`. Substitution walks
//! the statement with a lightweight state machine so tokens inside string
//! literals, quoted identifiers, comments, and dollar-quoted blocks are left
//! untouched. Markers are assigned in first-seen order.

use crate::dialect::BindMarkers;
use crate::error::SqlConduitError;
use crate::value::SqlValue;

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..=end].starts_with(tag.as_bytes())
        && bytes.get(end) == Some(&b'$')
}

fn scan_name(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let first = *bytes.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
        idx += 1;
    }
    std::str::from_utf8(&bytes[start..idx])
        .ok()
        .map(|name| (idx, name))
}

/// Substitute neutral placeholders with dialect markers and produce the
/// ordered bind list.
///
/// Every placeholder must have exactly one bound value and every bound value
/// must be referenced; anything else is a usage error, caught here before
/// any driver interaction. A repeated `:name` re-emits a fresh marker and
/// repeats its value, since drivers bind positionally.
pub(crate) fn substitute(
    sql: &str,
    markers: &mut BindMarkers,
    positional: &[SqlValue],
    named: &[(String, SqlValue)],
) -> Result<(String, Vec<SqlValue>), SqlConduitError> {
    let bytes = sql.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(sql.len() + 8);
    let mut bindings = Vec::new();
    let mut state = State::Normal;
    let mut next_positional = 0usize;
    let mut used_names = vec![false; named.len()];
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    state = State::SingleQuoted;
                    out.push(b);
                }
                b'"' => {
                    state = State::DoubleQuoted;
                    out.push(b);
                }
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    out.push(b);
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    out.extend_from_slice(b"/*");
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        out.extend_from_slice(&bytes[idx..=advance]);
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    } else {
                        out.push(b);
                    }
                }
                b'?' => {
                    let value = positional.get(next_positional).ok_or_else(|| {
                        SqlConduitError::usage(format!(
                            "positional placeholder {} has no bound value",
                            next_positional + 1
                        ))
                    })?;
                    next_positional += 1;
                    out.extend_from_slice(markers.next().placeholder.as_bytes());
                    bindings.push(value.clone());
                }
                b':' => {
                    if bytes.get(idx + 1) == Some(&b':') {
                        // Cast operator, not a parameter.
                        out.extend_from_slice(b"::");
                        idx += 1;
                    } else if let Some((end, name)) = scan_name(bytes, idx + 1) {
                        let found =
                            named.iter().position(|(n, _)| n == name).ok_or_else(|| {
                                SqlConduitError::usage(format!(
                                    "named placeholder `:{name}` has no bound value"
                                ))
                            })?;
                        used_names[found] = true;
                        bindings.push(named[found].1.clone());
                        out.extend_from_slice(markers.next().placeholder.as_bytes());
                        idx = end - 1;
                    } else {
                        out.push(b);
                    }
                }
                _ => out.push(b),
            },
            State::SingleQuoted => {
                out.push(b);
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        out.push(b'\'');
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                out.push(b);
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        out.push(b'"');
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                out.push(b);
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                // Consume both delimiter bytes at once so the opener's `*`
                // is never mistaken for the start of a close.
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    out.extend_from_slice(b"/*");
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    out.extend_from_slice(b"*/");
                    idx += 1;
                } else {
                    out.push(b);
                }
            }
            State::DollarQuoted(ref tag) => {
                out.push(b);
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    out.extend_from_slice(tag.as_bytes());
                    out.push(b'$');
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }

        idx += 1;
    }

    if next_positional < positional.len() {
        return Err(SqlConduitError::usage(format!(
            "{} positional values bound but only {} placeholders referenced",
            positional.len(),
            next_positional
        )));
    }
    if let Some(unused) = used_names.iter().position(|used| !used) {
        return Err(SqlConduitError::usage(format!(
            "named parameter `{}` is never referenced",
            named[unused].0
        )));
    }

    let sql = String::from_utf8(out)
        .map_err(|_| SqlConduitError::usage("statement text was not valid UTF-8"))?;
    Ok((sql, bindings))
}
