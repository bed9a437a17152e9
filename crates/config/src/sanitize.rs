//! Text sanitizer for hand-edited configuration text.
//!
//! Copy-pasted configuration files routinely carry invisible whitespace that
//! breaks indentation-sensitive parsing or silently corrupts string values.
//! [`sanitize_text`] replaces those code points with an ordinary space and
//! normalizes Windows line endings. It is total and idempotent.

use std::borrow::Cow;

/// Code points replaced by an ordinary space.
///
/// No-break space, figure space, narrow no-break space, and the byte-order
/// mark (zero-width no-break space).
pub const HOSTILE_WHITESPACE: [char; 4] = ['\u{00A0}', '\u{2007}', '\u{202F}', '\u{FEFF}'];

/// Returns `true` when `ch` is one of [`HOSTILE_WHITESPACE`].
#[must_use]
pub fn is_hostile_whitespace(ch: char) -> bool {
    HOSTILE_WHITESPACE.contains(&ch)
}

/// Sanitize raw text before structured parsing.
///
/// - every [`HOSTILE_WHITESPACE`] code point becomes `' '`
/// - a run of `'\r'` directly followed by `'\n'` collapses to `'\n'`
///
/// Lone carriage returns are kept as-is. Borrows the input when nothing
/// needs rewriting.
///
/// # Examples
///
/// ```
/// use job_posting_dq_config::sanitize_text;
///
/// assert_eq!(sanitize_text("a\u{00A0}b\r\n"), "a b\n");
/// assert_eq!(sanitize_text("clean\n"), "clean\n");
/// ```
#[must_use]
pub fn sanitize_text(input: &str) -> Cow<'_, str> {
    if !needs_rewrite(input) {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut pending_cr = 0_usize;
    for ch in input.chars() {
        match ch {
            '\r' => pending_cr += 1,
            '\n' => {
                pending_cr = 0;
                output.push('\n');
            },
            other => {
                flush_cr(&mut output, &mut pending_cr);
                if is_hostile_whitespace(other) {
                    output.push(' ');
                } else {
                    output.push(other);
                }
            },
        }
    }
    flush_cr(&mut output, &mut pending_cr);
    Cow::Owned(output)
}

fn needs_rewrite(input: &str) -> bool {
    input.contains("\r\n") || input.chars().any(is_hostile_whitespace)
}

fn flush_cr(output: &mut String, pending: &mut usize) {
    for _ in 0..*pending {
        output.push('\r');
    }
    *pending = 0;
}
