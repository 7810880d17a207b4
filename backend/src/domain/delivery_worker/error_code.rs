//! Status code extraction for failed transport calls.

use crate::domain::ports::ChatTransportError;

/// Status code reported for a failed transport call.
///
/// Structured codes win; otherwise the error text is scanned with
/// [`extract_status_code`].
pub(super) fn error_code(error: &ChatTransportError) -> u16 {
    error
        .status_code()
        .unwrap_or_else(|| extract_status_code(&error.to_string()))
}

/// First delimited 4xx or 5xx code in `text`, or `0`.
///
/// A code must be exactly three digits, preceded by the start of the text,
/// whitespace, `:`, `(` or `-`, and followed by the end of the text,
/// whitespace, `:`, `!`, `)` or `,`.
///
/// # Examples
/// ```
/// use librecash::domain::extract_status_code;
///
/// assert_eq!(extract_status_code("Bad Request: chat not found (400)"), 400);
/// assert_eq!(extract_status_code("Forbidden: bot was blocked by the user: 403"), 403);
/// assert_eq!(extract_status_code("retry after 4000 ms"), 0);
/// ```
#[must_use]
pub fn extract_status_code(text: &str) -> u16 {
    let bytes = text.as_bytes();
    for start in 0..bytes.len().saturating_sub(2) {
        let Some(window) = bytes.get(start..start + 3) else {
            break;
        };
        if !window.iter().all(u8::is_ascii_digit) {
            continue;
        }
        let opens = start
            .checked_sub(1)
            .and_then(|before| bytes.get(before))
            .is_none_or(|byte| byte.is_ascii_whitespace() || matches!(byte, b':' | b'(' | b'-'));
        let closes = bytes
            .get(start + 3)
            .is_none_or(|byte| byte.is_ascii_whitespace() || matches!(byte, b':' | b'!' | b')' | b','));
        if !(opens && closes) {
            continue;
        }
        let code = window
            .iter()
            .fold(0_u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
        if (400..600).contains(&code) {
            return code;
        }
    }
    0
}
