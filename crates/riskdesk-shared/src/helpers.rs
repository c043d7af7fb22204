//! Small string helpers shared by the resolver and the ticket model.

use crate::DEFAULT_ACTOR_NAME;

/// Default delimiter between player name and merchant code
pub const MEMBER_DELIMITER: char = '@';

/// Merchant code between the first `delimiter` and the next one, trimmed.
/// `None` when there is no delimiter or the segment is blank.
pub fn merchant_suffix(member_id: &str, delimiter: char) -> Option<&str> {
    let suffix = member_id.split(delimiter).nth(1)?.trim();
    if suffix.is_empty() {
        None
    } else {
        Some(suffix)
    }
}

/// Merchant id stored on a ticket: the raw suffix, or "-" for house members
pub fn merchant_id_of(member_id: &str) -> String {
    merchant_suffix(member_id, MEMBER_DELIMITER)
        .unwrap_or("-")
        .to_string()
}

/// Left-pad `code` with `pad` to `width` characters. Longer codes are kept.
pub fn pad_code(code: &str, pad: char, width: usize) -> String {
    let len = code.chars().count();
    if len >= width {
        return code.to_string();
    }
    let mut out: String = std::iter::repeat_n(pad, width - len).collect();
    out.push_str(code);
    out
}

/// Work name shown in scripts: local part of the agent's email
pub fn actor_name_from_email(email: Option<&str>) -> String {
    email
        .and_then(|e| e.split('@').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_ACTOR_NAME)
        .to_string()
}
