/// Checks that a phone number is syntactically plausible.
///
/// A plausible phone number is:
/// - Non-empty
/// - An optional single leading `+`
/// - Followed by one or more ASCII digits, nothing else
///
/// Callers trim surrounding whitespace first; this check does not.
#[must_use]
pub fn is_plausible_phone(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
