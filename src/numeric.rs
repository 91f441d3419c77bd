use std::num::IntErrorKind;
use std::sync::LazyLock;

use fancy_regex::Regex;

// U+FEFF is not in `\s` but browsers skip it before numbers too.
static LEADING_INT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[\\s\u{FEFF}]*(?P<int>[+-]?[0-9]+)").expect("leading integer pattern is valid")
});

/// Extracts the integer at the start of `src`: optional whitespace, an
/// optional sign, then ASCII digits. Trailing text is ignored, so `"12px"`
/// yields 12. Digit runs outside the `i64` range saturate.
pub fn parse_leading_int(src: &str) -> Option<i64> {
    let captures = LEADING_INT.captures(src).ok()??;
    let digits = captures.name("int")?.as_str();
    match digits.parse::<i64>() {
        Ok(value) => Some(value),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

/// Leading integer of an optional attribute value, or `default`.
pub fn parse_int_or(src: Option<&str>, default: i64) -> i64 {
    src.and_then(parse_leading_int).unwrap_or(default)
}

/// `max(min, min(value, max))`. Upper bound first, so a misconfigured range
/// with `min > max` always resolves to `min`.
pub fn clamp_upper_first(value: i64, min: i64, max: i64) -> i64 {
    value.min(max).max(min)
}
