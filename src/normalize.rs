//! Removal of volatile date tokens before threshold comparison.
//!
//! Only dates are stripped. Policy numbers, monetary amounts and every other
//! token survive untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// "April 1, 2024" or "Apr 1, 2024". "Sept" is not an accepted abbreviation.
static MONTH_NAME_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:tember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\s+\d{1,2},\s+\d{4}",
    )
    .expect("month-name date pattern is valid")
});

/// "04/01/2024", "4/1/24"
static SLASH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").expect("slash date pattern is valid")
});

/// "2024-04-01"
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("ISO date pattern is valid"));

/// Strip month-name, slash and ISO dates, then trim.
///
/// Removal is repeated until nothing matches, since deleting one date can
/// bring the pieces of another together. This keeps the function idempotent.
pub fn normalize(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = strip_dates_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

fn strip_dates_once(text: &str) -> String {
    let pass = MONTH_NAME_DATE.replace_all(text, "");
    let pass = SLASH_DATE.replace_all(&pass, "").into_owned();
    ISO_DATE.replace_all(&pass, "").into_owned()
}
