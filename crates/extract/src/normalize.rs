//! Normalization of raw document text into canonical values.
//!
//! Every function here is total: unrecognised input falls back to a
//! documented default (or is returned unchanged) instead of failing.

use crate::consts;
use crate::models::{ContentType, Status};
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Maps free-form status text onto [`Status`], defaulting to [`Status::Ongoing`].
pub fn parse_status(text: &str) -> Status {
    let normalized = text.trim().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| normalized.contains(needle));
    if has(&["ongoing", "publishing"]) {
        Status::Ongoing
    } else if has(&["completed", "finished"]) {
        Status::Completed
    } else if has(&["hiatus", "on hold"]) {
        Status::Hiatus
    } else if has(&["cancelled", "discontinued"]) {
        Status::Cancelled
    } else if has(&["upcoming", "not yet"]) {
        Status::Upcoming
    } else {
        Status::Ongoing
    }
}

/// Maps free-form type text onto [`ContentType`], defaulting to [`ContentType::Manga`].
pub fn parse_content_type(text: &str) -> ContentType {
    let normalized = text.trim().to_lowercase();
    if normalized.contains("manhwa") {
        ContentType::Manhwa
    } else if normalized.contains("manhua") {
        ContentType::Manhua
    } else if normalized.contains("doujinshi") {
        ContentType::Doujinshi
    } else if normalized.contains("comic") {
        ContentType::Comic
    } else if normalized.contains("one-shot") || normalized.contains("oneshot") {
        ContentType::OneShot
    } else {
        ContentType::Manga
    }
}

/// Extracts the first decimal number, rescaling five-point scores (`"4.2/5"`)
/// onto the ten-point scale. Text without a number yields `0.0`.
pub fn parse_rating(text: &str) -> f64 {
    let Some(value) = consts::RATING_REGEX
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    else {
        return 0.0;
    };
    if text.contains("/5") { value * 2.0 } else { value }
}

/// Parses counts such as `"1.2K"`, `"3M"` or `"12,345"` into an integer,
/// flooring any fractional remainder. Text without a number yields `0`;
/// counts too large for a `u64` saturate to `u64::MAX`.
pub fn parse_magnitude(text: &str) -> u64 {
    let Some(captures) = consts::MAGNITUDE_REGEX.captures(text) else {
        return 0;
    };
    // The pattern only admits digits, so a failed parse is an overflow.
    let Ok(whole) = captures[1].replace(',', "").parse::<u128>() else {
        return u64::MAX;
    };
    let multiplier: u128 = match captures.get(3).map(|m| m.as_str().to_ascii_uppercase()).as_deref() {
        Some("K") => 1_000,
        Some("M") => 1_000_000,
        Some("B") => 1_000_000_000,
        _ => 1,
    };
    // Decimal arithmetic on the digits avoids `1.2 * 1000 = 1199.99…` flooring to 1199.
    let fraction = captures
        .get(2)
        .map(|m| m.as_str())
        .filter(|digits| digits.len() <= 18)
        .and_then(|digits| Some((digits.parse::<u128>().ok()?, 10u128.pow(digits.len() as u32))))
        .and_then(|(numerator, denominator)| Some(numerator.checked_mul(multiplier)? / denominator))
        .unwrap_or(0);
    whole
        .checked_mul(multiplier)
        .and_then(|value| value.checked_add(fraction))
        .and_then(|value| u64::try_from(value).ok())
        .unwrap_or(u64::MAX)
}

/// Extracts the numeric part of `"Chapter 12.5"`/`"Ch. 3"`. Chapter labels are
/// not always numeric, so unmatched text is returned unchanged.
pub fn parse_chapter_number(text: &str) -> String {
    consts::CHAPTER_NUMBER_REGEX
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| text.to_string(), |m| m.as_str().to_string())
}

/// Resolves `url` against `base`.
///
/// ```rust
/// use scanline_extract::normalize::resolve_url;
/// assert_eq!(resolve_url("https://x.io", "/a/b"), "https://x.io/a/b");
/// assert_eq!(resolve_url("https://x.io", "//cdn.io/a"), "https://cdn.io/a");
/// assert_eq!(resolve_url("https://x.io", "https://y.io/a"), "https://y.io/a");
/// assert_eq!(resolve_url("https://x.io", "a/b"), "https://x.io/a/b");
/// ```
pub fn resolve_url(base: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let base = base.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{base}{url}")
    } else {
        format!("{base}/{url}")
    }
}

/// Collapses whitespace runs into single spaces and trims both ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a calendar date into an ISO-8601 timestamp. Anything that is not
/// recognised (including relative dates like `"2 days ago"`) is returned
/// unchanged.
pub fn parse_date(text: &str) -> String {
    let trimmed = text.trim();
    if let Ok(timestamp) = OffsetDateTime::parse(trimmed, &Rfc3339)
        && let Ok(formatted) = timestamp.format(&Rfc3339)
    {
        return formatted;
    }
    calendar_date(trimmed)
        .and_then(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc().format(&Rfc3339).ok())
        .unwrap_or_else(|| text.to_string())
}

fn calendar_date(text: &str) -> Option<Date> {
    let (year, month, day) = if let Some(captures) = consts::ISO_DATE_REGEX.captures(text) {
        (captures[1].parse().ok()?, captures[2].parse::<u8>().ok()?, captures[3].parse().ok()?)
    } else if let Some(captures) = consts::MONTH_DAY_YEAR_REGEX.captures(text) {
        (captures[3].parse().ok()?, month_number(&captures[1])?, captures[2].parse().ok()?)
    } else if let Some(captures) = consts::DAY_MONTH_YEAR_REGEX.captures(text) {
        (captures[3].parse().ok()?, month_number(&captures[2])?, captures[1].parse().ok()?)
    } else if let Some(captures) = consts::NUMERIC_DATE_REGEX.captures(text) {
        (captures[3].parse().ok()?, captures[1].parse::<u8>().ok()?, captures[2].parse().ok()?)
    } else {
        return None;
    };
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

fn month_number(name: &str) -> Option<u8> {
    const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| name.starts_with(month))
        .and_then(|index| u8::try_from(index + 1).ok())
}

/// Generates a lookup slug: lowercase ASCII words joined by single hyphens.
pub fn generate_slug(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped = consts::SLUG_STRIP_REGEX.replace_all(&lowered, "");
    let hyphenated = consts::WHITESPACE_REGEX.replace_all(stripped.trim(), "-");
    consts::HYPHENS_REGEX.replace_all(&hyphenated, "-").trim_matches('-').to_string()
}

/// Returns the last non-empty path segment of a URL, ignoring any query
/// string or fragment.
pub fn id_from_url(url: &str) -> String {
    strip_query(url).split('/').filter(|segment| !segment.is_empty()).last().unwrap_or_default().to_string()
}

/// Returns the URL's path without scheme, host or surrounding slashes, so it
/// can be fetched again relative to the same site.
pub fn path_id(url: &str) -> String {
    let url = strip_query(url);
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => url,
    };
    path.trim_matches('/').to_string()
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Ongoing", Status::Ongoing)]
    #[case("  PUBLISHING ", Status::Ongoing)]
    #[case("Finished", Status::Completed)]
    #[case("completed", Status::Completed)]
    #[case("On Hold", Status::Hiatus)]
    #[case("Discontinued", Status::Cancelled)]
    #[case("Not yet published", Status::Upcoming)]
    #[case("", Status::Ongoing)]
    #[case("something else", Status::Ongoing)]
    fn test_parse_status(#[case] text: &str, #[case] expected: Status) {
        assert_eq!(parse_status(text), expected);
    }

    #[rstest]
    #[case("Manhwa", ContentType::Manhwa)]
    #[case("manhua", ContentType::Manhua)]
    #[case("Doujinshi", ContentType::Doujinshi)]
    #[case("Comic", ContentType::Comic)]
    #[case("One-shot", ContentType::OneShot)]
    #[case("oneshot", ContentType::OneShot)]
    #[case("Light Novel", ContentType::Manga)]
    #[case("", ContentType::Manga)]
    fn test_parse_content_type(#[case] text: &str, #[case] expected: ContentType) {
        assert_eq!(parse_content_type(text), expected);
    }

    #[rstest]
    #[case("4.2/5", 8.4)]
    #[case("8.5", 8.5)]
    #[case("Score: 7", 7.0)]
    #[case("no score", 0.0)]
    #[case("", 0.0)]
    fn test_parse_rating(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(parse_rating(text), expected);
    }

    #[rstest]
    #[case("1.2K", 1_200)]
    #[case("3M", 3_000_000)]
    #[case("2.5b", 2_500_000_000)]
    #[case("12,345 views", 12_345)]
    #[case("1.99", 1)]
    #[case("0.0005K", 0)]
    #[case("unknown", 0)]
    #[case("999999999999999999999999999999999B views", u64::MAX)]
    #[case("18446744073709551616", u64::MAX)]
    #[case("1234567890123456789012345678901234567890123 views", u64::MAX)]
    fn test_parse_magnitude(#[case] text: &str, #[case] expected: u64) {
        assert_eq!(parse_magnitude(text), expected);
    }

    #[rstest]
    #[case("Chapter 12", "12")]
    #[case("chapter 10.5: The End", "10.5")]
    #[case("Ch. 7", "7")]
    #[case("Prologue", "Prologue")]
    fn test_parse_chapter_number(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse_chapter_number(text), expected);
    }

    #[rstest]
    #[case("https://x.io", "/a/b", "https://x.io/a/b")]
    #[case("https://x.io/", "/a/b", "https://x.io/a/b")]
    #[case("https://x.io", "//cdn.io/a", "https://cdn.io/a")]
    #[case("https://x.io", "https://y.io/a", "https://y.io/a")]
    #[case("https://x.io", "http://y.io/a", "http://y.io/a")]
    #[case("https://x.io", "a/b", "https://x.io/a/b")]
    #[case("https://x.io", "", "")]
    fn test_resolve_url(#[case] base: &str, #[case] url: &str, #[case] expected: &str) {
        assert_eq!(resolve_url(base, url), expected);
    }

    #[rstest]
    #[case("  hello \n\t world  ", "hello world")]
    #[case("single", "single")]
    #[case("   ", "")]
    fn test_clean_text(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(clean_text(text), expected);
    }

    #[rstest]
    #[case("2024-01-05", "2024-01-05T00:00:00Z")]
    #[case("Jan 05, 2024", "2024-01-05T00:00:00Z")]
    #[case("January 5, 2024", "2024-01-05T00:00:00Z")]
    #[case("5 March 2023", "2023-03-05T00:00:00Z")]
    #[case("12/31/2022", "2022-12-31T00:00:00Z")]
    #[case("2024-02-10T12:30:00Z", "2024-02-10T12:30:00Z")]
    #[case("2 days ago", "2 days ago")]
    #[case("2024-02-30", "2024-02-30")]
    #[case("", "")]
    fn test_parse_date(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse_date(text), expected);
    }

    #[rstest]
    #[case("Slice of Life", "slice-of-life")]
    #[case("Sci-Fi", "sci-fi")]
    #[case("  Boys' Love!! ", "boys-love")]
    #[case("a -- b", "a-b")]
    #[case("Shoujo   Ai", "shoujo-ai")]
    fn test_generate_slug(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(generate_slug(text), expected);
    }

    #[rstest]
    #[case("https://x.io/manga/solo-leveling/", "solo-leveling")]
    #[case("/one-piece-3", "one-piece-3")]
    #[case("/read/one-piece-3/en/chapter-1?ref=home", "chapter-1")]
    #[case("", "")]
    fn test_id_from_url(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(id_from_url(url), expected);
    }

    #[rstest]
    #[case("https://x.io/read/one-piece-3/en/chapter-1", "read/one-piece-3/en/chapter-1")]
    #[case("/read/one-piece-3/en/chapter-1/", "read/one-piece-3/en/chapter-1")]
    #[case("https://x.io", "")]
    fn test_path_id(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(path_id(url), expected);
    }
}
