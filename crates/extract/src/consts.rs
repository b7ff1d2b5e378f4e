macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: std::sync::LazyLock<scraper::Selector> =
            std::sync::LazyLock::new(|| scraper::Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: std::sync::LazyLock<regex::Regex> =
            std::sync::LazyLock::new(|| regex::Regex::new($regex).unwrap());
    };
}

/// Declares an ordered list of candidate field locations, see [`Candidates`](crate::rules::Candidates).
macro_rules! candidates {
    ($name:ident, [$(($css:expr, $source:expr)),+ $(,)?]) => {
        pub(crate) static $name: std::sync::LazyLock<$crate::rules::Candidates> =
            std::sync::LazyLock::new(|| $crate::rules::Candidates::new(&[$(($css, $source)),+]));
    };
    ($name:ident, [$(($css:expr, $source:expr)),+ $(,)?], $validator:expr) => {
        pub(crate) static $name: std::sync::LazyLock<$crate::rules::Candidates> = std::sync::LazyLock::new(|| {
            $crate::rules::Candidates::new(&[$(($css, $source)),+]).validated($validator)
        });
    };
}

regex!(RATING_REGEX, r"(\d+\.?\d*)");
regex!(MAGNITUDE_REGEX, r"(?i)(\d+(?:,\d+)*)(?:\.(\d+))?\s*([KMB])?");
regex!(CHAPTER_NUMBER_REGEX, r"(?i)(?:chapter|ch\.?)\s*(\d+(?:\.\d+)?)");
regex!(SLUG_STRIP_REGEX, r"[^a-zA-Z0-9_\s-]");
regex!(WHITESPACE_REGEX, r"\s+");
regex!(HYPHENS_REGEX, r"-+");
regex!(ISO_DATE_REGEX, r"^(\d{4})-(\d{1,2})-(\d{1,2})$");
regex!(MONTH_DAY_YEAR_REGEX, r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})$");
regex!(DAY_MONTH_YEAR_REGEX, r"^(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]+)\.?,?\s+(\d{4})$");
regex!(NUMERIC_DATE_REGEX, r"^(\d{1,2})/(\d{1,2})/(\d{4})$");

/// URL fragments that mark reader images as site chrome rather than content.
pub(crate) const NON_CONTENT_MARKERS: &[&str] = &["icon", "logo", "loading", "placeholder", "readerarea.svg"];

