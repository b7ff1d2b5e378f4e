//! Declarative field location.
//!
//! Site markup drifts, so a field is described by an ordered list of places it
//! may live rather than a single selector. The first place that yields an
//! accepted, non-empty value wins.

use scraper::{ElementRef, Selector};

use crate::normalize::clean_text;

/// Where a candidate's value is read from once its selector matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Whitespace-collapsed text content.
    Text,
    /// A named attribute, trimmed.
    Attr(&'static str),
    /// The first present of several attributes (`data-src` before `src`).
    AnyAttr(&'static [&'static str]),
}
impl Field {
    pub fn read(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match self {
            Field::Text => clean_text(&element.text().collect::<String>()),
            Field::Attr(name) => element.value().attr(name)?.trim().to_string(),
            Field::AnyAttr(names) => names
                .iter()
                .filter_map(|name| element.value().attr(name))
                .map(str::trim)
                .find(|value| !value.is_empty())?
                .to_string(),
        };
        Some(value).filter(|value| !value.is_empty())
    }
}

/// Predicate a candidate value must satisfy to be accepted.
pub type Validator = fn(&str) -> bool;

#[derive(Debug)]
struct Rule {
    selector: Selector,
    field: Field,
    validator: Option<Validator>,
}

/// An ordered list of `(selector, field, validator)` rules.
#[derive(Debug)]
pub struct Candidates {
    rules: Vec<Rule>,
}
impl Candidates {
    /// Builds candidates from CSS selectors.
    ///
    /// Panics on an invalid selector: candidates are declared statically, so
    /// a typo is a programming error caught by the first test touching it.
    pub fn new(rules: &[(&str, Field)]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|(css, field)| Rule {
                    selector: Selector::parse(css).unwrap_or_else(|_| panic!("invalid selector: {css}")),
                    field: *field,
                    validator: None,
                })
                .collect(),
        }
    }

    /// Applies `validator` to every rule.
    pub fn validated(mut self, validator: Validator) -> Self {
        for rule in &mut self.rules {
            rule.validator = Some(validator);
        }
        self
    }

    /// Returns the first accepted value within `scope`.
    pub fn first(&self, scope: ElementRef<'_>) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            scope
                .select(&rule.selector)
                .filter_map(|element| rule.field.read(element))
                .find(|value| rule.validator.is_none_or(|accept| accept(value)))
        })
    }

    /// Like [`first`](Self::first), defaulting to an empty string.
    pub fn text(&self, scope: ElementRef<'_>) -> String {
        self.first(scope).unwrap_or_default()
    }

    /// Every accepted value of the first rule that yields any, deduplicated in
    /// document order.
    pub fn all(&self, scope: ElementRef<'_>) -> Vec<String> {
        for rule in &self.rules {
            let mut values = Vec::new();
            for value in scope.select(&rule.selector).filter_map(|element| rule.field.read(element)) {
                if rule.validator.is_none_or(|accept| accept(&value)) && !values.contains(&value) {
                    values.push(value);
                }
            }
            if !values.is_empty() {
                return values;
            }
        }
        Vec::new()
    }

    /// Every element matched by the first rule that matches anything.
    pub fn elements<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.rules
            .iter()
            .map(|rule| scope.select(&rule.selector).collect::<Vec<_>>())
            .find(|elements| !elements.is_empty())
            .unwrap_or_default()
    }
}

/// Accepts values that look like an image or page URL rather than inline data.
pub fn is_url(value: &str) -> bool {
    !value.starts_with("data:") && (value.contains('/') || value.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const HTML: &str = r#"
        <div class="item">
            <h3 class="title">   </h3>
            <a class="name" href="/solo-leveling">  Solo
                Leveling </a>
            <img class="cover" src="data:image/gif;base64,AAAA" data-src="https://cdn.io/solo.jpg">
            <img class="alt" src="https://cdn.io/alt.jpg">
        </div>
    "#;

    #[test]
    fn first_non_empty_candidate_wins() {
        let document = Html::parse_fragment(HTML);
        let candidates = Candidates::new(&[(".title", Field::Text), (".name", Field::Text), (".missing", Field::Text)]);
        assert_eq!(candidates.first(document.root_element()).as_deref(), Some("Solo Leveling"));
    }

    #[test]
    fn attribute_sources_and_validators() {
        let document = Html::parse_fragment(HTML);
        let root = document.root_element();
        let href = Candidates::new(&[("a", Field::Attr("href"))]);
        assert_eq!(href.text(root), "/solo-leveling");
        let cover = Candidates::new(&[("img", Field::AnyAttr(&["src", "data-src"]))]).validated(is_url);
        // The inline placeholder of the first image is rejected, so the next image is used.
        assert_eq!(cover.text(root), "https://cdn.io/alt.jpg");
        let lazy = Candidates::new(&[("img.cover", Field::AnyAttr(&["data-src", "src"]))]).validated(is_url);
        assert_eq!(lazy.text(root), "https://cdn.io/solo.jpg");
    }

    #[test]
    fn nothing_found_is_empty() {
        let document = Html::parse_fragment(HTML);
        let candidates = Candidates::new(&[("span", Field::Text)]);
        assert_eq!(candidates.first(document.root_element()), None);
        assert_eq!(candidates.text(document.root_element()), "");
        assert!(candidates.elements(document.root_element()).is_empty());
        assert!(candidates.all(document.root_element()).is_empty());
    }

    #[test]
    fn all_values_of_first_matching_rule() {
        let document = Html::parse_fragment(
            r#"<ul class="genres"><a>Action</a><a> Drama </a><a>Action</a></ul><p class="tags"><a>Ignored</a></p>"#,
        );
        let candidates = Candidates::new(&[(".missing a", Field::Text), (".genres a", Field::Text), (".tags a", Field::Text)]);
        assert_eq!(candidates.all(document.root_element()), vec!["Action", "Drama"]);
    }
}
