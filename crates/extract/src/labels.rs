//! "Label: value" info blocks.
//!
//! Series pages describe themselves with rows like `<div><b>Status:</b>
//! <i>Ongoing</i></div>`. The label is the first text of the row and the value
//! is whatever text follows it, so the same lookup works whether the value is
//! a sibling, a nested link or bare text.

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Selector};

use crate::normalize::clean_text;

selector!(ANCHOR_SELECTOR, "a");

#[derive(Debug, Default)]
pub struct Labels<'a> {
    rows: HashMap<String, ElementRef<'a>>,
}

/// Labels Internals
impl<'a> Labels<'a> {
    /// Collects every row matching `rows` within `scope`. The first row wins
    /// when a label repeats.
    pub fn collect(scope: ElementRef<'a>, rows: &Selector) -> Self {
        let mut collected = HashMap::new();
        for row in scope.select(rows) {
            if let Some(label) = Self::label_of(row) {
                collected.entry(label).or_insert(row);
            }
        }
        Self { rows: collected }
    }

    fn label_of(row: ElementRef<'a>) -> Option<String> {
        row.text()
            .map(|chunk| chunk.trim().trim_end_matches(':').trim())
            .find(|chunk| !chunk.is_empty())
            .map(str::to_lowercase)
    }

    fn find(&self, labels: &[&str]) -> Option<ElementRef<'a>> {
        labels.iter().find_map(|label| self.rows.get(&label.to_lowercase()).copied())
    }
}

/// Labels Public
impl<'a> Labels<'a> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Text following the label, whitespace-collapsed. `None` when the label is
    /// absent or has no value.
    pub fn text(&self, labels: &[&str]) -> Option<String> {
        let row = self.find(labels)?;
        let mut chunks = row.text().skip_while(|chunk| chunk.trim().trim_end_matches(':').trim().is_empty());
        // The first non-empty chunk is the label itself.
        chunks.next();
        let value = clean_text(&chunks.collect::<String>());
        let value = value.trim_start_matches(':').trim();
        Some(value.to_string()).filter(|value| !value.is_empty())
    }

    /// The value split on `,` and `;`.
    pub fn list(&self, labels: &[&str]) -> Vec<String> {
        self.text(labels)
            .map(|text| {
                text.split([',', ';']).map(clean_text).filter(|item| !item.is_empty()).collect()
            })
            .unwrap_or_default()
    }

    /// Distinct link texts within the row.
    pub fn links(&self, labels: &[&str]) -> Vec<String> {
        let Some(row) = self.find(labels) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut texts = Vec::new();
        for anchor in row.select(&ANCHOR_SELECTOR) {
            let text = clean_text(&anchor.text().collect::<String>());
            if !text.is_empty() && seen.insert(text.clone()) {
                texts.push(text);
            }
        }
        texts
    }
}
