use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};

/// The readable content of a single chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContent {
    pub id: String,
    pub title: String,
    #[serde(rename = "chapter")]
    pub number: String,
    pub pages: Vec<Page>,
    #[serde(default, rename = "nextChapter", skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, rename = "previousChapter", skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}
impl ChapterContent {
    /// A chapter without a single page is a failed extraction, never an
    /// empty chapter.
    pub fn new(id: String, title: String, number: String, pages: Vec<Page>) -> Result<Self> {
        if pages.is_empty() {
            exn::bail!(ErrorKind::NoPages);
        }
        Ok(Self { id, title, number, pages, next: None, previous: None })
    }

    pub fn with_navigation(mut self, next: Option<String>, previous: Option<String>) -> Self {
        self.next = next.filter(|id| !id.is_empty());
        self.previous = previous.filter(|id| !id.is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based position within the chapter.
    #[serde(rename = "page")]
    pub index: u32,
    pub image_url: String,
}
impl Page {
    /// Numbers image URLs from 1 in the order given.
    pub fn sequence(urls: impl IntoIterator<Item = String>) -> Vec<Page> {
        urls.into_iter().zip(1..).map(|(image_url, index)| Page { index, image_url }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chapter_is_rejected() {
        let err = ChapterContent::new("c1".into(), "Chapter 1".into(), "1".into(), Vec::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoPages));
    }

    #[test]
    fn pages_are_numbered_from_one() {
        let pages = Page::sequence(vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(pages[0], Page { index: 1, image_url: "a.jpg".into() });
        assert_eq!(pages[1].index, 2);
        let chapter = ChapterContent::new("c1".into(), "Chapter 1".into(), "1".into(), pages)
            .unwrap()
            .with_navigation(Some("c2".into()), Some(String::new()));
        assert_eq!(chapter.next.as_deref(), Some("c2"));
        assert_eq!(chapter.previous, None);
    }
}
