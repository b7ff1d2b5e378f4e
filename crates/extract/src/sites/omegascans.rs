//! omegascans.org
//!
//! Series data comes from the JSON API at `api.omegascans.org`; chapter pages
//! are Next.js documents whose media URLs are embedded in the serialized
//! page data.

use std::cmp::Ordering;

use exn::OptionExt;
use scraper::Html;
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{ChapterContent, ChapterRef, ContentInfo, ContentType, HomeFeed, SearchResult};
use crate::normalize::{clean_text, parse_chapter_number, parse_content_type, parse_date, parse_status};
use crate::pages;

/// Default host of the series API.
pub const API_BASE_URL: &str = "https://api.omegascans.org";
const LISTING_LIMIT: usize = 20;
const HOME_SCAN_LIMIT: usize = 30;
const HOME_TRENDING_LIMIT: usize = 10;

selector!(IMAGE_SELECTOR, "img");
regex!(MEDIA_REGEX, r#"https://media\.omegascans\.org/file/[^"'\s]+/uploads/series/[^"'\s]+\.(?:jpg|png|webp)"#);
regex!(CHAPTER_NAME_REGEX, r#"\\"chapter_name\\":\\"([^"\\]+)\\""#);
regex!(CHAPTER_INDEX_REGEX, r#"\\"index\\":\\"([\d.]+)\\""#);
regex!(NEXT_CHAPTER_REGEX, r#"\\"next_chapter\\":\{[^}]*\\"chapter_slug\\":\\"([^"\\]+)\\""#);
regex!(PREVIOUS_CHAPTER_REGEX, r#"\\"previous_chapter\\":\{[^}]*\\"chapter_slug\\":\\"([^"\\]+)\\""#);
regex!(SERIES_SLUG_REGEX, r"series/([^/]+)/");
regex!(TAG_REGEX, r"<[^>]*>");

/// The API sends `null` for missing strings and lists as often as it omits
/// them.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of the `/query` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPage {
    #[serde(default, deserialize_with = "nullable")]
    pub data: Vec<Series>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub series_slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub series_type: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "nullable")]
    pub free_chapters: Vec<Chapter>,
    #[serde(default, deserialize_with = "nullable")]
    pub paid_chapters: Vec<Chapter>,
}
impl Series {
    fn slug(&self) -> String {
        match (&self.series_slug, self.id) {
            (Some(slug), _) if !slug.is_empty() => slug.clone(),
            (_, Some(id)) => id.to_string(),
            _ => String::new(),
        }
    }

    fn cover(&self, base: &str) -> String {
        match &self.thumbnail {
            Some(thumbnail) if !thumbnail.is_empty() => thumbnail.clone(),
            _ => format!("{}/icon.png", base.trim_end_matches('/')),
        }
    }

    fn summary(&self, base: &str) -> SearchResult {
        SearchResult {
            id: self.slug(),
            title: clean_text(&self.title),
            cover: self.cover(base),
            latest_chapter: self.free_chapters.first().and_then(|chapter| chapter.chapter_name.clone()),
            genres: Vec::new(),
            rating: self.rating.filter(|rating| *rating > 0.0),
            content_type: self.series_type.as_deref().map(parse_content_type),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tag {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub chapter_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub chapter_slug: String,
    #[serde(default)]
    pub index: Option<ChapterIndex>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The API serializes chapter indexes as either numbers or strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChapterIndex {
    Number(f64),
    Text(String),
}
impl ChapterIndex {
    fn label(&self) -> String {
        match self {
            ChapterIndex::Number(number) => number.to_string(),
            ChapterIndex::Text(text) => text.trim().to_string(),
        }
    }
}

/// Path of the series query endpoint, relative to [`API_BASE_URL`].
pub fn query_path(search: Option<&str>, sort: Option<&str>, page: u32) -> String {
    let mut path = format!("/query?page={page}");
    if let Some(search) = search {
        path.push_str("&search=");
        path.push_str(&encode(search));
    }
    if let Some(sort) = sort {
        path.push_str("&sort=");
        path.push_str(&encode(sort));
    }
    path
}

/// Path of the query endpoint filtered to one series type, e.g. `Comic` or
/// `Novel`.
pub fn type_path(series_type: &str, page: u32) -> String {
    format!("/query?type={}&page={page}", encode(series_type))
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Converts an API page into listing entries, dropping entries without an id
/// or title.
#[instrument(level = "debug", skip_all, fields(series = page.data.len()))]
pub fn listing(page: &QueryPage, base: &str) -> Vec<SearchResult> {
    page.data.iter().take(LISTING_LIMIT).map(|series| series.summary(base)).filter(SearchResult::is_valid).collect()
}

/// Listing entries of one series type. The endpoint does not always honour
/// its type filter, so entries are filtered again here.
#[instrument(level = "debug", skip(page, base), fields(series = page.data.len()))]
pub fn of_type(page: &QueryPage, base: &str, series_type: &str) -> Vec<SearchResult> {
    page.data
        .iter()
        .filter(|series| series.series_type.as_deref().is_some_and(|kind| kind.eq_ignore_ascii_case(series_type)))
        .take(LISTING_LIMIT)
        .map(|series| series.summary(base))
        .filter(SearchResult::is_valid)
        .collect()
}

/// Unfiltered search results.
pub fn search(page: &QueryPage, base: &str) -> Vec<SearchResult> {
    page.data.iter().map(|series| series.summary(base)).filter(SearchResult::is_valid).collect()
}

/// The first page of updates doubles as the home feed.
pub fn home(page: &QueryPage, base: &str) -> HomeFeed {
    let items: Vec<_> = page
        .data
        .iter()
        .take(HOME_SCAN_LIMIT)
        .map(|series| series.summary(base))
        .filter(SearchResult::is_valid)
        .collect();
    HomeFeed {
        trending: items.iter().take(HOME_TRENDING_LIMIT).cloned().collect(),
        latest_updates: items.into_iter().take(LISTING_LIMIT).collect(),
        ..Default::default()
    }
}

/// Builds the series record from a search for its slug.
///
/// # Errors
///
/// Fails with [`ErrorKind::MissingField`] when the search returned nothing
/// or the series has no title.
#[instrument(level = "debug", skip(page, base), fields(series = page.data.len()))]
pub fn info(page: &QueryPage, base: &str, id: &str) -> Result<ContentInfo> {
    let series = page
        .data
        .iter()
        .find(|series| series.series_slug.as_deref() == Some(id))
        .or_else(|| page.data.first())
        .ok_or_raise(|| ErrorKind::MissingField("series"))?;
    let title = Some(clean_text(&series.title)).filter(|title| !title.is_empty()).ok_or_raise(|| ErrorKind::MissingField("title"))?;
    let slug = Some(series.slug()).filter(|slug| !slug.is_empty()).unwrap_or_else(|| id.to_string());
    let description = series.description.as_deref().map(|html| clean_text(&TAG_REGEX.replace_all(html, " "))).unwrap_or_default();
    Ok(ContentInfo {
        chapters: chapters(series, &slug),
        id: slug,
        title,
        cover: series.cover(base),
        description,
        status: parse_status(series.status.as_deref().unwrap_or("Ongoing")),
        rating: series.rating.filter(|rating| *rating > 0.0),
        genres: series.tags.iter().map(|tag| clean_text(&tag.name)).filter(|name| !name.is_empty()).collect(),
        authors: series.author.iter().map(|author| clean_text(author)).filter(|author| !author.is_empty()).collect(),
        content_type: Some(series.series_type.as_deref().map_or(ContentType::Comic, parse_content_type)),
        ..Default::default()
    })
}

/// Free and paid chapters, latest first.
fn chapters(series: &Series, slug: &str) -> Vec<ChapterRef> {
    let free = series.free_chapters.iter().map(|chapter| (chapter, false));
    let paid = series.paid_chapters.iter().map(|chapter| (chapter, true));
    let mut chapters: Vec<ChapterRef> = free
        .chain(paid)
        .filter(|(chapter, _)| !chapter.chapter_slug.is_empty())
        .map(|(chapter, paid)| {
            let number = chapter.index.as_ref().map_or_else(|| "0".to_string(), ChapterIndex::label);
            let name = chapter.chapter_name.clone().filter(|name| !name.is_empty()).unwrap_or_else(|| format!("Chapter {number}"));
            ChapterRef {
                id: format!("series/{slug}/{}", chapter.chapter_slug),
                title: if paid { format!("{name} [PAID]") } else { name },
                number,
                release_date: chapter.created_at.as_deref().map(parse_date),
                views: None,
            }
        })
        .collect();
    chapters.sort_by(|a, b| numeric(&b.number).partial_cmp(&numeric(&a.number)).unwrap_or(Ordering::Equal));
    chapters
}

fn numeric(number: &str) -> f64 {
    number.parse().unwrap_or(0.0)
}

/// Parses a chapter page.
///
/// # Errors
///
/// Fails with [`ErrorKind::NoPages`] when the page embeds no media URL and has
/// no usable images.
#[instrument(level = "debug", skip(html, base))]
pub fn chapter(html: &str, base: &str, id: &str) -> Result<ChapterContent> {
    let mut media: Vec<String> = Vec::new();
    for url in MEDIA_REGEX.find_iter(html).map(|m| m.as_str()) {
        if !media.iter().any(|known| known == url) {
            media.push(url.to_string());
        }
    }
    let fallback = {
        let document = Html::parse_document(html);
        pages::reader_images(document.root_element(), &IMAGE_SELECTOR, base)
            .into_iter()
            .filter(|url| url.contains("/uploads/series/"))
            .collect()
    };
    let title = CHAPTER_NAME_REGEX
        .captures(html)
        .map(|captures| captures[1].replace("\\\\", ""))
        .unwrap_or_else(|| "Chapter".to_string());
    let number = CHAPTER_INDEX_REGEX
        .captures(html)
        .map(|captures| captures[1].to_string())
        .unwrap_or_else(|| parse_chapter_number(&title));
    let series = SERIES_SLUG_REGEX.captures(id).map(|captures| captures[1].to_string());
    let sibling = |regex: &regex::Regex| {
        let series = series.as_ref()?;
        regex.captures(html).map(|captures| format!("series/{series}/{}", &captures[1]))
    };
    let (next, previous) = (sibling(&*NEXT_CHAPTER_REGEX), sibling(&*PREVIOUS_CHAPTER_REGEX));
    let chapter = ChapterContent::new(id.to_string(), title, number, pages::select(media, fallback))?;
    Ok(chapter.with_navigation(next, previous))
}
