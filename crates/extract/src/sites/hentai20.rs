//! hentai20.io, a WordPress "themesia" reader.
//!
//! Chapter pages inline their image list in a `ts_reader.run({...})` script;
//! the `#readerarea` images are the fallback.

use exn::OptionExt;
use scraper::{ElementRef, Html};
use tracing::instrument;

use super::resolved;
use crate::error::{ErrorKind, Result};
use crate::labels::Labels;
use crate::models::{ChapterContent, ChapterRef, ContentInfo, ContentType, GenreRef, HomeFeed, SearchResult};
use crate::normalize::{
    clean_text, id_from_url, parse_chapter_number, parse_content_type, parse_date, parse_rating, parse_status,
};
use crate::pages;
use crate::rules::{Field, is_url};

const IMAGE: Field = Field::AnyAttr(&["src", "data-src", "data-lazy-src"]);
const HOME_POPULAR_LIMIT: usize = 10;
const HOME_LATEST_LIMIT: usize = 20;

selector!(ITEM_SELECTOR, ".bs");
selector!(INFO_ROW_SELECTOR, ".tsinfo .imptdt, .infotable tr, .fmed");
selector!(CHAPTER_ITEM_SELECTOR, "#chapterlist ul li");
selector!(SCRIPT_SELECTOR, "script");
selector!(READER_IMAGE_SELECTOR, "#readerarea img");
selector!(NAVIGATION_SELECTOR, ".readingnav a, .nextprev a, a.ch-next-btn, a.ch-prev-btn");
selector!(GENRE_LINK_SELECTOR, ".genre-list a, .genrez li a, ul.genre li a");
regex!(IMAGES_REGEX, r#""images"\s*:\s*(\[.*?\])"#);

candidates!(LINK, [("a[href*='/manga/']", Field::Attr("href"))]);
candidates!(ITEM_TITLE, [("a[href*='/manga/']", Field::Attr("title")), (".tt", Field::Text)]);
candidates!(ITEM_COVER, [("img", IMAGE)], is_url);
candidates!(LATEST_CHAPTER, [(".epxs", Field::Text)]);
candidates!(ITEM_GENRES, [(".genre a, .mgen a", Field::Text)]);
candidates!(SCORE, [(".numscore", Field::Text)]);
candidates!(TITLE, [("h1.entry-title", Field::Text)]);
candidates!(COVER, [(".thumb img", IMAGE), (".seriestucontl img", IMAGE)], is_url);
candidates!(DESCRIPTION, [
    (".entry-content[itemprop='description']", Field::Text),
    (".seriestucon .entry-content", Field::Text),
    (".wd-full", Field::Text),
]);
candidates!(INFO_SCORE, [(".rating-prc .numscore, .rating .numscore", Field::Text)]);
candidates!(GENRES, [(".seriestugenre a, .mgen a", Field::Text)]);
candidates!(CHAPTER_LINK, [("a", Field::Attr("href"))]);
candidates!(CHAPTER_NUMBER, [(".chapternum", Field::Text)]);
candidates!(CHAPTER_DATE, [(".chapterdate", Field::Text)]);
candidates!(CHAPTER_TITLE, [("h1.entry-title", Field::Text), (".allc a", Field::Attr("title"))]);

/// Parses any page built from `.bs` cards: listings, search, genres.
#[instrument(level = "debug", skip_all)]
pub fn listing(html: &str, base: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    items(document.root_element(), base)
}

fn items(root: ElementRef<'_>, base: &str) -> Vec<SearchResult> {
    root.select(&ITEM_SELECTOR)
        .map(|item| SearchResult {
            id: id_from_url(&LINK.text(item)),
            title: ITEM_TITLE.text(item),
            cover: resolved(&ITEM_COVER, item, base),
            latest_chapter: LATEST_CHAPTER.first(item),
            genres: ITEM_GENRES.all(item),
            rating: SCORE.first(item).map(|text| parse_rating(&text)),
            content_type: None,
        })
        .filter(SearchResult::is_valid)
        .collect()
}

/// The home page is one run of cards: the first ten are today's popular
/// series, the next twenty the latest updates.
#[instrument(level = "debug", skip_all)]
pub fn home(html: &str, base: &str) -> HomeFeed {
    let mut cards = listing(html, base).into_iter();
    let popular_today = cards.by_ref().take(HOME_POPULAR_LIMIT).collect();
    let latest_updates = cards.take(HOME_LATEST_LIMIT).collect();
    HomeFeed { popular_today, latest_updates, ..Default::default() }
}

/// Parses a series page.
///
/// # Errors
///
/// Fails with [`ErrorKind::MissingField`] when the page has no title.
#[instrument(level = "debug", skip(html, base))]
pub fn info(html: &str, base: &str, id: &str) -> Result<ContentInfo> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let title = TITLE.first(root).ok_or_raise(|| ErrorKind::MissingField("title"))?;
    let labels = Labels::collect(root, &INFO_ROW_SELECTOR);
    let mut authors = labels.links(&["Author", "Authors"]);
    if authors.is_empty() {
        authors = labels.list(&["Author", "Authors"]);
    }
    Ok(ContentInfo {
        id: id.to_string(),
        title,
        alt_titles: labels.list(&["Alternative", "Alternative Titles"]),
        cover: resolved(&COVER, root, base),
        description: DESCRIPTION.text(root),
        status: parse_status(&labels.text(&["Status"]).unwrap_or_default()),
        rating: INFO_SCORE.first(root).map(|text| parse_rating(&text)),
        genres: GENRES.all(root),
        authors,
        artists: labels.list(&["Artist", "Artists"]),
        content_type: Some(labels.text(&["Type"]).map_or(ContentType::Manga, |text| parse_content_type(&text))),
        release_date: labels.text(&["Released", "Posted On"]).map(|text| parse_date(&text)),
        views: None,
        chapters: chapters(root),
        ..Default::default()
    })
}

fn chapters(root: ElementRef<'_>) -> Vec<ChapterRef> {
    root.select(&CHAPTER_ITEM_SELECTOR)
        .filter_map(|item| {
            let title = CHAPTER_NUMBER.first(item)?;
            Some(ChapterRef {
                id: id_from_url(&CHAPTER_LINK.text(item)),
                number: parse_chapter_number(&title),
                title,
                release_date: CHAPTER_DATE.first(item).map(|text| parse_date(&text)),
                views: None,
            })
        })
        .filter(ChapterRef::is_valid)
        .collect()
}

/// The path a chapter id is fetched from. Full URLs and paths are passed
/// through.
pub fn chapter_path(id: &str) -> String {
    if id.starts_with("http") || id.starts_with('/') { id.to_string() } else { format!("/{id}/") }
}

/// Parses a chapter reader page.
///
/// # Errors
///
/// Fails with [`ErrorKind::NoPages`] when neither the inline script nor the
/// reader area yields an image.
#[instrument(level = "debug", skip(html, base))]
pub fn chapter(html: &str, base: &str, id: &str) -> Result<ChapterContent> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let title = CHAPTER_TITLE.text(root);
    let pages = pages::select(script_images(root), pages::reader_images(root, &READER_IMAGE_SELECTOR, base));
    let chapter = ChapterContent::new(id.to_string(), title.clone(), parse_chapter_number(&title), pages)?;
    Ok(chapter.with_navigation(navigation(root, "next"), navigation(root, "prev")))
}

/// Image URLs from the inline `ts_reader.run` call. Empty when the script is
/// missing or its JSON does not parse.
fn script_images(root: ElementRef<'_>) -> Vec<String> {
    let Some(script) = root
        .select(&SCRIPT_SELECTOR)
        .map(|script| script.text().collect::<String>())
        .find(|script| script.contains("ts_reader.run"))
    else {
        return Vec::new();
    };
    let Some(images) = IMAGES_REGEX.captures(&script).and_then(|captures| captures.get(1)) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<serde_json::Value>>(images.as_str()) {
        Ok(values) => values.into_iter().filter_map(|value| value.as_str().map(str::to_string)).collect(),
        Err(err) => {
            tracing::debug!(error = %err, "reader script images are not valid JSON");
            Vec::new()
        },
    }
}

/// Chapter id behind the reader's "Next"/"Prev" button.
fn navigation(root: ElementRef<'_>, direction: &str) -> Option<String> {
    root.select(&NAVIGATION_SELECTOR)
        .find(|link| {
            let class = link.value().attr("class").unwrap_or_default();
            let rel = link.value().attr("rel").unwrap_or_default();
            class.contains(&format!("ch-{direction}-btn"))
                || rel == direction
                || link.text().collect::<String>().to_lowercase().contains(direction)
        })
        .and_then(|link| link.value().attr("href"))
        .map(id_from_url)
        .filter(|id| !id.is_empty() && id != "#")
}

/// Parses the genre index page.
#[instrument(level = "debug", skip_all)]
pub fn genres(html: &str) -> Vec<GenreRef> {
    let document = Html::parse_document(html);
    let mut genres: Vec<GenreRef> = Vec::new();
    for link in document.select(&GENRE_LINK_SELECTOR) {
        let name = clean_text(&link.text().collect::<String>());
        if name.is_empty() {
            continue;
        }
        let genre = GenreRef::with_id(id_from_url(link.value().attr("href").unwrap_or_default()), name);
        if !genre.slug.is_empty() && !genres.iter().any(|known| known.slug == genre.slug) {
            genres.push(genre);
        }
    }
    genres
}
