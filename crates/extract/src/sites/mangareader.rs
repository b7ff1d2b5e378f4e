//! mangareader.to
//!
//! Listings, search suggestions and series pages are server rendered. Chapter
//! images come from an AJAX endpoint keyed by the reading id embedded in the
//! chapter page, with the reader markup as fallback.

use exn::{OptionExt, ResultExt};
use scraper::{ElementRef, Html};
use serde::Deserialize;
use tracing::instrument;

use super::{resolved, take_valid};
use crate::error::{ErrorKind, Result};
use crate::labels::Labels;
use crate::models::{ChapterContent, ChapterRef, Character, ContentInfo, GenreRef, SearchResult, Suggestion};
use crate::normalize::{
    clean_text, id_from_url, parse_chapter_number, parse_content_type, parse_date, parse_magnitude, parse_rating,
    parse_status, path_id, resolve_url,
};
use crate::pages;
use crate::rules::{Field, is_url};

const SUGGESTION_LIMIT: usize = 10;
const SIDEBAR_LIMIT: usize = 10;
const IMAGE: Field = Field::AnyAttr(&["data-src", "src"]);

selector!(LISTING_ITEM_SELECTOR, ".manga_list-sbs .item, .manga-list .item, .film_list .flw-item, .flw-item");
selector!(HOME_ITEM_SELECTOR, ".manga_list-sbs .item-spc, .block_area_home .item-spc");
selector!(INFO_ROW_SELECTOR, ".anisc-info .item");
selector!(CHAPTER_ITEM_SELECTOR, "#en-chapters li, .chapter-list li, .chapters-list-ul li, .ss-list a");
selector!(ANCHOR_SELECTOR, "a");
selector!(RELATED_ITEM_SELECTOR, ".film_list-wrap .flw-item, .related-manga .item");
selector!(RECOMMENDED_ITEM_SELECTOR, ".recommendations .flw-item, .you-may-like .item, #similar-items .item");
selector!(CHARACTER_ITEM_SELECTOR, ".character-item, .char-list .item, .characters-list .item");
selector!(READING_ID_SELECTOR, "[data-reading-id]");
selector!(AJAX_IMAGE_SELECTOR, ".iv-card[data-url], .page-break[data-url]");
selector!(READER_IMAGE_SELECTOR, "#images-content img, .reading-content img, .iv-card[data-url], .page-break[data-url]");
regex!(QUOTED_REGEX, r#"['"]([^'"]+)['"]"#);

candidates!(LINK, [
    (".manga-poster a, .film-poster a", Field::Attr("href")),
    ("a.manga-poster, a.film-poster", Field::Attr("href")),
]);
candidates!(POSTER, [(".manga-poster img, .film-poster img", IMAGE)], is_url);
candidates!(ITEM_TITLE, [
    (".manga-poster img, .film-poster img", Field::Attr("alt")),
    (".manga-poster a, .film-poster a, a.manga-poster, a.film-poster", Field::Attr("title")),
    (".film-name a, .manga-name a, .manga-name, .film-name", Field::Text),
]);
candidates!(LATEST_CHAPTER, [(".fd-list .chapter a, .fdl-item .chapter a, .latest-chapter a", Field::Text)]);
candidates!(ITEM_GENRES, [(".fdi-cate a, .genres a", Field::Text)]);
candidates!(ITEM_RATING, [(".score, .tick-rate, .film-rating", Field::Text)]);
candidates!(ITEM_TYPE, [(".type, .fdi-type", Field::Text)]);
candidates!(TITLE, [(".manga-name, .anisc-detail .film-name, h2.film-name", Field::Text)]);
candidates!(ALT_TITLES, [(".manga-name-or, .alias", Field::Text)]);
candidates!(COVER, [(".manga-poster img, .film-poster img", IMAGE)], is_url);
candidates!(DESCRIPTION, [(".description, .film-description", Field::Text)]);
candidates!(GENRES, [(".genres a, .item-list a", Field::Text)]);
candidates!(CHAPTER_TIME, [(".chapter-time, .fd-infor span", Field::Text)]);
candidates!(CHARACTER_NAME, [(".char-name, .name, h4", Field::Text)]);
candidates!(CHARACTER_ROLE, [(".char-role, .role, .type", Field::Text)]);
candidates!(CHARACTER_IMAGE, [("img", IMAGE)], is_url);
candidates!(HOME_LINK, [("a.manga-poster", Field::Attr("href"))]);
candidates!(HOME_TITLE, [(".manga-name a", Field::Text), ("a.manga-poster img", Field::Attr("alt"))]);
candidates!(HOME_COVER, [(".manga-poster-img", Field::AnyAttr(&["src", "data-src"]))], is_url);
candidates!(HOME_LATEST, [(".fdl-item .chapter a", Field::Text)]);
candidates!(CHAPTER_TITLE, [(".chapter-name, .heading-name, .manga-name, h1, h2", Field::Text)]);
candidates!(NEXT_CHAPTER, [
    ("#next-chapter, .nav-next a", Field::Attr("href")),
    ("button[onclick*='next']", Field::Attr("onclick")),
]);
candidates!(PREVIOUS_CHAPTER, [
    ("#prev-chapter, .nav-previous a", Field::Attr("href")),
    ("button[onclick*='prev']", Field::Attr("onclick")),
]);

/// Genre taxonomy; the site has no genre index page.
const GENRES_TAXONOMY: &[&str] = &[
    "Action", "Adventure", "Cars", "Comedy", "Dementia", "Demons", "Drama", "Doujinshi", "Ecchi", "Fantasy",
    "Gender Bender", "Harem", "Game", "Hentai", "Historical", "Horror", "Josei", "Kids", "Magic", "Martial Arts",
    "Mecha", "Military", "Music", "Mystery", "Parody", "Police", "Psychological", "Romance", "Samurai", "School",
    "Sci-Fi", "Seinen", "Shoujo", "Shoujo Ai", "Shounen", "Shounen Ai", "Slice of Life", "Space", "Sports",
    "Super Power", "Supernatural", "Thriller", "Vampire", "Yaoi", "Yuri",
];

/// AJAX image list response.
#[derive(Debug, Deserialize)]
struct ImageList {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    html: String,
}

/// Metadata of a chapter reader page, before its images are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reader {
    pub title: String,
    pub number: String,
    /// Key for the AJAX image list; absent on pages that inline their images.
    pub reading_id: Option<String>,
    pub next: Option<String>,
    pub previous: Option<String>,
    /// Reader images found in the page itself.
    pub images: Vec<String>,
}
impl Reader {
    /// Combines the page metadata with the AJAX image list (possibly empty).
    pub fn into_chapter(self, id: &str, structured: Vec<String>) -> Result<ChapterContent> {
        let pages = pages::select(structured, self.images);
        Ok(ChapterContent::new(id.to_string(), self.title, self.number, pages)?.with_navigation(self.next, self.previous))
    }
}

/// Parses a listing, filter or search results page.
#[instrument(level = "debug", skip_all)]
pub fn listing(html: &str, base: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    document.select(&LISTING_ITEM_SELECTOR).map(|item| listing_item(item, base)).filter(SearchResult::is_valid).collect()
}

fn listing_item(item: ElementRef<'_>, base: &str) -> SearchResult {
    let rating = ITEM_RATING.first(item).map(|text| parse_rating(&text));
    SearchResult {
        id: id_from_url(&LINK.text(item)),
        title: ITEM_TITLE.text(item),
        cover: resolved(&POSTER, item, base),
        latest_chapter: LATEST_CHAPTER.first(item),
        genres: ITEM_GENRES.all(item),
        rating,
        content_type: ITEM_TYPE.first(item).map(|text| parse_content_type(&text)),
    }
}

/// Parses the search page into at most ten suggestions.
#[instrument(level = "debug", skip_all)]
pub fn suggestions(html: &str, base: &str) -> Vec<Suggestion> {
    let document = Html::parse_document(html);
    let suggestions = document.select(&LISTING_ITEM_SELECTOR).map(|item| {
        let result = listing_item(item, base);
        Suggestion {
            id: result.id,
            title: result.title,
            cover: Some(result.cover).filter(|cover| !cover.is_empty()),
        }
    });
    take_valid(suggestions, Suggestion::is_valid, SUGGESTION_LIMIT)
}

/// Parses the latest-updates block of the home page. The site renders its
/// other home sections client-side.
#[instrument(level = "debug", skip_all)]
pub fn home_latest(html: &str, base: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    document
        .select(&HOME_ITEM_SELECTOR)
        .map(|item| SearchResult {
            id: id_from_url(&HOME_LINK.text(item)),
            title: HOME_TITLE.text(item),
            cover: resolved(&HOME_COVER, item, base),
            latest_chapter: HOME_LATEST.first(item),
            genres: ITEM_GENRES.all(item),
            ..Default::default()
        })
        .filter(SearchResult::is_valid)
        .collect()
}

/// Parses a series page.
///
/// # Errors
///
/// Fails with [`ErrorKind::MissingField`] when the page has no title, which is
/// how the site renders unknown series.
#[instrument(level = "debug", skip(html, base))]
pub fn info(html: &str, base: &str, id: &str) -> Result<ContentInfo> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let title = TITLE.first(root).ok_or_raise(|| ErrorKind::MissingField("title"))?;
    let labels = Labels::collect(root, &INFO_ROW_SELECTOR);
    let mut alt_titles = labels.list(&["Synonyms", "Alternative", "Alternative Titles"]);
    if alt_titles.is_empty() {
        alt_titles = ALT_TITLES
            .first(root)
            .map(|text| text.split([',', ';']).map(clean_text).filter(|title| !title.is_empty()).collect())
            .unwrap_or_default();
    }
    let mut authors = labels.links(&["Authors", "Author"]);
    if authors.is_empty() {
        authors = labels.list(&["Authors", "Author"]);
    }
    Ok(ContentInfo {
        id: id.to_string(),
        title,
        alt_titles,
        cover: resolved(&COVER, root, base),
        description: DESCRIPTION.text(root),
        status: parse_status(&labels.text(&["Status"]).unwrap_or_default()),
        rating: labels.text(&["Score", "Rating"]).map(|text| parse_rating(&text)),
        genres: GENRES.all(root),
        authors,
        artists: labels.links(&["Artists", "Artist"]),
        content_type: labels.text(&["Type"]).map(|text| parse_content_type(&text)),
        release_date: labels.text(&["Published", "Released"]).map(|text| release_date(&text)),
        views: labels.text(&["Views"]).map(|text| parse_magnitude(&text)),
        chapters: chapters(root),
        related: take_valid(root.select(&RELATED_ITEM_SELECTOR).map(|item| listing_item(item, base)), SearchResult::is_valid, SIDEBAR_LIMIT),
        recommendations: take_valid(
            root.select(&RECOMMENDED_ITEM_SELECTOR).map(|item| listing_item(item, base)),
            SearchResult::is_valid,
            SIDEBAR_LIMIT,
        ),
        characters: characters(root, base),
    })
}

/// `"Jul 22, 1997 to ?"` publishes a range; only its start is a date.
fn release_date(text: &str) -> String {
    parse_date(text.split(" to ").next().unwrap_or(text))
}

#[instrument(level = "trace", skip_all)]
fn chapters(root: ElementRef<'_>) -> Vec<ChapterRef> {
    root.select(&CHAPTER_ITEM_SELECTOR)
        .filter_map(|item| {
            let link = if item.value().name() == "a" { item } else { item.select(&ANCHOR_SELECTOR).next()? };
            let title = Field::Attr("title")
                .read(link)
                .or_else(|| Field::Text.read(link))
                .map(|title| clean_text(&title))?;
            Some(ChapterRef {
                id: path_id(link.value().attr("href").unwrap_or_default()),
                number: parse_chapter_number(&title),
                title,
                release_date: CHAPTER_TIME.first(item).map(|text| parse_date(&text)),
                views: None,
            })
        })
        .filter(ChapterRef::is_valid)
        .collect()
}

#[instrument(level = "trace", skip_all)]
fn characters(root: ElementRef<'_>, base: &str) -> Vec<Character> {
    root.select(&CHARACTER_ITEM_SELECTOR)
        .filter_map(|item| {
            Some(Character {
                name: CHARACTER_NAME.first(item)?,
                role: CHARACTER_ROLE.first(item),
                image: CHARACTER_IMAGE.first(item).map(|url| resolve_url(base, &url)),
            })
        })
        .collect()
}

/// Parses a chapter reader page.
#[instrument(level = "debug", skip_all)]
pub fn reader(html: &str, base: &str) -> Reader {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let title = CHAPTER_TITLE.text(root);
    Reader {
        number: parse_chapter_number(&title),
        title,
        reading_id: root
            .select(&READING_ID_SELECTOR)
            .find_map(|element| element.value().attr("data-reading-id"))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        next: NEXT_CHAPTER.first(root).and_then(|target| navigation(&target)),
        previous: PREVIOUS_CHAPTER.first(root).and_then(|target| navigation(&target)),
        images: pages::reader_images(root, &READER_IMAGE_SELECTOR, base),
    }
}

/// Relative path of the AJAX image list for a reading id.
pub fn image_list_path(reading_id: &str) -> String {
    format!("/ajax/image/list/chap/{reading_id}?mode=vertical&quality=high&hozPageSize=1")
}

/// Extracts image URLs from the AJAX image list response body.
///
/// # Errors
///
/// Fails with [`ErrorKind::MalformedPayload`] when the body is not the
/// expected JSON envelope.
#[instrument(level = "debug", skip_all)]
pub fn image_list(body: &str, base: &str) -> Result<Vec<String>> {
    let payload: ImageList =
        serde_json::from_str(body).or_raise(|| ErrorKind::MalformedPayload("image list".to_string()))?;
    if !payload.status || payload.html.is_empty() {
        return Ok(Vec::new());
    }
    let fragment = Html::parse_fragment(&payload.html);
    Ok(fragment
        .select(&AJAX_IMAGE_SELECTOR)
        .filter_map(|card| Field::Attr("data-url").read(card))
        .map(|url| resolve_url(base, &url))
        .collect())
}

/// Chapter ids are paths, and navigation targets are either an href or an
/// `onclick` handler quoting one.
fn navigation(target: &str) -> Option<String> {
    let href = match QUOTED_REGEX.captures(target) {
        Some(captures) if !target.starts_with('/') && !target.starts_with("http") => captures[1].to_string(),
        _ => target.to_string(),
    };
    Some(path_id(&href)).filter(|id| !id.is_empty())
}

/// The static genre taxonomy.
pub fn genres() -> Vec<GenreRef> {
    GENRES_TAXONOMY.iter().map(|name| GenreRef::from_name(*name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://mangareader.to";

    const LISTING: &str = r#"
        <div class="manga_list-sbs"><div class="mls-wrap">
            <div class="item item-spc">
                <a class="manga-poster" href="/one-piece-3">
                    <img class="manga-poster-img" src="https://img.mreadercdn.com/one-piece.jpg" alt="One Piece">
                </a>
                <div class="manga-detail">
                    <h3 class="manga-name"><a href="/one-piece-3" title="One Piece">One Piece</a></h3>
                    <div class="fd-infor"><span class="fdi-item fdi-cate"><a href="/genre/action">Action</a></span>
                    <span class="fdi-item fdi-cate"><a href="/genre/adventure">Adventure</a></span></div>
                    <div class="fd-list"><div class="fdl-item"><div class="chapter">
                        <a href="/read/one-piece-3/en/chapter-1100">Chap 1100 [EN]</a>
                    </div></div></div>
                </div>
            </div>
            <div class="item item-spc">
                <a class="manga-poster" href="/broken"><img class="manga-poster-img" src="/x.jpg"></a>
            </div>
            <div class="item item-spc">
                <a class="manga-poster" href="/solo-leveling-12"><img class="manga-poster-img" data-src="/solo.jpg" alt="Solo Leveling"></a>
                <span class="tick-rate">4.5/5</span>
                <span class="fdi-type">Manhwa</span>
            </div>
        </div></div>
    "#;

    #[test]
    fn listing_keeps_valid_items() {
        let results = listing(LISTING, BASE);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "one-piece-3");
        assert_eq!(results[0].title, "One Piece");
        assert_eq!(results[0].cover, "https://img.mreadercdn.com/one-piece.jpg");
        assert_eq!(results[0].latest_chapter.as_deref(), Some("Chap 1100 [EN]"));
        assert_eq!(results[0].genres, vec!["Action", "Adventure"]);
        assert_eq!(results[0].rating, None);
        assert_eq!(results[1].cover, "https://mangareader.to/solo.jpg");
        assert_eq!(results[1].rating, Some(9.0));
        assert_eq!(results[1].content_type, Some(crate::models::ContentType::Manhwa));
    }

    #[test]
    fn suggestions_from_listing() {
        let suggestions = suggestions(LISTING, BASE);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].title, "Solo Leveling");
        assert_eq!(suggestions[1].cover.as_deref(), Some("https://mangareader.to/solo.jpg"));
    }

    #[test]
    fn home_latest_block() {
        let results = home_latest(LISTING, BASE);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].latest_chapter.as_deref(), Some("Chap 1100 [EN]"));
    }

    const INFO: &str = r#"
        <div class="anisc-poster"><div class="manga-poster"><img src="https://img.mreadercdn.com/op.jpg" alt="One Piece"></div></div>
        <div class="anisc-detail">
            <h2 class="manga-name">One Piece</h2>
            <div class="manga-name-or">ワンピース</div>
            <div class="genres"><a href="/genre/action">Action</a><a href="/genre/comedy">Comedy</a></div>
            <div class="sort-desc"><div class="description">Gol D. Roger was known as the
                Pirate King.</div></div>
            <div class="anisc-info-wrap"><div class="anisc-info">
                <div class="item item-title"><span class="item-head">Type:</span> <a class="name" href="/type/manga">Manga</a></div>
                <div class="item item-title"><span class="item-head">Status:</span> <span class="name">Publishing</span></div>
                <div class="item item-title"><span class="item-head">Authors:</span> <a href="/author/oda">Oda, Eiichiro</a></div>
                <div class="item item-title"><span class="item-head">Published:</span> <span class="name">Jul 22, 1997 to ?</span></div>
                <div class="item item-title"><span class="item-head">Score:</span> <span class="name">9.12</span></div>
                <div class="item item-title"><span class="item-head">Views:</span> <span class="name">1,234,567</span></div>
            </div></div>
        </div>
        <ul id="en-chapters">
            <li class="item reading-item chapter-item">
                <a href="/read/one-piece-3/en/chapter-1100" class="item-link" title="Chapter 1100: Thank You, Bonney">
                    <span class="name">Chapter 1100: Thank You, Bonney</span>
                </a>
            </li>
            <li class="item reading-item chapter-item">
                <a href="/read/one-piece-3/en/chapter-1099" class="item-link" title="Chapter 1099">Chapter 1099</a>
            </li>
        </ul>
        <div class="character-item"><span class="char-name">Luffy</span><span class="char-role">Main</span><img src="/c/luffy.jpg"></div>
        <section class="recommendations"><div class="flw-item">
            <div class="manga-poster"><a href="/naruto-1" title="Naruto"><img data-src="/naruto.jpg"></a></div>
        </div></section>
    "#;

    #[test]
    fn info_page() {
        let info = info(INFO, BASE, "one-piece-3").unwrap();
        assert_eq!(info.id, "one-piece-3");
        assert_eq!(info.title, "One Piece");
        assert_eq!(info.alt_titles, vec!["ワンピース"]);
        assert_eq!(info.cover, "https://img.mreadercdn.com/op.jpg");
        assert_eq!(info.description, "Gol D. Roger was known as the Pirate King.");
        assert_eq!(info.status, crate::models::Status::Ongoing);
        assert_eq!(info.rating, Some(9.12));
        assert_eq!(info.genres, vec!["Action", "Comedy"]);
        assert_eq!(info.authors, vec!["Oda, Eiichiro"]);
        assert_eq!(info.content_type, Some(crate::models::ContentType::Manga));
        assert_eq!(info.release_date.as_deref(), Some("1997-07-22T00:00:00Z"));
        assert_eq!(info.views, Some(1_234_567));
        assert_eq!(info.chapters.len(), 2);
        assert_eq!(info.chapters[0].id, "read/one-piece-3/en/chapter-1100");
        assert_eq!(info.chapters[0].number, "1100");
        assert_eq!(info.characters[0].image.as_deref(), Some("https://mangareader.to/c/luffy.jpg"));
        assert_eq!(info.characters[0].role.as_deref(), Some("Main"));
        assert_eq!(info.recommendations[0].id, "naruto-1");
    }

    #[test]
    fn info_without_title_fails() {
        let err = info("<html><body><p>Not found</p></body></html>", BASE, "missing").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingField("title")));
    }

    const READER: &str = r#"
        <div id="wrapper" data-reading-id="4321">
            <h2 class="manga-name">Chapter 1100: Thank You, Bonney</h2>
            <a id="next-chapter" href="/read/one-piece-3/en/chapter-1101">Next</a>
            <button onclick="prevChapter('/read/one-piece-3/en/chapter-1099')">Prev</button>
            <div id="images-content"><img src="/images/loading.gif"></div>
        </div>
    "#;

    #[test]
    fn reader_metadata() {
        let reader = reader(READER, BASE);
        assert_eq!(reader.reading_id.as_deref(), Some("4321"));
        assert_eq!(reader.number, "1100");
        assert_eq!(reader.next.as_deref(), Some("read/one-piece-3/en/chapter-1101"));
        assert_eq!(reader.previous.as_deref(), Some("read/one-piece-3/en/chapter-1099"));
    }

    #[test]
    fn chapter_from_image_list() {
        let body = r#"{"status":true,"html":"<div class=\"iv-card\" data-url=\"https://c-1.mreadercdn.com/1.jpg\"></div><div class=\"iv-card\" data-url=\"https://c-1.mreadercdn.com/2.jpg\"></div>"}"#;
        let images = image_list(body, BASE).unwrap();
        let chapter = reader(READER, BASE).into_chapter("read/one-piece-3/en/chapter-1100", images).unwrap();
        assert_eq!(chapter.pages.len(), 2);
        assert_eq!(chapter.pages[0].image_url, "https://c-1.mreadercdn.com/1.jpg");
        assert_eq!(chapter.next.as_deref(), Some("read/one-piece-3/en/chapter-1101"));
    }

    #[test]
    fn chapter_without_pages_fails() {
        // The only reader image is a spinner.
        let err = reader(READER, BASE).into_chapter("c", Vec::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoPages));
        assert!(image_list(r#"{"status":false}"#, BASE).unwrap().is_empty());
        assert!(matches!(&*image_list("<html>", BASE).unwrap_err(), ErrorKind::MalformedPayload(_)));
    }

    #[test]
    fn genre_taxonomy() {
        let genres = genres();
        assert_eq!(genres.len(), 45);
        assert!(genres.iter().any(|genre| genre.slug == "slice-of-life" && genre.name == "Slice of Life"));
        assert!(genres.iter().any(|genre| genre.id == "sci-fi"));
    }
}
