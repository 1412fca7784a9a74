//! DBLP bibliography page extraction.
//!
//! Fetches a researcher's DBLP publication page, extracts one
//! [`PublicationEntry`] per bibliography item, and classifies entries into
//! the conference and journal streams. Entries whose category marker is
//! neither are dropped here and never reach a lookup pipeline.

use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{RankerError, Result};

/// Sentinel rank value for entries no ranking source could resolve.
pub const UNKNOWN_RANK: &str = "unknown";

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Category marker on DBLP for journal articles
const JOURNAL_IMG_TITLE: &str = "Journal Articles";

/// Category marker on DBLP for conference papers
const CONF_IMG_TITLE: &str = "Conference and Workshop Papers";

/// Publication category, discriminating the downstream lookup pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Conference,
    Journal,
}

/// One scraped bibliography item.
///
/// Created during extraction; the rank fields are set exactly once by the
/// matching lookup pipeline and never mutated again.
#[derive(Debug, Clone, Serialize)]
pub struct PublicationEntry {
    pub kind: EntryKind,
    /// Entry number as displayed on the page
    pub number: String,
    /// Publication title
    pub title: String,
    /// Short venue name shown inline (the rank-lookup key)
    pub venue: String,
    /// Link to the venue's canonical DBLP page
    pub venue_url: Option<String>,
    /// Full venue name, resolved later for journal entries only
    pub venue_full: Option<String>,
    /// Publication year, taken from the nearest preceding year marker
    pub year: i32,
    /// Resolved rank, or [`UNKNOWN_RANK`]; unset until resolution completes
    pub rank: Option<String>,
    /// Ranking epoch or history year the rank applies to
    pub rank_year: Option<String>,
}

/// Partition entries into the conference and journal streams.
///
/// The two borrow sets are disjoint, so both lookup pipelines can mutate
/// their stream while the caller retains the backing vector for export.
pub fn classify(
    entries: &mut [PublicationEntry],
) -> (Vec<&mut PublicationEntry>, Vec<&mut PublicationEntry>) {
    entries
        .iter_mut()
        .partition(|e| e.kind == EntryKind::Conference)
}

/// DBLP page client.
pub struct DblpClient {
    client: reqwest::Client,
}

impl DblpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .build()
            .map_err(|e| RankerError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Extract all classified entries from a DBLP bibliography page.
    ///
    /// Journal entries get one secondary navigation each to resolve the
    /// full venue name; a failed secondary fetch leaves `venue_full` unset
    /// and is not an error.
    pub async fn extract_entries(&self, url: &str) -> Result<Vec<PublicationEntry>> {
        info!(url = url, "Fetching DBLP page");
        let html = self.fetch(url).await?;
        let mut entries = parse_publication_list(&html)?;
        info!(count = entries.len(), "Extracted publication entries");

        for entry in entries.iter_mut().filter(|e| e.kind == EntryKind::Journal) {
            let Some(link) = entry.venue_url.clone() else {
                debug!(venue = %entry.venue, "Journal entry without venue link");
                continue;
            };
            match self.fetch(&link).await {
                Ok(page) => {
                    entry.venue_full = parse_journal_title(&page);
                    match &entry.venue_full {
                        Some(full) => info!(journal = %full, "Resolved full journal name"),
                        None => warn!(url = %link, "Journal page without a title heading"),
                    }
                }
                Err(e) => warn!(url = %link, error = %e, "Failed to fetch journal page"),
            }
        }

        Ok(entries)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RankerError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Parse the publication list out of a DBLP page.
///
/// Year markers (`li.year`) and entries (`li.entry`) are interleaved in
/// document order; each entry gets the most recent preceding year.
pub fn parse_publication_list(html: &str) -> Result<Vec<PublicationEntry>> {
    let document = Html::parse_document(html);

    let item_selector = Selector::parse("#publ-section li")
        .map_err(|e| RankerError::Parse(e.to_string()))?;
    let img_selector =
        Selector::parse("div.box img").map_err(|e| RankerError::Parse(e.to_string()))?;
    let number_selector =
        Selector::parse("div.nr").map_err(|e| RankerError::Parse(e.to_string()))?;
    let link_selector =
        Selector::parse("cite > a").map_err(|e| RankerError::Parse(e.to_string()))?;
    let venue_selector =
        Selector::parse("cite > a > span > span").map_err(|e| RankerError::Parse(e.to_string()))?;
    let title_selector =
        Selector::parse("span.title").map_err(|e| RankerError::Parse(e.to_string()))?;

    let year_regex =
        Regex::new(r"\b(19|20)\d{2}\b").map_err(|e| RankerError::Parse(e.to_string()))?;

    let mut entries = Vec::new();
    let mut current_year: Option<i32> = None;

    for item in document.select(&item_selector) {
        let classes: Vec<&str> = item.value().classes().collect();

        if classes.contains(&"year") {
            let text = item.text().collect::<String>();
            current_year = year_regex
                .find(&text)
                .and_then(|m| m.as_str().parse::<i32>().ok());
            continue;
        }

        if !classes.contains(&"entry") {
            continue;
        }

        let kind = match item
            .select(&img_selector)
            .next()
            .and_then(|img| img.value().attr("title"))
        {
            Some(JOURNAL_IMG_TITLE) => EntryKind::Journal,
            Some(CONF_IMG_TITLE) => EntryKind::Conference,
            other => {
                debug!(marker = ?other, "Dropping entry with unrecognized category");
                continue;
            }
        };

        let Some(year) = current_year else {
            warn!("Entry before any year marker, dropping");
            continue;
        };

        let venue = item
            .select(&venue_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if venue.is_empty() {
            warn!(year = year, "Entry without an inline venue name, dropping");
            continue;
        }

        let number = item
            .select(&number_selector)
            .next()
            .and_then(|el| el.value().attr("id"))
            .unwrap_or_default()
            .to_string();
        let venue_url = item
            .select(&link_selector)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(str::to_string);
        let title = element_text(item.select(&title_selector).next());

        entries.push(PublicationEntry {
            kind,
            number,
            title,
            venue,
            venue_url,
            venue_full: None,
            year,
            rank: None,
            rank_year: None,
        });
    }

    Ok(entries)
}

/// Full journal name from a venue's canonical page: the first `h1` heading.
pub fn parse_journal_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let h1_selector = Selector::parse("h1").ok()?;
    let text = element_text(document.select(&h1_selector).next());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn element_text(el: Option<ElementRef>) -> String {
    el.map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html><body><div id="publ-section">
        <ul class="publ-list">
        <li class="year">2020</li>
        <li class="entry article">
            <div class="box"><img title="Journal Articles" /></div>
            <div class="nr" id="j12"></div>
            <cite>
                <span class="title">Taming the Frobnicator.</span>
                <a href="https://dblp.org/db/journals/tse/index.html">
                    <span><span>IEEE Trans. Software Eng.</span></span>
                </a>
            </cite>
        </li>
        <li class="entry inproceedings">
            <div class="box"><img title="Conference and Workshop Papers" /></div>
            <div class="nr" id="c7"></div>
            <cite>
                <span class="title">Frobnication at Scale.</span>
                <a href="https://dblp.org/db/conf/icse/index.html">
                    <span><span>ICSE (1)</span></span>
                </a>
            </cite>
        </li>
        <li class="year">2018</li>
        <li class="entry">
            <div class="box"><img title="Informal and Other Publications" /></div>
            <cite>
                <span class="title">A Preprint.</span>
                <a href="https://example.org"><span><span>CoRR</span></span></a>
            </cite>
        </li>
        <li class="entry inproceedings">
            <div class="box"><img title="Conference and Workshop Papers" /></div>
            <div class="nr" id="c3"></div>
            <cite>
                <span class="title">Early Frobnication.</span>
                <a href="https://dblp.org/db/conf/cav/index.html">
                    <span><span>CAV</span></span>
                </a>
            </cite>
        </li>
        </ul>
    </div></body></html>"##;

    #[test]
    fn test_parse_publication_list() -> Result<()> {
        let entries = parse_publication_list(PAGE)?;
        // The unrecognized "Informal and Other Publications" entry is dropped.
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].kind, EntryKind::Journal);
        assert_eq!(entries[0].number, "j12");
        assert_eq!(entries[0].title, "Taming the Frobnicator.");
        assert_eq!(entries[0].venue, "IEEE Trans. Software Eng.");
        assert_eq!(entries[0].year, 2020);
        assert!(entries[0].rank.is_none());

        assert_eq!(entries[1].kind, EntryKind::Conference);
        assert_eq!(entries[1].venue, "ICSE (1)");
        assert_eq!(entries[1].year, 2020);

        // Year marker between entries applies to everything after it.
        assert_eq!(entries[2].venue, "CAV");
        assert_eq!(entries[2].year, 2018);
        Ok(())
    }

    #[test]
    fn test_classify_partitions_by_kind() -> Result<()> {
        let mut entries = parse_publication_list(PAGE)?;
        let (conferences, journals) = classify(&mut entries);
        assert_eq!(conferences.len(), 2);
        assert_eq!(journals.len(), 1);
        assert!(conferences.iter().all(|e| e.kind == EntryKind::Conference));
        assert!(journals.iter().all(|e| e.kind == EntryKind::Journal));
        Ok(())
    }

    #[test]
    fn test_parse_journal_title() {
        let html = "<html><body><h1> IEEE Transactions on Software Engineering </h1></body></html>";
        assert_eq!(
            parse_journal_title(html),
            Some("IEEE Transactions on Software Engineering".to_string())
        );
        assert_eq!(parse_journal_title("<html><body></body></html>"), None);
    }

    #[test]
    fn test_parse_empty_page() -> Result<()> {
        let entries = parse_publication_list("<html><body></body></html>")?;
        assert!(entries.is_empty());
        Ok(())
    }
}
