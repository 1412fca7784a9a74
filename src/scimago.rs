//! Scimago journal-rank lookup.
//!
//! Journals are searched on the Scimago portal, matched fuzzily (first
//! candidate within a small edit distance of the query), and ranked from
//! the quartile history table on the journal's profile page. The rank is
//! picked for the publication year when the history covers it, otherwise
//! from the nearest recorded end of the history. Everything degrades to
//! [`UNKNOWN_RANK`]/"unknown" and the outcome is cached either way.

use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CachedRank, RankCache};
use crate::dblp::{PublicationEntry, UNKNOWN_RANK};
use crate::error::{RankerError, Result};
use crate::normalize::normalize;
use crate::patch::PatchTable;

/// Default Scimago portal URL
pub const DEFAULT_SCIMAGO_URL: &str = "https://www.scimagojr.com/";

/// Bounded wait for the search-result panel
const SEARCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum Levenshtein distance for an acceptable candidate
const MAX_EDIT_DISTANCE: usize = 4;

/// One journal candidate from the search-result panel.
#[derive(Debug)]
struct Candidate {
    name: String,
    href: String,
}

/// Scimago portal client; one browser-like session reused across the stream.
pub struct ScimagoClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScimagoClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_SCIMAGO_URL.to_string())
    }

    /// Point the client at a mirror or test server.
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .cookie_store(true)
            .build()
            .map_err(|e| RankerError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    /// Resolve ranks for every entry in the journal stream, in order.
    ///
    /// The query is the patch override for the inline short name when one
    /// exists, otherwise the normalized full journal name (falling back to
    /// the short name if the full name was never resolved).
    pub async fn resolve_all(
        &self,
        entries: Vec<&mut PublicationEntry>,
        patch: &PatchTable,
        cache: &mut RankCache,
    ) {
        info!(count = entries.len(), "Ranking journal stream");

        for entry in entries {
            let cleaned_short = normalize(&entry.venue);
            let query = match patch.lookup(&cleaned_short) {
                Some(patched) => patched.to_string(),
                None => entry
                    .venue_full
                    .as_deref()
                    .map(normalize)
                    .unwrap_or(cleaned_short),
            };
            info!(query = %query, year = entry.year, "Ranking journal venue");

            let key = RankCache::key(&query, entry.year);
            if let Some(hit) = cache.get(&key) {
                info!(rank = %hit.rank, rank_year = %hit.year, "Rank found in cache");
                entry.rank = Some(hit.rank.clone());
                entry.rank_year = Some(hit.year.clone());
                continue;
            }

            // Politeness jitter before each portal round-trip.
            let delay = rand::random::<u64>() % 500 + 200;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let (rank, rank_year) = match self.lookup(&query, entry.year).await {
                Some((rank, rank_year)) => {
                    info!(rank = %rank, rank_year = %rank_year, "Rank found");
                    (rank, rank_year)
                }
                None => {
                    warn!(query = %query, "No rank found");
                    (UNKNOWN_RANK.to_string(), UNKNOWN_RANK.to_string())
                }
            };

            entry.rank = Some(rank.clone());
            entry.rank_year = Some(rank_year.clone());
            cache.put(
                key,
                CachedRank {
                    rank,
                    year: rank_year,
                },
            );
        }
    }

    /// Search → candidate match → profile → history pick.
    ///
    /// Any failure along the chain collapses to `None`.
    async fn lookup(&self, query: &str, year: i32) -> Option<(String, String)> {
        let html = match self.search(query).await {
            Ok(html) => html,
            Err(e) => {
                warn!(query = %query, error = %e, "Scimago search failed");
                return None;
            }
        };
        let candidates = match parse_candidates(&html) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(query = %query, error = %e, "Scimago results unparseable");
                return None;
            }
        };
        let candidate = find_candidate(&candidates, query)?;
        info!(journal = %candidate.name, "Matched journal candidate");

        let profile = match self.fetch_profile(&candidate.href).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(journal = %candidate.name, error = %e, "Failed to open journal profile");
                return None;
            }
        };
        let history = match parse_rank_history(&profile) {
            Ok(history) => history,
            Err(e) => {
                warn!(journal = %candidate.name, error = %e, "Rank history unparseable");
                return None;
            }
        };
        best_rank_for_year(&history, year)
    }

    async fn search(&self, query: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RankerError::Config(format!("Invalid Scimago base URL: {}", e)))?
            .join("journalsearch.php")
            .map_err(|e| RankerError::Config(format!("Invalid Scimago base URL: {}", e)))?;
        url.query_pairs_mut().append_pair("q", query);
        debug!(url = %url, "Submitting Scimago search");

        let response = self
            .client
            .get(url.as_str())
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RankerError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    async fn fetch_profile(&self, href: &str) -> Result<String> {
        let url = Url::parse(&self.base_url)
            .and_then(|base| base.join(href))
            .map_err(|e| RankerError::Config(format!("Invalid profile URL {}: {}", href, e)))?;
        debug!(url = %url, "Opening journal profile");

        let response = self.client.get(url.as_str()).send().await?;
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

/// Parse the search-result panel into candidates, in result order.
fn parse_candidates(html: &str) -> Result<Vec<Candidate>> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("div.search_results > a")
        .map_err(|e| RankerError::Parse(e.to_string()))?;
    let name_selector =
        Selector::parse("span.jrnlname").map_err(|e| RankerError::Parse(e.to_string()))?;

    let mut candidates = Vec::new();
    for link in document.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(name_el) = link.select(&name_selector).next() else {
            continue;
        };
        candidates.push(Candidate {
            name: name_el.text().collect::<String>().trim().to_string(),
            href: href.to_string(),
        });
    }
    Ok(candidates)
}

/// First candidate whose normalized name equals the query or sits within
/// [`MAX_EDIT_DISTANCE`] of it. No best-of-all selection: first wins.
fn find_candidate<'a>(candidates: &'a [Candidate], query: &str) -> Option<&'a Candidate> {
    for candidate in candidates {
        let name = normalize(&candidate.name);
        if name == query || strsim::levenshtein(query, &name) <= MAX_EDIT_DISTANCE {
            return Some(candidate);
        }
        debug!(candidate = %candidate.name, "Candidate too far from query");
    }
    None
}

/// Parse the per-year quartile history from a journal profile page.
///
/// The profile carries several sliding tables; the quartile history is the
/// second one. Cells per row: category, year, rank.
fn parse_rank_history(html: &str) -> Result<Vec<(i32, String)>> {
    let document = Html::parse_document(html);
    let slide_selector =
        Selector::parse("div.cellslide").map_err(|e| RankerError::Parse(e.to_string()))?;
    let row_selector =
        Selector::parse("tbody > tr").map_err(|e| RankerError::Parse(e.to_string()))?;
    let cell_selector = Selector::parse("td").map_err(|e| RankerError::Parse(e.to_string()))?;

    let Some(table) = document.select(&slide_selector).nth(1) else {
        return Ok(Vec::new());
    };

    let mut history = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|c| c.text().collect::<String>())
            .collect();
        if cells.len() < 3 {
            debug!(cells = cells.len(), "Skipping short history row");
            continue;
        }
        let Ok(year) = cells[1].trim().parse::<i32>() else {
            debug!(year = %cells[1].trim(), "Skipping history row with bad year");
            continue;
        };
        history.push((year, cells[2].trim().to_string()));
    }
    Ok(history)
}

/// Pick the rank for a publication year from a per-year history.
///
/// Exact-year rows win; a year before the earliest recorded one falls back
/// to the earliest year, anything else to the latest. "Best" among rows of
/// one year is the lexicographically smallest rank string, matching the
/// source's quartile encoding.
fn best_rank_for_year(history: &[(i32, String)], year: i32) -> Option<(String, String)> {
    let best_for = |target: i32| {
        history
            .iter()
            .filter(|(y, _)| *y == target)
            .map(|(_, rank)| rank.clone())
            .min()
    };

    if let Some(rank) = best_for(year) {
        return Some((rank, year.to_string()));
    }
    let earliest = history.iter().map(|(y, _)| *y).min()?;
    let latest = history.iter().map(|(y, _)| *y).max()?;
    if year < earliest {
        best_for(earliest).map(|rank| (rank, earliest.to_string()))
    } else {
        best_for(latest).map(|rank| (rank, latest.to_string()))
    }
}
