//! CORE conference-portal rank lookup.
//!
//! Conferences are ranked against the CORE/ERA ranking list that was
//! current at the publication year. The portal is a form-driven site: one
//! search per uncached entry, strictly sequential, with a bounded wait for
//! the results table. Matching is exact (acronym or full title); anything
//! else degrades to [`UNKNOWN_RANK`] and the outcome is cached either way.

use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CachedRank, RankCache};
use crate::dblp::{PublicationEntry, UNKNOWN_RANK};
use crate::error::{RankerError, Result};
use crate::normalize::normalize;
use crate::patch::PatchTable;

/// Default CORE conference-rankings portal URL
pub const DEFAULT_CORE_URL: &str = "http://portal.core.edu.au/conf-ranks/";

/// Bounded wait for the results table to materialize
const RESULTS_TIMEOUT: Duration = Duration::from_secs(3);

/// Ranking epoch effective for a publication year.
///
/// The portal revises its list periodically; old publications are judged
/// against the list current at or near their time.
pub fn epoch_for_year(year: i32) -> &'static str {
    if year >= 2018 {
        "CORE2018"
    } else if year >= 2017 {
        "CORE2017"
    } else if year >= 2014 {
        "CORE2014"
    } else if year >= 2013 {
        "CORE2013"
    } else if year >= 2010 {
        "ERA2010"
    } else {
        "CORE2008"
    }
}

/// One row of the portal's results table.
#[derive(Debug)]
struct CoreRow {
    name: String,
    acronym: String,
    rank: String,
}

/// CORE portal client; one browser-like session reused across the stream.
pub struct CoreRankClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoreRankClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_CORE_URL.to_string())
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

    /// Resolve ranks for every entry in the conference stream, in order.
    ///
    /// Failures never cross entry boundaries: each entry ends up with
    /// either a portal rank or [`UNKNOWN_RANK`], and the outcome is cached
    /// under `query + year` so a repeated query is not re-submitted.
    pub async fn resolve_all(
        &self,
        entries: Vec<&mut PublicationEntry>,
        patch: &PatchTable,
        cache: &mut RankCache,
    ) {
        info!(count = entries.len(), "Ranking conference stream");

        for entry in entries {
            let cleaned = normalize(&entry.venue);
            let query = patch.resolve(&cleaned).to_string();
            let epoch = epoch_for_year(entry.year);
            info!(query = %query, year = entry.year, "Ranking conference venue");

            let key = RankCache::key(&query, entry.year);
            if let Some(hit) = cache.get(&key) {
                info!(rank = %hit.rank, epoch = %hit.year, "Rank found in cache");
                entry.rank = Some(hit.rank.clone());
                entry.rank_year = Some(hit.year.clone());
                continue;
            }

            // Politeness jitter before each portal round-trip.
            let delay = rand::random::<u64>() % 500 + 200;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let rank = match self.lookup(&query, epoch).await {
                Some(rank) => {
                    info!(rank = %rank, "Rank found");
                    rank
                }
                None => {
                    warn!(query = %query, "No rank found");
                    UNKNOWN_RANK.to_string()
                }
            };

            entry.rank = Some(rank.clone());
            entry.rank_year = Some(epoch.to_string());
            cache.put(
                key,
                CachedRank {
                    rank,
                    year: epoch.to_string(),
                },
            );
        }
    }

    /// Single search round-trip; any failure collapses to `None`.
    async fn lookup(&self, query: &str, epoch: &str) -> Option<String> {
        let html = match self.search(query, epoch).await {
            Ok(html) => html,
            Err(e) => {
                warn!(query = %query, error = %e, "CORE search failed");
                return None;
            }
        };
        let rows = match parse_result_rows(&html) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(query = %query, error = %e, "CORE results unparseable");
                return None;
            }
        };
        find_exact_match(&rows, query).map(str::to_string)
    }

    async fn search(&self, query: &str, epoch: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RankerError::Config(format!("Invalid CORE base URL: {}", e)))?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("search", query);
            params.append_pair("by", "all");
            params.append_pair("source", epoch);
        }
        debug!(url = %url, "Submitting CORE search");

        let response = self
            .client
            .get(url.as_str())
            .timeout(RESULTS_TIMEOUT)
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
}

/// Parse the portal's results table; the first row is a header.
fn parse_result_rows(html: &str) -> Result<Vec<CoreRow>> {
    let document = Html::parse_document(html);
    let row_selector =
        Selector::parse("tbody tr").map_err(|e| RankerError::Parse(e.to_string()))?;
    let cell_selector = Selector::parse("td").map_err(|e| RankerError::Parse(e.to_string()))?;

    let mut rows = Vec::new();
    for row in document.select(&row_selector).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|c| c.text().collect::<String>())
            .collect();
        if cells.len() < 4 {
            debug!(cells = cells.len(), "Skipping short results row");
            continue;
        }
        rows.push(CoreRow {
            name: cells[0].clone(),
            acronym: cells[1].clone(),
            rank: cells[3].trim().to_string(),
        });
    }
    Ok(rows)
}

/// First row whose acronym or full title equals the query exactly, after
/// trimming and lowercasing. No fuzzy matching on this source.
fn find_exact_match<'a>(rows: &'a [CoreRow], query: &str) -> Option<&'a str> {
    for row in rows {
        if row.acronym.trim().to_lowercase() == query || row.name.trim().to_lowercase() == query {
            return Some(&row.rank);
        }
        debug!(acronym = %row.acronym.trim(), "Result row does not match query");
    }
    None
}
