//! CSV export of ranked publication entries.
//!
//! Fixed column order: number, title, venue, year, rank, rankYear. Entries
//! whose resolution never completed render the "unknown" sentinel rather
//! than being omitted.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::dblp::{PublicationEntry, UNKNOWN_RANK};
use crate::error::Result;

/// One exported row; field order is the column order.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    number: &'a str,
    title: &'a str,
    venue: &'a str,
    year: i32,
    rank: &'a str,
    #[serde(rename = "rankYear")]
    rank_year: &'a str,
}

impl<'a> From<&'a PublicationEntry> for ExportRow<'a> {
    fn from(entry: &'a PublicationEntry) -> Self {
        Self {
            number: &entry.number,
            title: &entry.title,
            venue: &entry.venue,
            year: entry.year,
            rank: entry.rank.as_deref().unwrap_or(UNKNOWN_RANK),
            rank_year: entry.rank_year.as_deref().unwrap_or(UNKNOWN_RANK),
        }
    }
}

/// Write all entries to `path` as CSV, in extraction order.
pub fn write_csv(path: &Path, entries: &[PublicationEntry]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    for entry in entries {
        writer.serialize(ExportRow::from(entry))?;
    }
    writer.flush()?;
    info!(count = entries.len(), path = %path.display(), "Exported ranked entries");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dblp::EntryKind;
    use tempfile::NamedTempFile;

    #[test]
    fn test_column_order_and_unknown_sentinel() -> Result<()> {
        let entries = vec![
            PublicationEntry {
                kind: EntryKind::Conference,
                number: "c7".to_string(),
                title: "Frobnication at Scale.".to_string(),
                venue: "ICSE (1)".to_string(),
                venue_url: None,
                venue_full: None,
                year: 2020,
                rank: Some("A*".to_string()),
                rank_year: Some("CORE2018".to_string()),
            },
            PublicationEntry {
                kind: EntryKind::Journal,
                number: "j12".to_string(),
                title: "Taming the Frobnicator.".to_string(),
                venue: "IEEE Trans. Software Eng.".to_string(),
                venue_url: None,
                venue_full: None,
                year: 2020,
                rank: None,
                rank_year: None,
            },
        ];

        let file = NamedTempFile::new()?;
        write_csv(file.path(), &entries)?;

        let content = std::fs::read_to_string(file.path())?;
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("number,title,venue,year,rank,rankYear")
        );
        assert_eq!(
            lines.next(),
            Some("c7,Frobnication at Scale.,ICSE (1),2020,A*,CORE2018")
        );
        // Unresolved entry still appears, with the sentinel in both fields.
        assert_eq!(
            lines.next(),
            Some("j12,Taming the Frobnicator.,IEEE Trans. Software Eng.,2020,unknown,unknown")
        );
        Ok(())
    }
}
