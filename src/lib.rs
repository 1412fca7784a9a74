//! # dblpranker
//!
//! DBLP publication scraper with CORE and Scimago venue ranking.
//!
//! ## Modules
//!
//! - [`dblp`] - Bibliography page extraction and entry classification
//! - [`normalize`] - Venue-name canonicalization
//! - [`patch`] - Manual query overrides for awkward venue names
//! - [`cache`] - Persistent per-source rank cache
//! - [`core_rank`] - CORE conference-portal lookup
//! - [`scimago`] - Scimago journal lookup with fuzzy matching
//! - [`export`] - CSV export
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dblpranker::dblp::DblpClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DblpClient::new()?;
//!     let entries = client.extract_entries("https://dblp.org/pid/x/Example.html").await?;
//!     println!("Found {} entries", entries.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod core_rank;
pub mod dblp;
pub mod error;
pub mod export;
pub mod normalize;
pub mod patch;
pub mod scimago;

pub use error::{RankerError, Result};
