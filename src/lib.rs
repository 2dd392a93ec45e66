//! pmid-fetch: fetch PubMed metadata for PMIDs cited in Markdown documents.
//!
//! This library provides functionality to:
//! - Collect `PMID:########` markers from Markdown, PMID lists and arguments
//! - Fetch their esummary records from NCBI E-utilities in rate-limited batches
//! - Merge the records into a local JSON cache read by the document build

pub mod cache;
pub mod config;
pub mod esummary;
pub mod pmids;

pub use cache::{load_cache, merge_records, missing_pmids, sync_cache, write_cache, SyncReport};
pub use config::{Credentials, FetchOptions};
pub use esummary::{EsummaryClient, FetchError, RecordSource, Records};
pub use pmids::{collect_pmids, extract_pmids, parse_pmid_list, CollectError};
