//! Fetch configuration.
//!
//! Everything the esummary client needs is passed in explicitly; nothing in
//! the library reads the process environment.

use std::time::Duration;

/// Base URL of the NCBI E-utilities service.
pub const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Maximum number of PMIDs sent in one esummary request.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Pause between two batches (NCBI allows ~3 requests per second without a key).
pub const DEFAULT_DELAY: Duration = Duration::from_millis(340);

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Requester identity sent to NCBI with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Contact email (`email` query parameter)
    pub email: Option<String>,
    /// NCBI API key (`api_key` query parameter)
    pub api_key: Option<String>,
}

impl Credentials {
    /// Builds credentials, treating blank values as absent.
    pub fn new(email: Option<String>, api_key: Option<String>) -> Self {
        Self {
            email: non_blank(email),
            api_key: non_blank(api_key),
        }
    }
}

/// Transport settings for the esummary client.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// E-utilities base URL, without trailing slash
    pub base_url: String,
    /// Maximum PMIDs per request
    pub batch_size: usize,
    /// Pause between consecutive requests
    pub delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: EUTILS_BASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!(
                "pmid-fetch/{} (+https://www.ncbi.nlm.nih.gov/)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
