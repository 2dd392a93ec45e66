//! Batched PubMed metadata retrieval through NCBI E-utilities `esummary`.
//!
//! PMIDs are sent in groups of at most [`FetchOptions::batch_size`], one
//! request per group, with a pause between groups. A failed group aborts the
//! whole fetch: records from earlier groups of the same call are dropped.

use std::collections::BTreeMap;
use std::thread;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Credentials, FetchOptions};

/// PMID to raw esummary record, sorted by PMID.
pub type Records = BTreeMap<String, Value>;

/// Errors that can occur while fetching esummary records.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch PubMed data: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status} from NCBI: {url}")]
    Status { status: StatusCode, url: String },

    #[error("Invalid esummary response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Something that can look up metadata records for a list of PMIDs.
///
/// PMIDs unknown to the source are simply missing from the returned map.
pub trait RecordSource {
    fn fetch(&self, pmids: &[String]) -> Result<Records, FetchError>;
}

/// Top-level esummary JSON document.
#[derive(Debug, Deserialize)]
struct EsummaryResponse {
    #[serde(default)]
    result: Map<String, Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Blocking HTTP client for the esummary endpoint.
pub struct EsummaryClient {
    http: Client,
    options: FetchOptions,
    credentials: Credentials,
}

impl EsummaryClient {
    /// Creates a client with the given transport options and requester identity.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying HTTP client cannot be built.
    pub fn new(options: FetchOptions, credentials: Credentials) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            options,
            credentials,
        })
    }

    /// Full URL of the esummary endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/esummary.fcgi",
            self.options.base_url.trim_end_matches('/')
        )
    }

    /// Fetches one group of PMIDs with a single request.
    pub fn fetch_batch(&self, batch: &[String]) -> Result<Records, FetchError> {
        let url = self.endpoint();

        let response = self
            .http
            .get(&url)
            .query(&self.query(batch))
            .send()
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status { status, url });
        }

        let body = response.text().map_err(FetchError::Transport)?;
        let parsed: EsummaryResponse =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        if let Some(error) = parsed.error {
            warn!(%url, %error, "esummary reported an error");
        }

        Ok(records_from_result(parsed.result))
    }

    fn query(&self, batch: &[String]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", batch.join(",")),
            ("retmode", "json".to_string()),
        ];
        if let Some(email) = &self.credentials.email {
            params.push(("email", email.clone()));
        }
        if let Some(api_key) = &self.credentials.api_key {
            params.push(("api_key", api_key.clone()));
        }
        params
    }
}

impl RecordSource for EsummaryClient {
    fn fetch(&self, pmids: &[String]) -> Result<Records, FetchError> {
        let mut records = Records::new();

        for (index, batch) in batches(pmids, self.options.batch_size).enumerate() {
            if index > 0 {
                thread::sleep(self.options.delay);
            }
            debug!(batch = index + 1, size = batch.len(), "requesting esummary");
            records.extend(self.fetch_batch(batch)?);
        }

        info!(
            requested = pmids.len(),
            received = records.len(),
            "fetched PubMed records"
        );
        Ok(records)
    }
}

/// Splits PMIDs into consecutive groups of at most `size` entries.
pub fn batches(pmids: &[String], size: usize) -> std::slice::Chunks<'_, String> {
    pmids.chunks(size.max(1))
}

/// Extracts the records listed in `result.uids`.
///
/// A uid listed without a body maps to an empty object.
fn records_from_result(mut result: Map<String, Value>) -> Records {
    let uids: Vec<String> = match result.remove("uids") {
        Some(Value::Array(uids)) => uids
            .into_iter()
            .filter_map(|uid| match uid {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    uids.into_iter()
        .map(|uid| {
            let record = result
                .get(&uid)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            (uid, record)
        })
        .collect()
}
