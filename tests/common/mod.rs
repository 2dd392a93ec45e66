//! Shared test helpers for integration tests.

use std::io::Write;
use std::path::PathBuf;

use serde_json::{json, Map};
use tempfile::NamedTempFile;

/// Path to the compiled binary
pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pmid-fetch"))
}

/// Helper to create a temporary file with content
pub fn create_temp_file(content: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Build an esummary JSON response listing the given PMIDs.
///
/// Each record gets a title (`Title {id}`) and a fixed publication date.
pub fn esummary_body(ids: &[&str]) -> String {
    let mut result = Map::new();
    result.insert("uids".to_string(), json!(ids));
    for id in ids {
        result.insert(
            id.to_string(),
            json!({
                "uid": id,
                "title": format!("Title {}", id),
                "pubdate": "2020 Jan",
                "authors": [{"name": "Doe J", "authtype": "Author"}]
            }),
        );
    }
    json!({ "header": {"type": "esummary", "version": "0.3"}, "result": result }).to_string()
}
