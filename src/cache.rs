//! Local PubMed record cache.
//!
//! The cache is a single JSON object mapping PMID to its raw esummary record.
//! It is read once, extended with the records that were missing, and written
//! back in full with sorted keys so that diffs stay reproducible.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;
use tracing::{debug, info};

use crate::esummary::{FetchError, RecordSource, Records};

/// Errors that can occur when syncing the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of a [`sync_cache`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Where the cache was written
    pub path: PathBuf,
    /// Number of records in the cache after the run
    pub total: usize,
    /// Number of requested PMIDs that were not cached yet
    pub requested: usize,
    /// Number of records actually received for them
    pub fetched: usize,
}

/// Parses cache content as a PMID to record mapping.
///
/// # Errors
///
/// Returns an error if the content is not a JSON object.
pub fn parse_cache(content: &str) -> Result<Records, serde_json::Error> {
    serde_json::from_str(content)
}

/// Loads the cache at `path`.
///
/// A missing, unreadable or malformed file yields an empty cache; the
/// records will simply be fetched again.
pub fn load_cache(path: &Path) -> Records {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no existing cache");
            return Records::new();
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable cache, starting empty");
            return Records::new();
        }
    };

    parse_cache(&content).unwrap_or_else(|e| {
        debug!(path = %path.display(), error = %e, "malformed cache, starting empty");
        Records::new()
    })
}

/// Returns the requested PMIDs that are not in the cache, in request order.
pub fn missing_pmids(requested: &[String], cache: &Records) -> Vec<String> {
    requested
        .iter()
        .filter(|pmid| !cache.contains_key(pmid.as_str()))
        .cloned()
        .collect()
}

/// Adds fetched records to the cache without replacing existing entries.
///
/// Returns the number of records actually added.
pub fn merge_records(cache: &mut Records, fetched: Records) -> usize {
    let mut added = 0;
    for (pmid, record) in fetched {
        if !cache.contains_key(&pmid) {
            cache.insert(pmid, record);
            added += 1;
        }
    }
    added
}

/// Writes the cache to `path` as indented JSON with sorted keys.
///
/// Parent directories are created as needed. The content goes to a temporary
/// file in the same directory which then replaces `path`. An existing file
/// keeps its permissions; a new one is created as 0644 minus the umask.
pub fn write_cache(path: &Path, cache: &Records) -> Result<(), CacheError> {
    let json = serde_json::to_string_pretty(cache)?;

    let write_err = |source: io::Error| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    let mut tmp = builder.tempfile_in(parent).map_err(write_err)?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

/// Brings the cache at `path` up to date with the requested PMIDs.
///
/// Only PMIDs missing from the cache are fetched. If the fetch fails, the
/// error is returned and the file on disk is left untouched.
pub fn sync_cache(
    path: &Path,
    requested: &[String],
    source: &impl RecordSource,
) -> Result<SyncReport, CacheError> {
    let mut cache = load_cache(path);
    let missing = missing_pmids(requested, &cache);

    debug!(
        cached = cache.len(),
        requested = requested.len(),
        missing = missing.len(),
        "computed missing PMIDs"
    );

    let fetched = if missing.is_empty() {
        0
    } else {
        let records = source.fetch(&missing)?;
        merge_records(&mut cache, records)
    };

    write_cache(path, &cache)?;
    info!(path = %path.display(), total = cache.len(), fetched, "wrote cache");

    Ok(SyncReport {
        path: path.to_path_buf(),
        total: cache.len(),
        requested: missing.len(),
        fetched,
    })
}
